use crate::session::SessionContext;
use crate::store::CollectionStore;

#[derive(Clone)]
pub struct AppState {
    pub store: CollectionStore,
    pub session: SessionContext,
}

impl AppState {
    pub async fn restore(store: CollectionStore) -> Self {
        let session = SessionContext::restore(&store).await;
        Self { store, session }
    }
}
