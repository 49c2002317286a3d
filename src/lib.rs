pub mod app;
pub mod auth;
pub mod budgets;
pub mod categories;
pub mod config;
pub mod errors;
pub mod expenses;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod profile;
pub mod session;
pub mod state;
pub mod stats;
pub mod storage;
pub mod store;
pub mod users;
pub mod validate;

pub use app::router;
pub use config::Config;
pub use session::SessionContext;
pub use state::AppState;
pub use store::CollectionStore;
