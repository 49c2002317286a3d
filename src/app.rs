use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/register", post(handlers::register))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .route("/api/session", get(handlers::get_session))
        .route(
            "/api/profile/display-name",
            get(handlers::get_display_name).put(handlers::set_display_name),
        )
        .route(
            "/api/expenses",
            get(handlers::list_expenses).post(handlers::add_expense),
        )
        .route(
            "/api/expenses/:id",
            put(handlers::edit_expense).delete(handlers::delete_expense),
        )
        .route(
            "/api/budgets",
            get(handlers::list_budgets).post(handlers::add_budget),
        )
        .route(
            "/api/budgets/:id",
            put(handlers::edit_budget).delete(handlers::delete_budget),
        )
        .route("/api/budget-categories", get(handlers::budget_categories))
        .route(
            "/api/categories",
            get(handlers::list_categories).post(handlers::add_category),
        )
        .route(
            "/api/categories/:name",
            put(handlers::rename_category).delete(handlers::delete_category),
        )
        .route("/api/home", get(handlers::get_home))
        .route(
            "/api/admin/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/api/admin/analytics", get(handlers::get_analytics))
        .with_state(state)
}
