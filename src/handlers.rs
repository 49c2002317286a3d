use crate::errors::AppError;
use crate::extract::AppJson;
use crate::models::{
    AnalyticsResponse, Budget, BudgetUpdate, CategoryDeletion, CategoryRequest, DisplayName,
    DisplayNameRequest, Expense, ExpenseUpdate, HomeSummary, LoginRequest, NewBudget, NewExpense, NewUserRequest,
    RegisterRequest, User, UserProfile,
};
use crate::state::AppState;
use crate::stats::{build_home_summary, build_login_counts, feature_usage};
use crate::store::keys;
use crate::{auth, budgets, categories, expenses, profile, users};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};

async fn require_user(state: &AppState) -> Result<User, AppError> {
    state
        .session
        .current()
        .await
        .ok_or_else(|| AppError::unauthorized("Please log in first"))
}

async fn require_admin(state: &AppState) -> Result<User, AppError> {
    let user = require_user(state).await?;
    if !user.is_admin() {
        return Err(AppError::forbidden("Administrator access required"));
    }
    Ok(user)
}

pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let user = auth::register(&state.store, payload).await?;
    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let user = auth::login(
        &state.store,
        &state.session,
        &payload.identifier,
        &payload.password,
        Utc::now(),
    )
    .await?;
    Ok(Json(UserProfile::from(&user)))
}

pub async fn logout(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    auth::logout(&state.store, &state.session).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_session(State(state): State<AppState>) -> Result<Json<UserProfile>, AppError> {
    let user = require_user(&state).await?;
    Ok(Json(UserProfile::from(&user)))
}

pub async fn get_display_name(State(state): State<AppState>) -> Result<Json<DisplayName>, AppError> {
    let user = require_user(&state).await?;
    let display_name = profile::display_name(&state.store, &user).await;
    Ok(Json(DisplayName { display_name }))
}

pub async fn set_display_name(
    State(state): State<AppState>,
    AppJson(payload): AppJson<DisplayNameRequest>,
) -> Result<Json<DisplayName>, AppError> {
    require_user(&state).await?;
    let display_name = profile::set_display_name(&state.store, &payload.display_name).await?;
    Ok(Json(DisplayName { display_name }))
}

pub async fn list_expenses(State(state): State<AppState>) -> Result<Json<Vec<Expense>>, AppError> {
    require_user(&state).await?;
    Ok(Json(expenses::list(&state.store).await))
}

pub async fn add_expense(
    State(state): State<AppState>,
    AppJson(payload): AppJson<NewExpense>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    require_user(&state).await?;
    let expense = expenses::add(&state.store, payload, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn edit_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<ExpenseUpdate>,
) -> Result<Json<Expense>, AppError> {
    require_user(&state).await?;
    Ok(Json(expenses::edit(&state.store, &id, payload).await?))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    require_user(&state).await?;
    expenses::delete(&state.store, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_budgets(State(state): State<AppState>) -> Result<Json<Vec<Budget>>, AppError> {
    require_user(&state).await?;
    Ok(Json(budgets::list(&state.store).await))
}

pub async fn add_budget(
    State(state): State<AppState>,
    AppJson(payload): AppJson<NewBudget>,
) -> Result<(StatusCode, Json<Budget>), AppError> {
    require_user(&state).await?;
    let budget = budgets::add(&state.store, payload).await?;
    Ok((StatusCode::CREATED, Json(budget)))
}

pub async fn edit_budget(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<BudgetUpdate>,
) -> Result<Json<Budget>, AppError> {
    require_user(&state).await?;
    Ok(Json(budgets::edit(&state.store, &id, payload.amount).await?))
}

pub async fn delete_budget(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    require_user(&state).await?;
    budgets::delete(&state.store, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn budget_categories(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    require_user(&state).await?;
    Ok(Json(budgets::budget_categories(&state.store).await))
}

pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    require_user(&state).await?;
    Ok(Json(categories::list(&state.store).await))
}

pub async fn add_category(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CategoryRequest>,
) -> Result<(StatusCode, Json<Vec<String>>), AppError> {
    require_user(&state).await?;
    let categories = categories::add(&state.store, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(categories)))
}

pub async fn rename_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
    AppJson(payload): AppJson<CategoryRequest>,
) -> Result<Json<Vec<String>>, AppError> {
    require_user(&state).await?;
    Ok(Json(categories::rename(&state.store, &name, &payload.name).await?))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CategoryDeletion>, AppError> {
    require_user(&state).await?;
    Ok(Json(categories::delete(&state.store, &name).await?))
}

pub async fn get_home(State(state): State<AppState>) -> Result<Json<HomeSummary>, AppError> {
    require_user(&state).await?;
    let expenses: Vec<Expense> = state.store.get(keys::EXPENSES).await;
    let budgets: Vec<Budget> = state.store.get(keys::BUDGETS).await;
    Ok(Json(build_home_summary(&expenses, &budgets)))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserProfile>>, AppError> {
    require_admin(&state).await?;
    Ok(Json(users::list(&state.store).await))
}

pub async fn create_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<NewUserRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    require_admin(&state).await?;
    let user = users::create(&state.store, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_analytics(State(state): State<AppState>) -> Result<Json<AnalyticsResponse>, AppError> {
    require_admin(&state).await?;
    let timestamps: Vec<DateTime<Utc>> = state.store.get(keys::LOGIN_TIMESTAMPS).await;
    let categories = categories::list(&state.store).await;
    let expenses: Vec<Expense> = state.store.get(keys::EXPENSES).await;
    let budgets: Vec<Budget> = state.store.get(keys::BUDGETS).await;

    Ok(Json(AnalyticsResponse {
        logins: build_login_counts(&timestamps),
        feature_usage: feature_usage(&categories, &expenses, &budgets),
    }))
}
