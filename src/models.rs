use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

/// A registered account as stored under `registeredUsers` and `currentUser`.
/// Records written before roles existed deserialize as plain users; records
/// added from the admin directory of older builds carry no password and can
/// never log in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Case-insensitive match against either username or email.
    pub fn matches_identifier(&self, identifier: &str) -> bool {
        let identifier = identifier.to_lowercase();
        self.username.to_lowercase() == identifier || self.email.to_lowercase() == identifier
    }

    pub fn conflicts_with(&self, username: &str, email: &str) -> bool {
        self.username.to_lowercase() == username.to_lowercase()
            || self.email.to_lowercase() == email.to_lowercase()
    }
}

/// What leaves the service about a user: never the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub category: String,
    pub payment_method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: String,
    pub category: String,
    pub amount: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl Budget {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now <= self.end_date
    }
}

// Request bodies default every field so that a missing one reaches the
// validators and gets the same message as a blank one.

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewExpense {
    pub amount: Option<f64>,
    pub date: Option<DateTime<Utc>>,
    pub category: String,
    pub payment_method: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExpenseUpdate {
    pub amount: Option<f64>,
    pub date: Option<DateTime<Utc>>,
    pub category: String,
    pub payment_method: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewBudget {
    pub category: String,
    pub amount: Option<f64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BudgetUpdate {
    pub amount: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CategoryRequest {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayNameRequest {
    pub display_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayName {
    pub display_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDeletion {
    pub categories: Vec<String>,
    pub removed_expenses: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpend {
    pub category: String,
    pub spent: f64,
    pub budget: Option<f64>,
    pub progress: f64,
    pub over_budget: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeSummary {
    pub categories: Vec<CategorySpend>,
    pub total_spent: f64,
    pub overall_budget: Option<f64>,
    pub overall_progress: f64,
    pub overall_over_budget: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginCounts {
    pub labels: Vec<String>,
    pub counts: Vec<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureUsage {
    pub categories: usize,
    pub expenses: usize,
    pub budgets: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub logins: LoginCounts,
    pub feature_usage: FeatureUsage,
}
