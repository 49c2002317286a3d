use crate::budgets::OVERALL;
use crate::models::{Budget, CategorySpend, Expense, FeatureUsage, HomeSummary, LoginCounts};
use chrono::{DateTime, Duration, Utc};

/// Days covered by the admin login chart, oldest first.
pub const LOGIN_WINDOW_DAYS: usize = 5;

const UNCATEGORIZED: &str = "Other";

pub fn build_home_summary(expenses: &[Expense], budgets: &[Budget]) -> HomeSummary {
    build_home_summary_at(Utc::now(), expenses, budgets)
}

/// Spend per category in order of first appearance, each compared with the
/// budget for that category whose date range contains `now`.
pub fn build_home_summary_at(
    now: DateTime<Utc>,
    expenses: &[Expense],
    budgets: &[Budget],
) -> HomeSummary {
    let mut totals: Vec<(String, f64)> = Vec::new();
    for expense in expenses {
        let category = if expense.category.is_empty() {
            UNCATEGORIZED
        } else {
            expense.category.as_str()
        };
        match totals.iter_mut().find(|(name, _)| name == category) {
            Some((_, spent)) => *spent += expense.amount,
            None => totals.push((category.to_string(), expense.amount)),
        }
    }

    let categories = totals
        .into_iter()
        .map(|(category, spent)| {
            let budget = active_budget(budgets, &category, now);
            let (progress, over_budget) = compare(spent, budget);
            CategorySpend {
                category,
                spent,
                budget,
                progress,
                over_budget,
            }
        })
        .collect();

    let total_spent = expenses.iter().map(|expense| expense.amount).sum();
    let overall_budget = active_budget(budgets, OVERALL, now);
    let (overall_progress, overall_over_budget) = compare(total_spent, overall_budget);

    HomeSummary {
        categories,
        total_spent,
        overall_budget,
        overall_progress,
        overall_over_budget,
    }
}

fn active_budget(budgets: &[Budget], category: &str, now: DateTime<Utc>) -> Option<f64> {
    budgets
        .iter()
        .find(|budget| budget.category == category && budget.is_active_at(now))
        .map(|budget| budget.amount)
}

fn compare(spent: f64, budget: Option<f64>) -> (f64, bool) {
    match budget {
        Some(budget) => ((spent / budget).min(1.0), spent > budget),
        None => (0.0, false),
    }
}

pub fn build_login_counts(timestamps: &[DateTime<Utc>]) -> LoginCounts {
    build_login_counts_at(Utc::now(), timestamps)
}

/// Buckets logins by whole days elapsed before `now`. The last bucket holds
/// the most recent 24 hours; future timestamps are skipped.
pub fn build_login_counts_at(now: DateTime<Utc>, timestamps: &[DateTime<Utc>]) -> LoginCounts {
    let mut counts = vec![0u64; LOGIN_WINDOW_DAYS];
    for timestamp in timestamps {
        let elapsed = now.signed_duration_since(*timestamp);
        if elapsed < Duration::zero() {
            continue;
        }
        let days = elapsed.num_days() as usize;
        if days < LOGIN_WINDOW_DAYS {
            counts[LOGIN_WINDOW_DAYS - days - 1] += 1;
        }
    }

    LoginCounts {
        labels: (1..=LOGIN_WINDOW_DAYS).map(|day| format!("Day {day}")).collect(),
        counts,
    }
}

pub fn feature_usage(categories: &[String], expenses: &[Expense], budgets: &[Budget]) -> FeatureUsage {
    FeatureUsage {
        categories: categories.len(),
        expenses: expenses.len(),
        budgets: budgets.len(),
    }
}
