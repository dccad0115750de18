//! Aggregates transactions into the monthly summary and the yearly report.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use time::{Date, Month};

use crate::{
    category::CategoryId,
    month::{MonthWindow, month_label},
    report::ReportTransaction,
    transaction::{Transaction, TransactionType},
};

/// How many of the most recent transactions the monthly summary includes.
pub const RECENT_TRANSACTION_COUNT: usize = 5;
/// How many categories the yearly report ranks.
pub const TOP_CATEGORY_COUNT: usize = 5;

/// The total spent in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The category ID.
    pub category_id: CategoryId,
    /// The category name.
    pub name: String,
    /// The category icon.
    pub icon: String,
    /// The category color.
    pub color: String,
    /// The sum of the expenses in the category.
    pub total: f64,
    /// The share of all expenses, 0 to 100.
    pub percentage: f64,
}

/// Income and expenses on a single day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    /// The day.
    pub date: Date,
    /// The sum of the income on the day.
    pub income: f64,
    /// The sum of the expenses on the day.
    pub expense: f64,
}

/// The dashboard figures for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    /// The month number, 1 is January.
    pub month: u8,
    /// The calendar year.
    pub year: i32,
    /// The sum of all income.
    pub total_income: f64,
    /// The sum of all expenses.
    pub total_expense: f64,
    /// Income minus expenses.
    pub balance: f64,
    /// Expenses per category, largest first.
    pub expense_by_category: Vec<CategoryTotal>,
    /// Income and expenses per day, in date order. Days without transactions are left out.
    pub daily_totals: Vec<DailyTotal>,
    /// The newest transactions of the month.
    pub recent_transactions: Vec<Transaction>,
}

/// Income and expenses of one month in the yearly report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthRow {
    /// The month number, 1 is January.
    pub month: u8,
    /// Three letter month name, e.g. "Jan".
    pub label: &'static str,
    /// The sum of the income in the month.
    pub income: f64,
    /// The sum of the expenses in the month.
    pub expense: f64,
    /// Income minus expenses.
    pub balance: f64,
}

/// The figures for a whole calendar year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyReport {
    /// The calendar year.
    pub year: i32,
    /// One row per month, January first. Always twelve rows.
    pub months: Vec<MonthRow>,
    /// The sum of all income.
    pub total_income: f64,
    /// The sum of all expenses.
    pub total_expense: f64,
    /// Income minus expenses.
    pub balance: f64,
    /// Total expenses divided over twelve months.
    pub average_monthly_expense: f64,
    /// The categories with the largest expenses.
    pub top_expense_categories: Vec<CategoryTotal>,
}

fn sum_of_kind(transactions: &[ReportTransaction], kind: TransactionType) -> f64 {
    transactions
        .iter()
        .filter(|transaction| transaction.kind == kind)
        .map(|transaction| transaction.amount)
        .sum()
}

/// Expense totals per category sorted largest first, ties broken by name.
fn expense_by_category(transactions: &[ReportTransaction]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<CategoryId, CategoryTotal> = HashMap::new();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.kind == TransactionType::Expense)
    {
        totals
            .entry(transaction.category_id)
            .or_insert_with(|| CategoryTotal {
                category_id: transaction.category_id,
                name: transaction.category_name.clone(),
                icon: transaction.category_icon.clone(),
                color: transaction.category_color.clone(),
                total: 0.0,
                percentage: 0.0,
            })
            .total += transaction.amount;
    }

    let total_expense: f64 = totals.values().map(|category| category.total).sum();
    let mut totals: Vec<_> = totals
        .into_values()
        .map(|mut category| {
            if total_expense > 0.0 {
                category.percentage = category.total * 100.0 / total_expense;
            }
            category
        })
        .collect();

    totals.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    totals
}

fn daily_totals(transactions: &[ReportTransaction]) -> Vec<DailyTotal> {
    let mut days: BTreeMap<Date, DailyTotal> = BTreeMap::new();

    for transaction in transactions {
        let day = days.entry(transaction.date).or_insert_with(|| DailyTotal {
            date: transaction.date,
            income: 0.0,
            expense: 0.0,
        });

        match transaction.kind {
            TransactionType::Income => day.income += transaction.amount,
            TransactionType::Expense => day.expense += transaction.amount,
        }
    }

    days.into_values().collect()
}

/// Build the dashboard summary of `window`.
///
/// `transactions` must only hold transactions inside `window`. `recent` is expected newest
/// first and is cut down to [RECENT_TRANSACTION_COUNT].
pub fn build_monthly_summary(
    window: MonthWindow,
    transactions: &[ReportTransaction],
    mut recent: Vec<Transaction>,
) -> MonthlySummary {
    let total_income = sum_of_kind(transactions, TransactionType::Income);
    let total_expense = sum_of_kind(transactions, TransactionType::Expense);
    recent.truncate(RECENT_TRANSACTION_COUNT);

    MonthlySummary {
        month: window.month_number(),
        year: window.year(),
        total_income,
        total_expense,
        balance: total_income - total_expense,
        expense_by_category: expense_by_category(transactions),
        daily_totals: daily_totals(transactions),
        recent_transactions: recent,
    }
}

/// Build the report of `year` from all of its transactions.
pub fn build_yearly_report(year: i32, transactions: &[ReportTransaction]) -> YearlyReport {
    let mut months: Vec<MonthRow> = (1..=12u8)
        .map(|month| MonthRow {
            month,
            label: Month::try_from(month).map(month_label).unwrap_or_default(),
            income: 0.0,
            expense: 0.0,
            balance: 0.0,
        })
        .collect();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.date.year() == year)
    {
        let row = &mut months[transaction.date.month() as usize - 1];

        match transaction.kind {
            TransactionType::Income => row.income += transaction.amount,
            TransactionType::Expense => row.expense += transaction.amount,
        }
    }

    for row in &mut months {
        row.balance = row.income - row.expense;
    }

    let total_income: f64 = months.iter().map(|row| row.income).sum();
    let total_expense: f64 = months.iter().map(|row| row.expense).sum();
    let mut top_expense_categories = expense_by_category(transactions);
    top_expense_categories.truncate(TOP_CATEGORY_COUNT);

    YearlyReport {
        year,
        months,
        total_income,
        total_expense,
        balance: total_income - total_expense,
        average_monthly_expense: total_expense / 12.0,
        top_expense_categories,
    }
}
