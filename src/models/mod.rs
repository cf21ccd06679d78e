pub mod user;
pub mod expense;

pub use user::{User, CreateUser, LoginRequest, UserResponse};
pub use expense::{Expense, ExpenseInput, ExpenseResponse, ExpenseSummary, MonthFilter};
