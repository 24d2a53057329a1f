pub mod category_service;
pub mod expense_service;
pub mod summary_service;

pub use category_service::CategoryService;
pub use expense_service::ExpenseService;
pub use summary_service::SummaryService;

use crate::errors::LedgerError;

pub type ServiceResult<T> = Result<T, LedgerError>;
