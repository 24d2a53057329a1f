pub mod category;
pub mod common;
pub mod expense;

pub use category::{Category, CategoryDraft, CategoryOwner};
pub use common::{Displayable, Identifiable};
pub use expense::{Expense, ExpenseDraft};
