pub mod table;
pub mod terminal;

pub use table::{RowId, RowTable, TableRow};
