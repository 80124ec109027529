//! Data model for records and tabular export

mod record;
mod table;

pub use record::{flatten_data, Flatten, Record, RecordError};
pub use table::{get_value, tablize, CellValue, Dataset, Tablized};
