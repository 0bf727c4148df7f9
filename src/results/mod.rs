mod record_set;
mod row;

pub use record_set::{RecordSet, stringify};
pub use row::Record;
