mod capability;
mod scope;
mod targets;

pub use capability::{Connection, Executor, PreparedStatement, Transaction};
pub use scope::TxScope;
pub use targets::BatchTarget;
