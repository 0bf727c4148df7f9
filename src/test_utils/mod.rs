//! Scripted stand-ins for a driver, for exercising batch and decode logic without
//! a database.

mod connection;
mod cursor;
mod helpers;

pub use connection::{Call, ScriptedConnection, ScriptedTransaction};
pub use cursor::ScriptedCursor;
pub use helpers::record;
