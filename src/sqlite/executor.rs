use rusqlite::params_from_iter;

use crate::error::BoxError;
use crate::executor::{Connection, Executor, PreparedStatement, Transaction};
use crate::types::ScalarValue;

impl PreparedStatement for rusqlite::Statement<'_> {
    fn execute(&mut self, args: &[ScalarValue]) -> Result<usize, BoxError> {
        Ok(rusqlite::Statement::execute(self, params_from_iter(args))?)
    }
}

impl Executor for rusqlite::Connection {
    fn prepare<'s>(&'s self, sql: &str) -> Result<Box<dyn PreparedStatement + 's>, BoxError> {
        Ok(Box::new(rusqlite::Connection::prepare(self, sql)?))
    }

    fn run(&self, sql: &str, args: &[ScalarValue]) -> Result<usize, BoxError> {
        Ok(rusqlite::Connection::execute(self, sql, params_from_iter(args))?)
    }
}

impl Connection for rusqlite::Connection {
    fn begin(&mut self) -> Result<Box<dyn Transaction + '_>, BoxError> {
        Ok(Box::new(self.transaction()?))
    }

    fn in_transaction(&self) -> bool {
        !self.is_autocommit()
    }
}

impl Executor for rusqlite::Transaction<'_> {
    fn prepare<'s>(&'s self, sql: &str) -> Result<Box<dyn PreparedStatement + 's>, BoxError> {
        let conn: &'s rusqlite::Connection = self;
        Executor::prepare(conn, sql)
    }

    fn run(&self, sql: &str, args: &[ScalarValue]) -> Result<usize, BoxError> {
        let conn: &rusqlite::Connection = self;
        Executor::run(conn, sql, args)
    }
}

impl Transaction for rusqlite::Transaction<'_> {
    fn as_executor(&self) -> &dyn Executor {
        self
    }

    fn commit(self: Box<Self>) -> Result<(), BoxError> {
        Ok(rusqlite::Transaction::commit(*self)?)
    }

    fn rollback(self: Box<Self>) -> Result<(), BoxError> {
        Ok(rusqlite::Transaction::rollback(*self)?)
    }
}
