use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::BoxError;
use crate::executor::{Connection, Executor, PreparedStatement, Transaction};
use crate::types::ScalarValue;

/// One interaction observed by a [`ScriptedConnection`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Begin,
    Prepare(String),
    Execute(Vec<ScalarValue>),
    Run(String, Vec<ScalarValue>),
    Commit,
    Rollback,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    executions: usize,
    affected: VecDeque<usize>,
    fail_execution: Option<usize>,
    fail_prepare: bool,
    fail_begin: bool,
    fail_commit: bool,
    fail_rollback: bool,
}

impl State {
    /// Record an execution and decide its outcome. Executions are counted across
    /// prepared statements and one-shot runs, 1-based.
    fn execute(&mut self, call: Call) -> Result<usize, BoxError> {
        self.calls.push(call);
        self.executions += 1;
        if self.fail_execution == Some(self.executions) {
            return Err(format!("scripted failure on execution {}", self.executions).into());
        }
        Ok(self.affected.pop_front().unwrap_or(1))
    }
}

/// A connection double that records every call and fails on demand.
///
/// Each execution reports one affected row unless [`ScriptedConnection::affected`]
/// queued other counts.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnection {
    state: Rc<RefCell<State>>,
    in_transaction: bool,
}

impl ScriptedConnection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue affected-row counts for the next executions.
    #[must_use]
    pub fn affected(self, counts: impl IntoIterator<Item = usize>) -> Self {
        self.state.borrow_mut().affected.extend(counts);
        self
    }

    /// Fail the `n`-th execution (1-based).
    #[must_use]
    pub fn fail_on_execution(self, n: usize) -> Self {
        self.state.borrow_mut().fail_execution = Some(n);
        self
    }

    #[must_use]
    pub fn fail_prepare(self) -> Self {
        self.state.borrow_mut().fail_prepare = true;
        self
    }

    #[must_use]
    pub fn fail_begin(self) -> Self {
        self.state.borrow_mut().fail_begin = true;
        self
    }

    #[must_use]
    pub fn fail_commit(self) -> Self {
        self.state.borrow_mut().fail_commit = true;
        self
    }

    #[must_use]
    pub fn fail_rollback(self) -> Self {
        self.state.borrow_mut().fail_rollback = true;
        self
    }

    /// Pretend a transaction is already open on this connection.
    #[must_use]
    pub fn inside_transaction(mut self) -> Self {
        self.in_transaction = true;
        self
    }

    /// A transaction the test itself owns, sharing this connection's call log.
    /// Opening it is not recorded.
    #[must_use]
    pub fn outer_transaction(&self) -> ScriptedTransaction {
        ScriptedTransaction {
            state: Rc::clone(&self.state),
        }
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// SQL texts that were prepared or run, in order.
    #[must_use]
    pub fn sql(&self) -> Vec<String> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Prepare(sql) | Call::Run(sql, _) => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn executions(&self) -> usize {
        self.state.borrow().executions
    }
}

fn prepare(state: &Rc<RefCell<State>>, sql: &str) -> Result<ScriptedStatement, BoxError> {
    let mut st = state.borrow_mut();
    st.calls.push(Call::Prepare(sql.to_owned()));
    if st.fail_prepare {
        return Err(format!("scripted prepare failure: {sql}").into());
    }
    Ok(ScriptedStatement {
        state: Rc::clone(state),
    })
}

fn run(state: &Rc<RefCell<State>>, sql: &str, args: &[ScalarValue]) -> Result<usize, BoxError> {
    state
        .borrow_mut()
        .execute(Call::Run(sql.to_owned(), args.to_vec()))
}

impl Executor for ScriptedConnection {
    fn prepare<'s>(&'s self, sql: &str) -> Result<Box<dyn PreparedStatement + 's>, BoxError> {
        Ok(Box::new(prepare(&self.state, sql)?))
    }

    fn run(&self, sql: &str, args: &[ScalarValue]) -> Result<usize, BoxError> {
        run(&self.state, sql, args)
    }
}

impl Connection for ScriptedConnection {
    fn begin(&mut self) -> Result<Box<dyn Transaction + '_>, BoxError> {
        let mut st = self.state.borrow_mut();
        st.calls.push(Call::Begin);
        if st.fail_begin {
            return Err("scripted begin failure".into());
        }
        Ok(Box::new(ScriptedTransaction {
            state: Rc::clone(&self.state),
        }))
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }
}

/// Transaction half of [`ScriptedConnection`].
#[derive(Debug)]
pub struct ScriptedTransaction {
    state: Rc<RefCell<State>>,
}

impl Executor for ScriptedTransaction {
    fn prepare<'s>(&'s self, sql: &str) -> Result<Box<dyn PreparedStatement + 's>, BoxError> {
        Ok(Box::new(prepare(&self.state, sql)?))
    }

    fn run(&self, sql: &str, args: &[ScalarValue]) -> Result<usize, BoxError> {
        run(&self.state, sql, args)
    }
}

impl Transaction for ScriptedTransaction {
    fn as_executor(&self) -> &dyn Executor {
        self
    }

    fn commit(self: Box<Self>) -> Result<(), BoxError> {
        let mut st = self.state.borrow_mut();
        st.calls.push(Call::Commit);
        if st.fail_commit {
            return Err("scripted commit failure".into());
        }
        Ok(())
    }

    fn rollback(self: Box<Self>) -> Result<(), BoxError> {
        let mut st = self.state.borrow_mut();
        st.calls.push(Call::Rollback);
        if st.fail_rollback {
            return Err("scripted rollback failure".into());
        }
        Ok(())
    }
}

struct ScriptedStatement {
    state: Rc<RefCell<State>>,
}

impl PreparedStatement for ScriptedStatement {
    fn execute(&mut self, args: &[ScalarValue]) -> Result<usize, BoxError> {
        self.state
            .borrow_mut()
            .execute(Call::Execute(args.to_vec()))
    }
}
