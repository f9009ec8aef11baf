//! Shared test utilities for sg-mysql
//!
//! `MemoryDatabase` is a recording `Database` double. It models just enough
//! MySQL behaviour for the engine: transaction writes are buffered until
//! commit, DDL commits implicitly, `REPLACE INTO` the tracking table upserts
//! one row, and `GET_LOCK` blocks while another session holds the lock. A
//! transaction is its own session, so ending it frees its locks.

use async_trait::async_trait;
use sg_core::TxOptions;
use sg_db::{Database, DbError, DbResult, ExecResult, Row, SqlValue, Transaction};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// One row of the simulated tracking table
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TrackedRow {
    pub done: bool,
    pub error: String,
    /// Number of committed upserts of this row
    pub writes: u32,
}

enum Pending {
    Statement(String),
    Status {
        key: (String, String),
        done: bool,
        error: String,
    },
}

#[derive(Default)]
struct State {
    tracking: BTreeMap<(String, String), TrackedRow>,
    committed: Vec<String>,
    executed: Vec<String>,
    queries: Vec<(String, Vec<SqlValue>)>,
    locks: HashMap<String, u64>,
    next_session: u64,
    open_transactions: usize,
    begins: usize,
    commits: usize,
    failing_begins: HashSet<usize>,
    failing_commits: HashSet<usize>,
    failing_statements: Vec<(String, String)>,
    stubs: Vec<(String, Vec<Row>)>,
    tx_options: Vec<TxOptions>,
}

impl State {
    fn check(&self, sql: &str) -> DbResult<()> {
        match self
            .failing_statements
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
        {
            Some((_, message)) => Err(DbError::ExecutionError(message.clone())),
            None => Ok(()),
        }
    }

    fn apply(&mut self, pending: Vec<Pending>) {
        for item in pending {
            match item {
                Pending::Statement(sql) => self.committed.push(sql),
                Pending::Status { key, done, error } => {
                    let writes = self.tracking.get(&key).map_or(0, |row| row.writes) + 1;
                    self.tracking.insert(
                        key,
                        TrackedRow {
                            done,
                            error,
                            writes,
                        },
                    );
                }
            }
        }
    }

    fn select(&self, sql: &str) -> Vec<Row> {
        if sql.starts_with("SELECT library, migration, done FROM") {
            return self
                .tracking
                .iter()
                .map(|((library, name), row)| {
                    vec![
                        SqlValue::from(library.as_str()),
                        SqlValue::from(name.as_str()),
                        SqlValue::Int(i64::from(row.done)),
                    ]
                })
                .collect();
        }
        self.stubs
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default()
    }
}

fn is_ddl(sql: &str) -> bool {
    let verb = sql
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_uppercase();
    matches!(
        verb.as_str(),
        "CREATE" | "ALTER" | "DROP" | "TRUNCATE" | "RENAME" | "GRANT" | "REVOKE" | "LOCK" | "UNLOCK"
    )
}

fn single(value: i64) -> Vec<Row> {
    vec![vec![SqlValue::Int(value)]]
}

fn lock_param(params: &[SqlValue]) -> String {
    params
        .first()
        .and_then(SqlValue::as_str)
        .unwrap_or_default()
        .to_string()
}

#[derive(Clone, Default)]
pub(crate) struct MemoryDatabase {
    state: Arc<Mutex<State>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Make the `n`-th `begin` from now fail (1-based)
    pub fn fail_begin(&self, n: usize) {
        let mut state = self.state();
        let at = state.begins + n;
        state.failing_begins.insert(at);
    }

    /// Make the `n`-th `commit` from now fail (1-based)
    pub fn fail_commit(&self, n: usize) {
        let mut state = self.state();
        let at = state.commits + n;
        state.failing_commits.insert(at);
    }

    /// Fail every statement or query whose text contains `pattern`
    pub fn fail_statements_containing(&self, pattern: &str, message: &str) {
        self.state()
            .failing_statements
            .push((pattern.to_string(), message.to_string()));
    }

    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.failing_begins.clear();
        state.failing_commits.clear();
        state.failing_statements.clear();
    }

    /// Answer queries containing `pattern` with `rows`
    pub fn stub_query(&self, pattern: &str, rows: Vec<Row>) {
        self.state().stubs.push((pattern.to_string(), rows));
    }

    pub fn seed_tracking_row(&self, library: &str, name: &str, done: bool) {
        self.state().tracking.insert(
            (library.to_string(), name.to_string()),
            TrackedRow {
                done,
                error: String::new(),
                writes: 0,
            },
        );
    }

    pub fn tracking_row(&self, library: &str, name: &str) -> Option<TrackedRow> {
        self.state()
            .tracking
            .get(&(library.to_string(), name.to_string()))
            .cloned()
    }

    pub fn tracking_row_count(&self) -> usize {
        self.state().tracking.len()
    }

    /// Statements whose effects are durable
    pub fn committed(&self) -> Vec<String> {
        self.state().committed.clone()
    }

    /// Every statement attempted, committed or not
    pub fn executed(&self) -> Vec<String> {
        self.state().executed.clone()
    }

    pub fn queries(&self) -> Vec<(String, Vec<SqlValue>)> {
        self.state().queries.clone()
    }

    pub fn is_locked(&self, name: &str) -> bool {
        self.state().locks.contains_key(name)
    }

    pub fn begins(&self) -> usize {
        self.state().begins
    }

    pub fn open_transactions(&self) -> usize {
        self.state().open_transactions
    }

    pub fn tx_options(&self) -> Vec<TxOptions> {
        self.state().tx_options.clone()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn begin(&self, options: &TxOptions) -> DbResult<Box<dyn Transaction>> {
        let mut state = self.state();
        state.begins += 1;
        if state.failing_begins.contains(&state.begins) {
            return Err(DbError::ConnectionError("injected begin failure".to_string()));
        }
        state.next_session += 1;
        state.open_transactions += 1;
        state.tx_options.push(*options);
        Ok(Box::new(MemoryTransaction {
            state: Arc::clone(&self.state),
            session: state.next_session,
            pending: Vec::new(),
        }))
    }

    async fn execute(&self, sql: &str) -> DbResult<ExecResult> {
        let mut state = self.state();
        state.executed.push(sql.to_string());
        state.check(sql)?;
        state.committed.push(sql.to_string());
        Ok(ExecResult::default())
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>> {
        let mut state = self.state();
        state.queries.push((sql.to_string(), params.to_vec()));
        state.check(sql)?;
        Ok(state.select(sql))
    }

    fn db_type(&self) -> &'static str {
        "memory"
    }
}

struct MemoryTransaction {
    state: Arc<Mutex<State>>,
    session: u64,
    pending: Vec<Pending>,
}

impl MemoryTransaction {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn run(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<ExecResult> {
        let mut state = self.state.lock().unwrap();
        state.executed.push(sql.to_string());
        state.check(sql)?;
        if is_ddl(sql) {
            let pending = std::mem::take(&mut self.pending);
            state.apply(pending);
            state.committed.push(sql.to_string());
        } else if sql.trim_start().starts_with("REPLACE INTO") && params.len() == 4 {
            self.pending.push(Pending::Status {
                key: (
                    params[0].as_str().unwrap_or_default().to_string(),
                    params[1].as_str().unwrap_or_default().to_string(),
                ),
                done: params[2].as_bool().unwrap_or(false),
                error: params[3].as_str().unwrap_or_default().to_string(),
            });
        } else {
            self.pending.push(Pending::Statement(sql.to_string()));
        }
        Ok(ExecResult {
            rows_affected: 1,
            last_insert_id: None,
        })
    }

    fn try_lock(&self, name: &str) -> bool {
        let mut state = self.state();
        match state.locks.get(name) {
            Some(&holder) if holder != self.session => false,
            _ => {
                state.locks.insert(name.to_string(), self.session);
                true
            }
        }
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn execute(&mut self, sql: &str) -> DbResult<ExecResult> {
        self.run(sql, &[])
    }

    async fn execute_with(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<ExecResult> {
        self.run(sql, params)
    }

    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>> {
        {
            let mut state = self.state();
            state.queries.push((sql.to_string(), params.to_vec()));
            state.check(sql)?;
        }
        if sql.starts_with("SELECT GET_LOCK") {
            let name = lock_param(params);
            while !self.try_lock(&name) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            return Ok(single(1));
        }
        if sql.starts_with("SELECT RELEASE_LOCK") {
            let name = lock_param(params);
            let mut state = self.state();
            let released = match state.locks.get(&name) {
                Some(&holder) if holder == self.session => {
                    state.locks.remove(&name);
                    1
                }
                _ => 0,
            };
            return Ok(single(released));
        }
        Ok(self.state().select(sql))
    }

    async fn commit(mut self: Box<Self>) -> DbResult<()> {
        let pending = std::mem::take(&mut self.pending);
        let mut state = self.state();
        state.commits += 1;
        if state.failing_commits.contains(&state.commits) {
            return Err(DbError::TransactionError(
                "injected commit failure".to_string(),
            ));
        }
        state.apply(pending);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DbResult<()> {
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        let session = self.session;
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.open_transactions -= 1;
        state.locks.retain(|_, holder| *holder != session);
    }
}
