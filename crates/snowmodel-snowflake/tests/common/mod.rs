//! Scripted warehouse session shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use snowmodel_core::{
    Connection, Cx, Error, FieldInfo, Model, Outcome, Result, Row, RowCursor, SqlType, Value,
};

pub fn unwrap_outcome<T>(outcome: Outcome<T, Error>) -> T {
    match outcome {
        Outcome::Ok(v) => v,
        Outcome::Err(e) => panic!("unexpected error: {e}"),
        Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
        Outcome::Panicked(p) => panic!("panicked: {p:?}"),
    }
}

/// One-column rows, as returned by a change-log read of `column`.
pub fn rows_of(column: &str, values: &[Value]) -> Vec<Row> {
    values
        .iter()
        .map(|value| Row::new(vec![column.to_string()], vec![value.clone()]))
        .collect()
}

#[derive(Debug, Default)]
pub struct Script {
    /// Every statement sent to the session, in order
    pub statements: Vec<String>,
    pub params: Vec<Vec<Value>>,
    /// Rows affected reported by `execute`
    pub rows_affected: u64,
    /// Make `execute` fail with this message
    pub execute_error: Option<String>,
    /// Request cancellation while the write runs
    pub cancel_on_write: bool,
    /// Results handed out by `query`, front first
    pub query_results: VecDeque<Vec<Row>>,
    /// Rows of the next cursor
    pub cursor_rows: Vec<Row>,
    /// Make `open_cursor` fail with this message
    pub open_error: Option<String>,
    /// Make the cursor fail on this fetch (0-based)
    pub fetch_error_at: Option<usize>,
    pub cursors_opened: usize,
    pub cursor_closes: usize,
}

/// A session that records statements and replays scripted results.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnection {
    script: Arc<Mutex<Script>>,
}

impl ScriptedConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().expect("script lock")
    }

    pub fn statements(&self) -> Vec<String> {
        self.script().statements.clone()
    }

    fn record(&self, sql: &str, params: &[Value]) {
        let mut script = self.script();
        script.statements.push(sql.to_string());
        script.params.push(params.to_vec());
    }
}

impl Connection for ScriptedConnection {
    type Cursor = ScriptedCursor;

    fn query(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send {
        self.record(sql, params);
        let rows = self.script().query_results.pop_front().unwrap_or_default();
        async move { Outcome::Ok(rows) }
    }

    fn execute(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        self.record(sql, params);
        let script = self.script();
        let result = match &script.execute_error {
            Some(message) => Outcome::Err(Error::Custom(message.clone())),
            None => Outcome::Ok(script.rows_affected),
        };
        if script.cancel_on_write {
            cx.set_cancel_requested(true);
        }
        drop(script);
        async move { result }
    }

    fn open_cursor(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<ScriptedCursor, Error>> + Send {
        self.record(sql, params);
        let mut script = self.script();
        let result = match &script.open_error {
            Some(message) => Outcome::Err(Error::Custom(message.clone())),
            None => {
                script.cursors_opened += 1;
                Outcome::Ok(ScriptedCursor {
                    rows: std::mem::take(&mut script.cursor_rows).into(),
                    fetched: 0,
                    fail_at: script.fetch_error_at,
                    closed: false,
                    script: Arc::clone(&self.script),
                })
            }
        };
        drop(script);
        async move { result }
    }

    fn ping(&self, _cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send {
        async { Outcome::Ok(()) }
    }

    fn close(self, _cx: &Cx) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}

#[derive(Debug)]
pub struct ScriptedCursor {
    rows: VecDeque<Row>,
    fetched: usize,
    fail_at: Option<usize>,
    closed: bool,
    script: Arc<Mutex<Script>>,
}

impl RowCursor for ScriptedCursor {
    fn next(&mut self, _cx: &Cx) -> impl Future<Output = Outcome<Option<Row>, Error>> + Send {
        let next = if self.fail_at == Some(self.fetched) {
            Outcome::Err(Error::Custom("network error while fetching".to_string()))
        } else {
            self.fetched += 1;
            Outcome::Ok(self.rows.pop_front())
        };
        async move { next }
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.script.lock().expect("script lock").cursor_closes += 1;
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Orders with an identity key.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i64,
    pub customer: String,
}

impl Order {
    pub fn new(id: i64, customer: &str) -> Self {
        Self {
            id,
            customer: customer.to_string(),
        }
    }
}

impl Model for Order {
    const TABLE_NAME: &'static str = "orders";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[
            FieldInfo::new("id", "id", SqlType::BigInt)
                .primary_key(true)
                .auto_increment(true),
            FieldInfo::new("customer", "customer", SqlType::VarChar(100)),
        ];
        FIELDS
    }

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::BigInt(self.id)),
            ("customer", Value::Text(self.customer.clone())),
        ]
    }

    fn set_column(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "id" => self.id = i64::try_from(value)?,
            "customer" => self.customer = String::try_from(value)?,
            _ => {}
        }
        Ok(())
    }
}

/// Settings keyed by name, nothing generated.
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    pub name: String,
    pub value: String,
}

impl Model for Setting {
    const TABLE_NAME: &'static str = "settings";
    const PRIMARY_KEY: &'static [&'static str] = &["name"];

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[
            FieldInfo::new("name", "name", SqlType::VarChar(64)).primary_key(true),
            FieldInfo::new("value", "value", SqlType::Text),
        ];
        FIELDS
    }

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("name", Value::Text(self.name.clone())),
            ("value", Value::Text(self.value.clone())),
        ]
    }

    fn set_column(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "name" => self.name = String::try_from(value)?,
            "value" => self.value = String::try_from(value)?,
            _ => {}
        }
        Ok(())
    }
}

/// Documents with an identity key and a warehouse-defaulted timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub created_at: i64,
}

impl Document {
    pub fn new(id: i64, title: &str, created_at: i64) -> Self {
        Self {
            id,
            title: title.to_string(),
            created_at,
        }
    }
}

impl Model for Document {
    const TABLE_NAME: &'static str = "documents";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[
            FieldInfo::new("id", "id", SqlType::BigInt)
                .primary_key(true)
                .auto_increment(true),
            FieldInfo::new("title", "title", SqlType::VarChar(200)),
            FieldInfo::new("created_at", "created_at", SqlType::BigInt)
                .default("DATE_PART(EPOCH_SECOND, CURRENT_TIMESTAMP())"),
        ];
        FIELDS
    }

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::BigInt(self.id)),
            ("title", Value::Text(self.title.clone())),
            ("created_at", Value::BigInt(self.created_at)),
        ]
    }

    fn set_column(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "id" => self.id = i64::try_from(value)?,
            "title" => self.title = String::try_from(value)?,
            "created_at" => self.created_at = i64::try_from(value)?,
            _ => {}
        }
        Ok(())
    }
}

/// Append-only events without a primary key.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: String,
}

impl Model for Event {
    const TABLE_NAME: &'static str = "events";
    const PRIMARY_KEY: &'static [&'static str] = &[];

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[FieldInfo::new("kind", "kind", SqlType::VarChar(32))];
        FIELDS
    }

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![("kind", Value::Text(self.kind.clone()))]
    }

    fn set_column(&mut self, field: &str, value: Value) -> Result<()> {
        if field == "kind" {
            self.kind = String::try_from(value)?;
        }
        Ok(())
    }
}
