//! In-memory `RecordBackend` mimicking a PostgREST project whose tables may
//! or may not exist yet.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    adapters::store::{
        RecordBackend,
        postgrest_error::{PostgrestErrorBody, UNDEFINED_TABLE, UNIQUE_VIOLATION},
        provisioning::EXEC_SQL_RPC,
    },
    app_error::{AppError, AppResult, StoreError},
    domain::entities::waitlist_entry::{EntryId, WaitlistEntry},
};

/// Build a classified store error from a backend code and message.
pub fn pg_error(code: &str, message: &str) -> AppError {
    AppError::Store(StoreError::from(PostgrestErrorBody::new(code, message)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    Find,
    Sample,
    Insert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    FindByEmail { table: String, email: String },
    Sample { table: String },
    Insert { table: String, email: String },
    Rpc { function: String },
}

#[derive(Default)]
pub struct InMemoryBackend {
    tables: Mutex<HashMap<String, Vec<WaitlistEntry>>>,
    /// Table created by a successful `exec_sql` call; `None` makes it fail.
    provisions: Option<String>,
    post_provision_failure: Option<AppError>,
    failures: Mutex<HashMap<(BackendOp, String), AppError>>,
    calls: Mutex<Vec<BackendCall>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, table: &str) -> Self {
        self.with_entries(table, &[])
    }

    pub fn with_entries(self, table: &str, emails: &[&str]) -> Self {
        {
            let mut tables = self.tables.lock().unwrap();
            let rows = tables.entry(table.to_string()).or_default();
            for email in emails {
                let id = rows.len() as i64 + 1;
                rows.push(WaitlistEntry {
                    id: Some(EntryId::Serial(id)),
                    email: email.to_string(),
                    created_at: Some(chrono::Utc::now()),
                });
            }
        }
        self
    }

    pub fn provisions(mut self, table: &str) -> Self {
        self.provisions = Some(table.to_string());
        self
    }

    /// Every insert into the provisioned table fails with `err`.
    pub fn fail_after_provisioning(mut self, err: AppError) -> Self {
        self.post_provision_failure = Some(err);
        self
    }

    /// `op` against `table` always fails with `err`.
    pub fn fail(self, op: BackendOp, table: &str, err: AppError) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert((op, table.to_string()), err);
        self
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn emails(&self, table: &str) -> Vec<String> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map(|rows| rows.iter().map(|r| r.email.clone()).collect())
            .unwrap_or_default()
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, op: BackendOp, table: &str) -> AppResult<()> {
        if let Some(err) = self.failures.lock().unwrap().get(&(op, table.to_string())) {
            return Err(err.clone());
        }
        if !self.tables.lock().unwrap().contains_key(table) {
            return Err(pg_error(
                UNDEFINED_TABLE,
                &format!("relation \"public.{table}\" does not exist"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordBackend for InMemoryBackend {
    async fn find_by_email(&self, table: &str, email: &str) -> AppResult<Option<WaitlistEntry>> {
        self.record(BackendCall::FindByEmail {
            table: table.to_string(),
            email: email.to_string(),
        });
        self.check(BackendOp::Find, table)?;

        Ok(self.tables.lock().unwrap()[table]
            .iter()
            .find(|row| row.email == email)
            .map(|row| WaitlistEntry::new(row.email.clone())))
    }

    async fn sample(&self, table: &str) -> AppResult<usize> {
        self.record(BackendCall::Sample {
            table: table.to_string(),
        });
        self.check(BackendOp::Sample, table)?;

        Ok(self.tables.lock().unwrap()[table].len().min(1))
    }

    async fn insert_email(&self, table: &str, email: &str) -> AppResult<Vec<WaitlistEntry>> {
        self.record(BackendCall::Insert {
            table: table.to_string(),
            email: email.to_string(),
        });
        self.check(BackendOp::Insert, table)?;

        let mut tables = self.tables.lock().unwrap();
        let rows = tables.get_mut(table).unwrap();
        if rows.iter().any(|row| row.email == email) {
            return Err(pg_error(
                UNIQUE_VIOLATION,
                &format!("duplicate key value violates unique constraint \"{table}_email_key\""),
            ));
        }

        let entry = WaitlistEntry {
            id: Some(EntryId::Serial(rows.len() as i64 + 1)),
            email: email.to_string(),
            created_at: Some(chrono::Utc::now()),
        };
        rows.push(entry.clone());
        Ok(vec![entry])
    }

    async fn call_rpc(&self, function: &str, _args: Value) -> AppResult<()> {
        self.record(BackendCall::Rpc {
            function: function.to_string(),
        });

        match (&self.provisions, function) {
            (Some(table), EXEC_SQL_RPC) => {
                self.tables
                    .lock()
                    .unwrap()
                    .entry(table.clone())
                    .or_default();
                if let Some(err) = &self.post_provision_failure {
                    self.failures
                        .lock()
                        .unwrap()
                        .insert((BackendOp::Insert, table.clone()), err.clone());
                }
                Ok(())
            }
            _ => Err(pg_error(
                "PGRST202",
                &format!("Could not find the function public.{function} in the schema cache"),
            )),
        }
    }
}
