use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    app_error::{AppError, AppResult, StoreErrorKind},
    domain::entities::{email::WaitlistEmail, waitlist_entry::WaitlistEntry},
    use_cases::waitlist::{InsertReceipt, StoreFailure, WaitlistStore},
};

use self::postgrest_error::NO_ROWS;
use self::provisioning::{ENSURE_TABLE_RPC, ENSURE_TABLE_TARGET, Provisioner};

pub mod postgrest;
pub mod postgrest_error;
pub mod provisioning;

// ============================================================================
// Backend Trait
// ============================================================================

/// Raw table/RPC access. Errors come back classified but untranslated.
#[async_trait]
pub trait RecordBackend: Send + Sync {
    async fn find_by_email(&self, table: &str, email: &str) -> AppResult<Option<WaitlistEntry>>;

    /// Read at most one row; used for connectivity checks.
    async fn sample(&self, table: &str) -> AppResult<usize>;

    async fn insert_email(&self, table: &str, email: &str) -> AppResult<Vec<WaitlistEntry>>;

    async fn call_rpc(&self, function: &str, args: Value) -> AppResult<()>;
}

// ============================================================================
// Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub primary_table: String,
    pub fallback_table: String,
    /// Ignored unless `primary_table` is `ENSURE_TABLE_TARGET`.
    pub pre_provision: bool,
}

impl StoreSettings {
    pub fn new(primary_table: &str, fallback_table: &str, pre_provision: bool) -> AppResult<Self> {
        // Table names are interpolated into provisioning DDL.
        for table in [primary_table, fallback_table] {
            if !is_valid_identifier(table) {
                return Err(AppError::Config(format!("invalid table name: {table:?}")));
            }
        }

        Ok(Self {
            primary_table: primary_table.to_string(),
            fallback_table: fallback_table.to_string(),
            pre_provision,
        })
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            primary_table: "waitlist".to_string(),
            fallback_table: "users".to_string(),
            pre_provision: true,
        }
    }
}

/// Lowercase SQL identifier: `[a-z_][a-z0-9_]*`, at most 63 bytes.
fn is_valid_identifier(name: &str) -> bool {
    let Some(first) = name.chars().next() else {
        return false;
    };
    name.len() <= 63
        && (first.is_ascii_lowercase() || first == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

// ============================================================================
// Adapter
// ============================================================================

/// One step of the insert fallback chain.
struct InsertAttempt<'a> {
    table: &'a str,
    /// Run when `table` is missing; on success the insert is retried once.
    provisioner: Option<Provisioner>,
}

/// `WaitlistStore` with table fallbacks, on-demand provisioning and error
/// translation on top of a `RecordBackend`.
#[derive(Clone)]
pub struct WaitlistStoreAdapter {
    backend: Arc<dyn RecordBackend>,
    settings: StoreSettings,
}

impl WaitlistStoreAdapter {
    pub fn new(backend: Arc<dyn RecordBackend>, settings: StoreSettings) -> Self {
        Self { backend, settings }
    }

    /// Primary table with provisioning, then the degraded-mode table.
    fn insert_plan(&self) -> Vec<InsertAttempt<'_>> {
        vec![
            InsertAttempt {
                table: &self.settings.primary_table,
                provisioner: Some(Provisioner::create_table(&self.settings.primary_table)),
            },
            InsertAttempt {
                table: &self.settings.fallback_table,
                provisioner: None,
            },
        ]
    }

    async fn pre_provision(&self) {
        if !self.settings.pre_provision {
            return;
        }
        if self.settings.primary_table != ENSURE_TABLE_TARGET {
            debug!(
                table = %self.settings.primary_table,
                "skipping pre-provision, rpc only creates the waitlist table"
            );
            return;
        }

        match self.backend.call_rpc(ENSURE_TABLE_RPC, json!({})).await {
            Ok(()) => debug!("ensured primary table exists"),
            Err(AppError::Store(err)) if err.message.contains("already exists") => {}
            Err(err) => debug!(
                error = %err,
                "could not pre-provision primary table, trying direct insert"
            ),
        }
    }

    async fn insert_into(&self, table: &str, email: &WaitlistEmail) -> AppResult<InsertReceipt> {
        let entries = self.backend.insert_email(table, email.as_str()).await?;
        info!(table, rows = entries.len(), "inserted waitlist entry");
        Ok(InsertReceipt {
            table: table.to_string(),
            entries,
        })
    }

    /// Walk the plan until one attempt succeeds. A missing table moves on to
    /// the next attempt (after trying its provisioner); any other error ends
    /// the chain.
    async fn run_insert_plan(&self, email: &WaitlistEmail) -> AppResult<InsertReceipt> {
        let mut last_error = None;

        for attempt in self.insert_plan() {
            let err = match self.insert_into(attempt.table, email).await {
                Ok(receipt) => return Ok(receipt),
                Err(err) if err.is_table_missing() => err,
                Err(err) => return Err(err),
            };
            warn!(table = attempt.table, "insert target missing");

            if let Some(provisioner) = attempt.provisioner {
                match self
                    .backend
                    .call_rpc(provisioner.function, provisioner.args)
                    .await
                {
                    Ok(()) => {
                        info!(table = attempt.table, "provisioned insert target, retrying");
                        return self.insert_into(attempt.table, email).await;
                    }
                    Err(provision_err) => warn!(
                        table = attempt.table,
                        error = %provision_err,
                        "could not provision insert target, falling back"
                    ),
                }
            }

            last_error = Some(err);
        }

        Err(last_error
            .unwrap_or_else(|| AppError::Internal("insert plan has no attempts".to_string())))
    }

    /// Query `primary`, and `fallback` only when the primary table is missing.
    async fn with_table_fallback<T, F, Fut>(&self, op: F) -> AppResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        match op(self.settings.primary_table.clone()).await {
            Err(err) if err.is_table_missing() => {
                debug!(
                    table = %self.settings.fallback_table,
                    "primary table missing, using fallback"
                );
                op(self.settings.fallback_table.clone()).await
            }
            result => result,
        }
    }
}

#[async_trait]
impl WaitlistStore for WaitlistStoreAdapter {
    #[instrument(skip(self))]
    async fn probe(&self) -> bool {
        let backend = &self.backend;
        match self
            .with_table_fallback(move |table| async move { backend.sample(&table).await })
            .await
        {
            Ok(rows) => {
                info!(rows, "store connection successful");
                true
            }
            Err(err) => {
                log_store_error(&err);
                error!(diagnostic = %probe_diagnostic(&err), "store connection failed");
                false
            }
        }
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn exists(&self, email: &WaitlistEmail) -> bool {
        let backend = &self.backend;
        let result = self
            .with_table_fallback(move |table| async move {
                backend.find_by_email(&table, email.as_str()).await
            })
            .await;

        match result {
            Ok(found) => {
                debug!(found = found.is_some(), "email check result");
                found.is_some()
            }
            Err(AppError::Store(err)) if err.has_code(NO_ROWS) => false,
            Err(err) => {
                log_store_error(&err);
                if err.is_permission_denied() {
                    info!("permission error during email check, proceeding with insert");
                }
                false
            }
        }
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn insert(&self, email: &WaitlistEmail) -> Result<InsertReceipt, StoreFailure> {
        self.pre_provision().await;

        self.run_insert_plan(email).await.map_err(|err| {
            log_store_error(&err);
            StoreFailure::from(&err)
        })
    }
}

fn log_store_error(err: &AppError) {
    match err {
        AppError::Store(store_err) => error!(
            kind = store_err.kind.as_str(),
            code = ?store_err.code,
            message = %store_err.message,
            details = ?store_err.details,
            hint = ?store_err.hint,
            "store error"
        ),
        other => error!(error = %other, "store request failed"),
    }
}

/// Operator-facing explanation of a failed probe.
pub fn probe_diagnostic(err: &AppError) -> String {
    match err {
        AppError::Store(store_err) => match store_err.kind {
            StoreErrorKind::PermissionDenied => "Permission denied. Please configure Row Level \
                 Security policies for the anonymous role."
                .to_string(),
            StoreErrorKind::TableNotFound => "No suitable table found. Please create a waitlist \
                 or users table in the database."
                .to_string(),
            _ => store_err.message.clone(),
        },
        AppError::Network(_) => {
            "Unable to connect to the store. Please check your internet connection.".to_string()
        }
        other => other.to_string(),
    }
}
