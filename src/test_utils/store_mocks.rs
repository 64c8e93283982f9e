//! Scripted `WaitlistStore` that records every call.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::{
    domain::entities::{email::WaitlistEmail, waitlist_entry::WaitlistEntry},
    use_cases::waitlist::{InsertReceipt, StoreFailure, WaitlistStore},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Probe,
    Exists(String),
    Insert(String),
}

/// Holds `exists` until released, so a test can observe the busy state.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

pub struct ScriptedWaitlistStore {
    existing: bool,
    insert_failure: Option<StoreFailure>,
    panic_on_insert: bool,
    gate: Option<Arc<Gate>>,
    calls: Mutex<Vec<StoreCall>>,
}

impl Default for ScriptedWaitlistStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedWaitlistStore {
    /// Email never present; inserts succeed into "waitlist".
    pub fn new() -> Self {
        Self {
            existing: false,
            insert_failure: None,
            panic_on_insert: false,
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn gated() -> (Self, Arc<Gate>) {
        let gate = Arc::new(Gate::default());
        let mut store = Self::new();
        store.gate = Some(gate.clone());
        (store, gate)
    }

    pub fn with_existing(mut self, existing: bool) -> Self {
        self.existing = existing;
        self
    }

    pub fn with_insert_failure(mut self, failure: StoreFailure) -> Self {
        self.insert_failure = Some(failure);
        self
    }

    pub fn with_panicking_insert(mut self) -> Self {
        self.panic_on_insert = true;
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl WaitlistStore for ScriptedWaitlistStore {
    async fn probe(&self) -> bool {
        self.record(StoreCall::Probe);
        true
    }

    async fn exists(&self, email: &WaitlistEmail) -> bool {
        self.record(StoreCall::Exists(email.to_string()));
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.existing
    }

    async fn insert(&self, email: &WaitlistEmail) -> Result<InsertReceipt, StoreFailure> {
        self.record(StoreCall::Insert(email.to_string()));
        if self.panic_on_insert {
            panic!("scripted store panic");
        }
        match &self.insert_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(InsertReceipt {
                table: "waitlist".to_string(),
                entries: vec![WaitlistEntry::new(email.as_str())],
            }),
        }
    }
}
