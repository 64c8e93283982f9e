use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::{
    adapters::store::{RecordBackend, postgrest_error::PostgrestErrorBody},
    app_error::{AppError, AppResult, StoreError, StoreErrorKind},
    domain::entities::waitlist_entry::WaitlistEntry,
};

/// `RecordBackend` over a hosted PostgREST endpoint, authenticated with the
/// anonymous-role key.
#[derive(Clone)]
pub struct PostgrestBackend {
    client: Client,
    base_url: Url,
    anon_key: SecretString,
}

impl PostgrestBackend {
    pub fn new(client: Client, mut base_url: Url, anon_key: SecretString) -> Self {
        // `Url::join` replaces the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            client,
            base_url,
            anon_key,
        }
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(&format!("rest/v1/{path}"))
            .map_err(|e| AppError::Config(format!("invalid store URL: {e}")))
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        let key = self.anon_key.expose_secret();
        req.header("apikey", key).bearer_auth(key)
    }
}

#[async_trait]
impl RecordBackend for PostgrestBackend {
    #[instrument(skip(self))]
    async fn find_by_email(&self, table: &str, email: &str) -> AppResult<Option<WaitlistEntry>> {
        let req = self
            .client
            .get(self.endpoint(table)?)
            .query(&[
                ("select", "email".to_string()),
                ("email", format!("eq.{email}")),
                ("limit", "1".to_string()),
            ]);
        let response = self.authorized(req).send().await?;
        let rows = read_rows(response).await?;

        Ok(rows.into_iter().next().map(|row| {
            decode_entry(row, table).unwrap_or_else(|| WaitlistEntry::new(email))
        }))
    }

    #[instrument(skip(self))]
    async fn sample(&self, table: &str) -> AppResult<usize> {
        let req = self
            .client
            .get(self.endpoint(table)?)
            .query(&[("select", "id"), ("limit", "1")]);
        let response = self.authorized(req).send().await?;
        Ok(read_rows(response).await?.len())
    }

    #[instrument(skip(self))]
    async fn insert_email(&self, table: &str, email: &str) -> AppResult<Vec<WaitlistEntry>> {
        let req = self
            .client
            .post(self.endpoint(table)?)
            .header("Prefer", "return=representation")
            .json(&json!({ "email": email }));
        let response = self.authorized(req).send().await?;
        let rows = read_rows(response).await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| decode_entry(row, table))
            .collect())
    }

    #[instrument(skip(self, args))]
    async fn call_rpc(&self, function: &str, args: Value) -> AppResult<()> {
        let req = self
            .client
            .post(self.endpoint(&format!("rpc/{function}"))?)
            .json(&args);
        let response = self.authorized(req).send().await?;
        check_status(response).await?;
        debug!(function, "rpc completed");
        Ok(())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

async fn read_rows(response: Response) -> AppResult<Vec<Value>> {
    let response = check_status(response).await?;
    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&text)
        .map_err(|e| AppError::Internal(format!("unexpected store response: {e}")))
}

/// Turn a non-2xx response into a classified `StoreError`.
async fn check_status(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<PostgrestErrorBody>(&text).unwrap_or_else(|_| {
        PostgrestErrorBody {
            message: Some(if text.trim().is_empty() {
                status.to_string()
            } else {
                text
            }),
            ..Default::default()
        }
    });

    Err(store_error_for_status(status, body).into())
}

fn store_error_for_status(status: StatusCode, body: PostgrestErrorBody) -> StoreError {
    let mut err = StoreError::from(body);
    if err.kind == StoreErrorKind::Unknown
        && matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
    {
        err.kind = StoreErrorKind::PermissionDenied;
    }
    err
}

fn decode_entry(row: Value, table: &str) -> Option<WaitlistEntry> {
    match serde_json::from_value(row) {
        Ok(entry) => Some(entry),
        Err(err) => {
            warn!(table, error = %err, "could not decode store row");
            None
        }
    }
}
