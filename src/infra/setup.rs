use crate::{
    adapters::store::{StoreSettings, WaitlistStoreAdapter, postgrest::PostgrestBackend},
    infra::{config::AppConfig, http_client::try_build_client},
    use_cases::waitlist::{SubmissionController, WaitlistStore},
};
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn WaitlistStore>,
    pub controller: Arc<SubmissionController>,
}

pub fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let client = try_build_client(Duration::from_secs(config.http_timeout_secs))?;
    let backend = Arc::new(PostgrestBackend::new(
        client,
        config.store_url.clone(),
        config.store_anon_key.clone(),
    ));

    let settings = StoreSettings::new(
        &config.primary_table,
        &config.fallback_table,
        config.pre_provision,
    )?;
    let store = Arc::new(WaitlistStoreAdapter::new(backend, settings)) as Arc<dyn WaitlistStore>;

    let controller = SubmissionController::new(store.clone());

    Ok(AppState {
        config: Arc::new(config),
        store,
        controller: Arc::new(controller),
    })
}

pub fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "waitlist=debug".into());

    // Console (pretty logs); stderr keeps stdout free for the form.
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .pretty();

    // File (structured JSON logs)
    let file = File::create("waitlist.log")?;
    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();

    Ok(())
}
