use std::sync::Arc;

use dotenvy::dotenv;
use tokio::io::BufReader;
use tracing::{info, warn};

use waitlist::{
    adapters::terminal::run_terminal,
    infra::setup::{init_app_state, init_tracing},
    use_cases::waitlist::WaitlistStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing()?;

    let app_state = init_app_state()?;

    info!(store = %app_state.config.store_url, "waitlist form ready");

    spawn_startup_probe(app_state.store.clone());

    run_terminal(
        &app_state.controller,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    Ok(())
}

/// Diagnostics only: the form is usable whether or not this succeeds.
fn spawn_startup_probe(store: Arc<dyn WaitlistStore>) {
    tokio::spawn(async move {
        if !store.probe().await {
            warn!("store probe failed; submissions will still be attempted");
        }
    });
}
