use order_intake::{AppConfig, run_gui};
use tracing::info;

fn main() -> eframe::Result {
    // Read config first so a RUST_LOG set in .env applies.
    let config = AppConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!(
        data_dir = %config.data_dir.display(),
        service = %config.api_base_url,
        extraction = config.api_key.is_some(),
        "starting order intake"
    );
    run_gui(config)
}
