// Tracing subscriber setup
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins when set; otherwise info for this crate and warn for sqlx.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
