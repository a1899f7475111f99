use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt};

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Installs the global subscriber once. `default_filter` applies when
/// `RUST_LOG` is unset.
pub fn init_tracing(default_filter: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(filter)
            // stderr keeps stdout free for whatever embeds us
            .with_writer(std::io::stderr)
            .finish();

        if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("tracing subscriber already installed: {}", err);
        }
    });
}
