use std::path::Path;
use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt};

static GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
static INIT: OnceLock<()> = OnceLock::new();

/// Installs the process-wide tracing subscriber, writing to `path`.
/// Idempotent: later calls are no-ops. `RUST_LOG` overrides the
/// `default_filter` directive when set.
pub fn init_logging<P: AsRef<Path>>(path: P, default_filter: &str) {
    INIT.get_or_init(|| {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }

        let file = match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(err) => {
                eprintln!("citadel: cannot open log file {}: {err}", path.display());
                return;
            }
        };
        let (writer, guard) = tracing_appender::non_blocking(file);
        let _ = GUARD.set(guard);

        let filter = if std::env::var_os("RUST_LOG").is_some() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::try_new(default_filter).unwrap_or_else(|_| EnvFilter::new("info"))
        };

        let subscriber = fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .finish();

        // Tests may have installed a subscriber already; that is fine.
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
