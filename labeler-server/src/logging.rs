//! Tracing setup for labeler-server
//!
//! Tracing is installed before configuration is resolved so that config
//! loading is logged. The filter starts at the default level and is swapped
//! for the configured level once it is known, unless `RUST_LOG` is set.

use labeler_common::config::DEFAULT_LOG_LEVEL;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry};

/// Filter directives enabling `level` for this service's crates
pub fn filter_directives(level: &str) -> String {
    format!(
        "labeler_server={0},labeler_common={0},tower_http={0}",
        level
    )
}

/// Handle for adjusting the installed log filter
pub struct LogFilter {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogFilter {
    /// Switch to the configured level; a `RUST_LOG` filter is left in place
    pub fn apply_level(&self, level: &str) -> Result<(), reload::Error> {
        if self.from_env {
            return Ok(());
        }
        self.handle.reload(EnvFilter::new(filter_directives(level)))
    }
}

/// Reloadable filter layer, seeded from `RUST_LOG` when present
fn reloadable(env_filter: Option<EnvFilter>) -> (reload::Layer<EnvFilter, Registry>, LogFilter) {
    let from_env = env_filter.is_some();
    let filter =
        env_filter.unwrap_or_else(|| EnvFilter::new(filter_directives(DEFAULT_LOG_LEVEL)));
    let (layer, handle) = reload::Layer::new(filter);
    (layer, LogFilter { handle, from_env })
}

/// Install the global subscriber (registry + filter + fmt layer)
pub fn init_tracing() -> LogFilter {
    let (filter, log_filter) = reloadable(EnvFilter::try_from_default_env().ok());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
    log_filter
}
