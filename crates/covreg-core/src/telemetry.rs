//! Log setup for the `covreg` binary.
//!
//! Report sets are printed on stdout, so every log line goes to stderr.
//! Without `RUST_LOG`, the covreg crates log at the requested level and
//! everything else is held to warnings.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const COVREG_TARGETS: [&str; 3] = ["covreg_core", "covreg_sensors", "covreg"];

/// Filter directives used when `RUST_LOG` is unset.
fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    let mut directives = vec!["warn".to_string()];
    directives.extend(COVREG_TARGETS.iter().map(|target| format!("{target}={level}")));
    directives.join(",")
}

/// Install the global subscriber; `json` switches to one JSON object per line.
///
/// Returns `false` when a subscriber was already installed, in which case
/// the existing one is kept.
pub fn init_tracing(json: bool, level: Level) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));
    let output = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json {
        registry.with(output.json()).try_init()
    } else {
        registry.with(output).try_init()
    };
    installed.is_ok()
}
