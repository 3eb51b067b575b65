use time::macros::format_description;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber: `RUST_LOG` levels, compact single line
/// output stamped with local time, worker thread names included.
///
/// Records emitted through the `log` facade are forwarded as well. Calling it
/// a second time is a no-op.
pub fn init_logger() {
    let time_format =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_timer(LocalTime::new(time_format))
                .with_target(false)
                .with_level(true)
                .with_thread_names(true)
                .with_line_number(false)
                .with_file(false)
                .compact(),
        )
        .with(env_filter())
        .try_init();
}
