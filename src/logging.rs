//! Console logging for the sweep binary and demos.

use std::io::Write;

pub use log::LevelFilter;

/// Install `env_logger` as the global logger.
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies. Calling this more than
/// once is harmless.
pub fn init(default_level: LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(default_level);
    builder.parse_env(env_logger::Env::default());

    builder.format(|buf, record| {
        let (color, level_str) = match record.level() {
            log::Level::Error => ("\x1b[31m", "ERROR"),
            log::Level::Warn => ("\x1b[33m", "WARN"),
            log::Level::Info => ("\x1b[32m", "INFO"),
            log::Level::Debug => ("\x1b[36m", "DEBUG"),
            log::Level::Trace => ("\x1b[35m", "TRACE"),
        };
        let reset = "\x1b[0m";

        // Our own records print without a module prefix
        match record.module_path().and_then(|path| path.split("::").next()) {
            Some("sirv") | Some("sirv_sweep") | None => {
                writeln!(buf, "{}{}{} {}", color, level_str, reset, record.args())
            }
            Some(other) => {
                writeln!(buf, "{}{}{} [{}] {}", color, level_str, reset, other, record.args())
            }
        }
    });

    // Already initialized
    let _ = builder.try_init();
}

/// Logging at `info` unless `RUST_LOG` says otherwise.
pub fn init_default() {
    init(LevelFilter::Info);
}
