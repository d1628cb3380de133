//! Opt-in logging initialization for binaries and notebooks embedding the
//! library. The crate itself only emits through the `log` facade; nothing
//! is printed unless the host installs a logger or calls this toggle.

use std::fs::OpenOptions;
use std::sync::Once;

use log::LevelFilter;

static INIT_LOGGER: Once = Once::new();

/// Installs an `env_logger` backend at INFO level, optionally appending to
/// a file instead of stderr. Safe to call more than once; only the first
/// call has any effect, and an already-installed global logger wins.
pub fn enable_verbose_logging(log_file: Option<&str>) {
    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(LevelFilter::Info);

        // Custom formatter: just print the level and message
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(filename) = log_file {
            if let Ok(file) = OpenOptions::new().append(true).create(true).open(filename) {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
        }

        let _ = builder.try_init();
    });
}
