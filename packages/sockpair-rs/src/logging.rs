//! `env_logger` setup for the `sockpair` binary.
use std::io::Write;

use chrono::Utc;
use log::LevelFilter;

const OWN_CRATES: &[&str] = &["sockpair", "sockpair_rs", "sockpair_vision"];

/// Honours `RUST_LOG` when set; otherwise logs our crates at Info (Debug when
/// verbose) and silences dependencies.
pub fn init(verbose: bool) {
    let mut builder = env_logger::Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_env("RUST_LOG");
    } else {
        let level = if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };
        builder.filter(None, LevelFilter::Off);
        for name in OWN_CRATES {
            builder.filter(Some(name), level);
        }
    }

    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} {:<5} {}: {}",
            Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            record.level(),
            record.module_path().unwrap_or("unknown"),
            record.args()
        )
    });

    // A second init (tests, embedding) keeps the first logger.
    let _ = builder.try_init();
}
