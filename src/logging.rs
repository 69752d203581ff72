//! Log setup.
//!
//! The bridge only emits through the `log` facade. On Android the `android`
//! feature routes records to logcat; other hosts install their own logger and
//! this only adjusts the max level.

use log::LevelFilter;

pub const LOG_TAG: &str = "GroupBridge";

/// Max level: `Debug` with the `debug-logs` feature, `Info` otherwise.
pub fn default_level() -> LevelFilter {
    if cfg!(feature = "debug-logs") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Safe to call more than once.
#[cfg(feature = "android")]
pub fn init_logging() {
    use android_logger::Config;

    android_logger::init_once(
        Config::default()
            .with_max_level(default_level())
            .with_tag(LOG_TAG),
    );
    log::info!("Group bridge logging initialized ({})", default_level());
}

#[cfg(not(feature = "android"))]
pub fn init_logging() {
    log::set_max_level(default_level());
}
