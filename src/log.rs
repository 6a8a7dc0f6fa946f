//! Switchable logging on top of the `log` facade.
//!
//! Frontends that own the terminal can mute the crate without touching
//! the global logger.

use std::sync::atomic::{AtomicBool, Ordering};

/// Target for session level events (state transitions, step operations).
pub const SESSION_TARGET: &str = "debugger";
/// Target for everything that talks to the execution engine.
pub const ENGINE_TARGET: &str = "engine";

static ENABLED: AtomicBool = AtomicBool::new(true);

#[inline(always)]
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::SeqCst)
}

pub fn disable() {
    ENABLED.store(false, Ordering::SeqCst)
}

pub fn enable() {
    ENABLED.store(true, Ordering::SeqCst)
}

#[doc(hidden)]
#[macro_export]
macro_rules! _rvd_log {
    ($level:ident, target: $target:expr, $($arg:tt)+) => {
        if $crate::log::is_enabled() {
            log::$level!(target: $target, $($arg)+)
        }
    };
    ($level:ident, $($arg:tt)+) => {
        if $crate::log::is_enabled() {
            log::$level!(target: $crate::log::SESSION_TARGET, $($arg)+)
        }
    };
}

#[macro_export]
macro_rules! rvd_info {
    ($($arg:tt)+) => { $crate::_rvd_log!(info, $($arg)+) };
}

#[macro_export]
macro_rules! rvd_warn {
    ($($arg:tt)+) => { $crate::_rvd_log!(warn, $($arg)+) };
}

#[macro_export]
macro_rules! rvd_error {
    ($($arg:tt)+) => { $crate::_rvd_log!(error, $($arg)+) };
}

#[macro_export]
macro_rules! rvd_debug {
    ($($arg:tt)+) => { $crate::_rvd_log!(debug, $($arg)+) };
}
