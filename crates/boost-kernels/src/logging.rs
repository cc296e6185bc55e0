//! Rate-limited logging for hot entry points.
//!
//! Entry points that run once per boosting round announce themselves at
//! info level a bounded number of times, then drop to trace so long training
//! runs do not flood the log.

use std::sync::atomic::{AtomicI32, Ordering};

use log::Level;

/// A process-wide countdown of info-level messages.
pub(crate) struct LogBudget(AtomicI32);

impl LogBudget {
    pub(crate) const fn new(messages: i32) -> Self {
        Self(AtomicI32::new(messages))
    }

    /// Level for the next message: `Info` while the budget lasts, `Trace` after.
    pub(crate) fn next_level(&self) -> Level {
        let spent = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |left| {
                (left > 0).then(|| left - 1)
            });
        if spent.is_ok() {
            Level::Info
        } else {
            Level::Trace
        }
    }

    #[cfg(test)]
    pub(crate) fn remaining(&self) -> i32 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Log through a [`LogBudget`]: info while it lasts, trace afterwards.
macro_rules! log_counted {
    ($budget:expr, $($arg:tt)+) => {{
        let level = $budget.next_level();
        log::log!(level, $($arg)+);
    }};
}

/// Log an unsupported configuration and abort the process.
///
/// Used where the caller asked for something the kernels do not implement
/// and no error channel exists.
#[cold]
pub(crate) fn abort_unsupported(what: std::fmt::Arguments<'_>) -> ! {
    log::error!("unsupported: {what}");
    std::process::abort()
}
