//! Operator interrupt handling
//!
//! A [`ShutdownSignal`] is a shared flag. The accept loop and the replay
//! session poll it; [`ShutdownSignal::install_ctrl_c`] sets it on Ctrl-C.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::observability::{Event, Logger};

/// Cloneable shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    requested: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks every holder of this signal to stop.
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Sets the flag on the first Ctrl-C.
    ///
    /// Spawns a helper thread running a current-thread tokio runtime that
    /// waits for the signal. The replay itself stays synchronous.
    pub fn install_ctrl_c(&self) -> io::Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let signal = self.clone();

        thread::Builder::new()
            .name("ctrl-c".to_string())
            .spawn(move || {
                runtime.block_on(async {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        Logger::event(Event::ShutdownRequested, &[]);
                        signal.request();
                    }
                });
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_flag() {
        let signal = ShutdownSignal::new();
        let other = signal.clone();
        assert!(!other.is_requested());

        signal.request();

        assert!(other.is_requested());
    }
}
