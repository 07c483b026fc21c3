//! User interruption (Ctrl-C / SIGINT).
//!
//! Once [`Interrupt::listen`] has installed the handler the signal no
//! longer terminates the process. The pipelines poll the flag instead and
//! stop with [`Error::Interrupted`] before any output is committed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::signal;
use tracing::warn;

use crate::error::{Error, Result};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the signal handler and set the flag when it fires.
    ///
    /// Must be called from within a tokio runtime. On unix the handler is
    /// registered before this returns, so a signal arriving right after
    /// startup is already caught.
    pub fn listen(&self) -> Result<()> {
        let interrupt = self.clone();

        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
            tokio::spawn(async move {
                while sigint.recv().await.is_some() {
                    interrupt.trigger();
                }
            });
        }

        #[cfg(not(unix))]
        tokio::spawn(async move {
            while signal::ctrl_c().await.is_ok() {
                interrupt.trigger();
            }
        });

        Ok(())
    }

    pub fn trigger(&self) {
        if !self.flag.swap(true, Ordering::SeqCst) {
            warn!("Interrupted, stopping before any output is written");
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(Error::Interrupted)` once the flag is set.
    pub fn check(&self) -> Result<()> {
        if self.is_triggered() {
            Err(Error::Interrupted)
        } else {
            Ok(())
        }
    }
}
