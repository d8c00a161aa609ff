//! Cooperative cancellation checked between pipeline stages.

use tokio::sync::watch;

use crate::error::{FlightError, FlightResult};

/// Sender half: flips the shared flag.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Request cancellation. Stages already in flight finish first.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiver half passed into the pipeline.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    rx: Option<watch::Receiver<bool>>,
}

impl CancellationToken {
    /// Create a linked handle/token pair.
    pub fn new() -> (CancelHandle, CancellationToken) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, CancellationToken { rx: Some(rx) })
    }

    /// Token that can never be cancelled.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Return `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> FlightResult<()> {
        if self.is_cancelled() {
            Err(FlightError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::never()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_propagates_to_clones() {
        let (handle, token) = CancellationToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());

        handle.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(clone.check(), Err(FlightError::Cancelled)));
    }

    #[test]
    fn test_never_token() {
        assert!(!CancellationToken::never().is_cancelled());
    }
}
