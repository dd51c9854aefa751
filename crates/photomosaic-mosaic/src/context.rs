//! Per-request deadline and cancellation state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::MosaicError;

/// Deadline and cancellation flag shared by every task of one request.
///
/// Region tasks call [`RequestContext::checkpoint`] between cells. The gather
/// step cancels the context when the deadline passes or a region fails, so the
/// remaining tasks stop at their next cell.
#[derive(Debug, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancelled: AtomicBool,
}

impl RequestContext {
    /// Context without a deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context expiring `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Context expiring at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Configured deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Asks every task of the request to stop.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns `true` once [`RequestContext::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Time left before the deadline; `None` without a deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Fails when the request was cancelled or its deadline passed.
    ///
    /// # Errors
    /// Returns [`MosaicError::DeadlineExceeded`] past the deadline and
    /// [`MosaicError::Cancelled`] after [`RequestContext::cancel`].
    pub fn checkpoint(&self) -> Result<(), MosaicError> {
        if self
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
        {
            return Err(MosaicError::DeadlineExceeded);
        }
        if self.is_cancelled() {
            return Err(MosaicError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_reports_cancellation_and_expiry() {
        let open = RequestContext::new();
        assert!(open.checkpoint().is_ok());
        assert!(open.remaining().is_none());

        open.cancel();
        assert!(matches!(open.checkpoint(), Err(MosaicError::Cancelled)));

        let expired = RequestContext::with_deadline(Instant::now());
        assert!(matches!(
            expired.checkpoint(),
            Err(MosaicError::DeadlineExceeded)
        ));
        assert_eq!(expired.remaining(), Some(Duration::ZERO));
    }
}
