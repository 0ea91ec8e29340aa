//! Cooperative cancellation for in-flight sends.

use tokio::sync::watch;

/// Owner side of a cancellation flag.
///
/// Cancelling is sticky and fans out to every token. Pipelines poll their
/// token at phase boundaries; work already past its last check runs to
/// completion.
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

impl CancelSource {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn cancel(&self) {
        // Returns Err only when no receiver is alive, which is fine here.
        let _ = self.tx.send(true);
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side handed to pipelines.
#[derive(Clone, Debug)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled() {
        let source = CancelSource::new();
        assert!(!source.token().is_cancelled());
    }

    #[test]
    fn cancel_reaches_every_token() {
        let source = CancelSource::new();
        let before = source.token();
        source.cancel();
        let after = source.token();
        assert!(before.is_cancelled());
        assert!(after.is_cancelled());
        assert!(before.clone().is_cancelled());
    }

    #[test]
    fn cancel_without_tokens_does_not_panic() {
        let source = CancelSource::new();
        source.cancel();
        assert!(source.token().is_cancelled());
    }
}
