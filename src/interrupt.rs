//! User interrupt (Ctrl-C) signalling
//!
//! [`Interrupt`] is a cloneable flag. Long-running steps race their work
//! against [`Interrupt::triggered`] so that a Ctrl-C stops the current child
//! process and the loop around it.

use std::sync::Arc;
use tokio::sync::watch;

/// Shared interrupt flag
#[derive(Debug, Clone)]
pub struct Interrupt {
    tx: Arc<watch::Sender<bool>>,
}

impl Interrupt {
    /// Create an untriggered flag
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Create a flag that is triggered by Ctrl-C
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_ctrl_c() -> Self {
        let interrupt = Self::new();
        let handle = interrupt.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                handle.trigger();
            }
        });
        interrupt
    }

    /// Raise the flag
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Resolves when the flag is raised (immediately if it already is)
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|raised| *raised).await;
    }
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_is_not_triggered() {
        let interrupt = Interrupt::new();
        assert!(!*interrupt.tx.borrow());
    }

    #[test]
    fn test_trigger_is_shared_between_clones() {
        let interrupt = Interrupt::new();
        let clone = interrupt.clone();
        clone.trigger();
        assert!(*interrupt.tx.borrow());
    }

    #[tokio::test]
    async fn test_triggered_resolves_when_already_raised() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        tokio::time::timeout(Duration::from_secs(1), interrupt.triggered())
            .await
            .expect("should resolve immediately");
    }

    #[tokio::test]
    async fn test_triggered_resolves_after_trigger() {
        let interrupt = Interrupt::new();
        let handle = interrupt.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.trigger();
        });
        tokio::time::timeout(Duration::from_secs(2), interrupt.triggered())
            .await
            .expect("should resolve after trigger");
    }

    #[tokio::test]
    async fn test_triggered_pending_without_trigger() {
        let interrupt = Interrupt::new();
        let result =
            tokio::time::timeout(Duration::from_millis(30), interrupt.triggered()).await;
        assert!(result.is_err());
    }
}
