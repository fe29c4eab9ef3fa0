//! Cancellation scope shared by one scheduling run

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a scope stopped accepting work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeEnd {
    DeadlineExceeded,
    Canceled,
}

/// A cancellation token combined with an optional deadline
///
/// Cloning is cheap; clones observe the same token and deadline.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Scope {
    /// Scope without a deadline, ended only by [`Scope::cancel`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope that ends `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Reason the scope ended, or `None` while it is still live
    pub fn end_reason(&self) -> Option<ScopeEnd> {
        if self.token.is_cancelled() {
            return Some(ScopeEnd::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ScopeEnd::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.end_reason().is_some()
    }

    /// Resolves once the scope is canceled or its deadline passes
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scope_without_deadline_is_live() {
        let scope = Scope::new();
        assert!(!scope.is_done());
        assert_eq!(scope.end_reason(), None);
    }

    #[tokio::test]
    async fn test_cancel_ends_scope() {
        let scope = Scope::new();
        let clone = scope.clone();
        clone.cancel();

        scope.done().await;
        assert_eq!(scope.end_reason(), Some(ScopeEnd::Canceled));
    }

    #[tokio::test]
    async fn test_zero_deadline_is_already_exceeded() {
        let scope = Scope::with_timeout(Duration::ZERO);
        assert_eq!(scope.end_reason(), Some(ScopeEnd::DeadlineExceeded));
        scope.done().await;
    }
}
