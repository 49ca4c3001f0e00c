use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Ambient context passed to init, start and stop hooks
///
/// Carries a cancellation signal and an optional deadline. Hooks are
/// expected to observe it cooperatively; nothing forces them to.
///
/// # Example
///
/// ```rust,ignore
/// Behavior::new().on_start(|ctx: Context| async move {
///     tokio::select! {
///         _ = ctx.cancelled() => Err("cancelled before the listener was bound".into()),
///         res = bind_listener() => res,
///     }
/// })
/// ```
#[derive(Clone, Debug, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// Create a context with no deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context that expires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Create a context that expires after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Derive a child context
    ///
    /// Cancelling the parent cancels the child, not the other way around.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derive a child context whose deadline is the tighter of the
    /// parent's and `deadline`
    pub fn child_with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline, zero once it has passed
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once the context (or any of its parents) is cancelled
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_child_takes_tighter_deadline() {
        let now = Instant::now();
        let parent = Context::with_deadline(now + Duration::from_secs(5));

        let tighter = parent.child_with_deadline(now + Duration::from_secs(1));
        assert_eq!(tighter.deadline(), Some(now + Duration::from_secs(1)));

        let looser = parent.child_with_deadline(now + Duration::from_secs(30));
        assert_eq!(looser.deadline(), Some(now + Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_cancellation_flows_to_children_only() {
        let parent = Context::new();
        let child = parent.child();

        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let other = parent.child();
        parent.cancel();
        other.cancelled().await;
        assert!(other.is_cancelled());
    }
}
