//! Delayed reply delivery.
//!
//! Simulates "thinking" latency in front of a session: a reply is produced
//! by a background task after a random delay, at most one reply is in flight
//! per session, and a pending reply can be cancelled before it is produced.
//! Dropping the scheduler cancels whatever is still pending.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use psico_core::DelayConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::error::ChatError;
use crate::response::RandomSource;
use crate::session::ConversationSession;
use crate::types::Turn;

// =============================================================================
// ThinkingDelay
// =============================================================================

/// Inclusive range of simulated latency, sampled uniformly per reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThinkingDelay {
    min: Duration,
    max: Duration,
}

impl ThinkingDelay {
    /// Range `[min, max]`; an inverted range collapses to `min`.
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    /// No delay at all.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn from_config(config: &DelayConfig) -> Self {
        if !config.enabled {
            return Self::none();
        }
        Self::new(
            Duration::from_millis(config.min_ms),
            Duration::from_millis(config.max_ms),
        )
    }

    /// Uniform whole-millisecond delay within the range.
    pub fn sample<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Duration {
        let min = self.min.as_millis() as u64;
        let span = (self.max.as_millis() as u64).saturating_sub(min);
        if span == 0 {
            return self.min;
        }
        let offset = rng.next_index(span.saturating_add(1) as usize) as u64;
        Duration::from_millis(min + offset)
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }
}

// =============================================================================
// ReplyScheduler
// =============================================================================

const WAITING: u8 = 0;
const CANCELLED: u8 = 1;
const DELIVERING: u8 = 2;

/// Once the state leaves `WAITING` it never changes again, so exactly one of
/// cancel and delivery wins.
struct PendingReply {
    cancel: Arc<Notify>,
    state: Arc<AtomicU8>,
    handle: JoinHandle<Result<String, ChatError>>,
}

impl PendingReply {
    /// Claim the reply for cancellation. False once delivery has started.
    fn try_cancel(&self) -> bool {
        let claimed = self
            .state
            .compare_exchange(WAITING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if claimed {
            self.cancel.notify_one();
        }
        claimed
    }
}

/// Drives one session with simulated latency.
///
/// Must be used from within a tokio runtime.
pub struct ReplyScheduler<R = StdRng> {
    session: Arc<Mutex<ConversationSession<R>>>,
    session_id: Uuid,
    delay: ThinkingDelay,
    rng: StdRng,
    pending: Option<PendingReply>,
}

impl<R> ReplyScheduler<R>
where
    R: RandomSource + Send + 'static,
{
    pub fn new(session: ConversationSession<R>, delay: ThinkingDelay) -> Self {
        Self::with_delay_rng(session, delay, StdRng::from_os_rng())
    }

    /// Scheduler sampling delays from `rng`.
    pub fn with_delay_rng(session: ConversationSession<R>, delay: ThinkingDelay, rng: StdRng) -> Self {
        Self {
            session_id: session.id(),
            session: Arc::new(Mutex::new(session)),
            delay,
            rng,
            pending: None,
        }
    }

    /// Schedule a reply to `utterance` after a sampled delay.
    ///
    /// Returns the chosen delay. Fails with [`ChatError::ReplyPending`] while
    /// an earlier reply has not been collected or cancelled.
    pub fn submit(&mut self, utterance: impl Into<String>) -> Result<Duration, ChatError> {
        if self.pending.is_some() {
            return Err(ChatError::ReplyPending);
        }

        let utterance = utterance.into();
        let wait = self.delay.sample(&mut self.rng);
        let cancel = Arc::new(Notify::new());
        let signal = Arc::clone(&cancel);
        let state = Arc::new(AtomicU8::new(WAITING));
        let claim = Arc::clone(&state);
        let session = Arc::clone(&self.session);
        let session_id = self.session_id;

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = signal.notified() => {}
            }
            if claim
                .compare_exchange(WAITING, DELIVERING, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                debug!(%session_id, "Pending reply cancelled");
                return Err(ChatError::ReplyCancelled);
            }
            let mut session = session
                .lock()
                .map_err(|e| ChatError::Scheduler(format!("session lock poisoned: {}", e)))?;
            Ok(session.respond(&utterance))
        });

        debug!(%session_id, delay_ms = wait.as_millis() as u64, "Reply scheduled");
        self.pending = Some(PendingReply {
            cancel,
            state,
            handle,
        });
        Ok(wait)
    }

    /// Wait for the pending reply.
    ///
    /// Cancel-safe: if this future is dropped early the reply stays pending
    /// and can still be awaited or cancelled.
    pub async fn next_reply(&mut self) -> Result<String, ChatError> {
        let pending = self.pending.as_mut().ok_or(ChatError::NoPendingReply)?;
        let outcome = (&mut pending.handle).await;
        self.pending = None;
        outcome.map_err(|e| ChatError::Scheduler(e.to_string()))?
    }

    /// Cancel the pending reply. Returns whether a reply was cancelled.
    ///
    /// On `true` the reply is never produced and the session context is left
    /// untouched. Returns `false` when nothing is pending, or when the delay
    /// has already elapsed and the reply is being recorded; in that case it
    /// stays pending and [`next_reply`](Self::next_reply) still returns it.
    pub fn cancel(&mut self) -> bool {
        let cancelled = self.pending.as_ref().is_some_and(PendingReply::try_cancel);
        if cancelled {
            self.pending = None;
        }
        cancelled
    }

    /// Whether a reply is being "composed".
    pub fn is_composing(&self) -> bool {
        self.pending.is_some()
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Snapshot of the session's context window.
    pub fn context(&self) -> Result<Vec<Turn>, ChatError> {
        let session = self
            .session
            .lock()
            .map_err(|e| ChatError::Scheduler(format!("session lock poisoned: {}", e)))?;
        Ok(session.context())
    }
}

impl<R> Drop for ReplyScheduler<R> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.try_cancel();
            debug!(session_id = %self.session_id, "Scheduler dropped with a pending reply");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ChatEngine;
    use crate::knowledge::KnowledgeBase;

    fn scheduler(min_ms: u64, max_ms: u64) -> ReplyScheduler {
        let engine = ChatEngine::default().with_seed(Some(5));
        ReplyScheduler::with_delay_rng(
            engine.create_session(),
            ThinkingDelay::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms)),
            StdRng::seed_from_u64(5),
        )
    }

    #[test]
    fn test_delay_from_config() {
        let delay = ThinkingDelay::from_config(&DelayConfig::default());
        assert_eq!(delay.min(), Duration::from_millis(300));
        assert_eq!(delay.max(), Duration::from_millis(800));

        let disabled = DelayConfig {
            enabled: false,
            ..DelayConfig::default()
        };
        assert_eq!(ThinkingDelay::from_config(&disabled), ThinkingDelay::none());
    }

    #[test]
    fn test_delay_sample_within_range() {
        let delay = ThinkingDelay::new(Duration::from_millis(300), Duration::from_millis(800));
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..500 {
            let d = delay.sample(&mut rng);
            assert!(d >= Duration::from_millis(300) && d <= Duration::from_millis(800));
        }
    }

    #[test]
    fn test_delay_zero_span() {
        let delay = ThinkingDelay::new(Duration::from_millis(50), Duration::from_millis(50));
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(delay.sample(&mut rng), Duration::from_millis(50));
        assert_eq!(ThinkingDelay::none().sample(&mut rng), Duration::ZERO);
    }

    #[test]
    fn test_delay_inverted_range_collapses() {
        let delay = ThinkingDelay::new(Duration::from_millis(80), Duration::from_millis(10));
        assert_eq!(delay.max(), Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_submit_then_reply() {
        let mut sched = scheduler(1, 5);
        let wait = sched.submit("hola").unwrap();
        assert!(wait >= Duration::from_millis(1) && wait <= Duration::from_millis(5));
        assert!(sched.is_composing());

        let reply = sched.next_reply().await.unwrap();
        let greeting = KnowledgeBase::builtin()
            .entries()
            .next()
            .unwrap()
            .responses
            .clone();
        assert!(greeting.contains(&reply));
        assert!(!sched.is_composing());
        assert_eq!(sched.context().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_second_submit_while_pending_is_rejected() {
        let mut sched = scheduler(20, 20);
        sched.submit("hola").unwrap();
        let err = sched.submit("gracias").unwrap_err();
        assert!(matches!(err, ChatError::ReplyPending));

        sched.next_reply().await.unwrap();
        assert!(sched.submit("gracias").is_ok());
        sched.next_reply().await.unwrap();
        assert_eq!(sched.context().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_next_reply_without_submit() {
        let mut sched = scheduler(1, 1);
        let err = sched.next_reply().await.unwrap_err();
        assert!(matches!(err, ChatError::NoPendingReply));
    }

    #[tokio::test]
    async fn test_cancel_leaves_context_untouched() {
        let mut sched = scheduler(5_000, 5_000);
        sched.submit("hola").unwrap();
        assert!(sched.cancel());
        assert!(!sched.is_composing());
        assert!(!sched.cancel());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(sched.context().unwrap().is_empty());

        // A new reply can be scheduled after cancelling.
        sched.delay = ThinkingDelay::none();
        sched.submit("gracias").unwrap();
        sched.next_reply().await.unwrap();
        assert_eq!(sched.context().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_next_reply_is_cancel_safe() {
        let mut sched = scheduler(5_000, 5_000);
        sched.submit("hola").unwrap();
        let waited = tokio::time::timeout(Duration::from_millis(10), sched.next_reply()).await;
        assert!(waited.is_err());
        assert!(sched.is_composing());
        assert!(sched.cancel());
        assert!(sched.context().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_after_delay_elapsed_keeps_reply() {
        let mut sched = scheduler(0, 0);
        sched.submit("hola").unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!sched.cancel());
        assert!(sched.is_composing());
        assert_eq!(sched.context().unwrap().len(), 2);
        assert!(sched.next_reply().await.is_ok());
        assert!(!sched.is_composing());
    }

    #[tokio::test]
    async fn test_drop_cancels_pending_reply() {
        let engine = ChatEngine::default();
        let mut sched = ReplyScheduler::new(
            engine.create_session(),
            ThinkingDelay::new(Duration::from_secs(5), Duration::from_secs(5)),
        );
        sched.submit("hola").unwrap();
        let pending = sched.pending.take().unwrap();
        let handle = pending.handle;
        sched.pending = Some(PendingReply {
            cancel: pending.cancel,
            state: pending.state,
            handle: tokio::spawn(async { Err(ChatError::ReplyCancelled) }),
        });
        drop(sched);

        let outcome = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("cancelled task should finish promptly")
            .unwrap();
        assert!(matches!(outcome, Err(ChatError::ReplyCancelled)));
    }
}
