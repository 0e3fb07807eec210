//! The client session controller.
//!
//! An explicit finite-state session object with imperative start/stop
//! semantics for its two timers. Single-threaded cooperative: refresh
//! calls and activity updates interleave through the event loop, and an
//! inactivity-triggered logout always cancels the pending refresh timer
//! first, so no refresh can fire after logout.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::audit::{EventStatus, SecurityEvent, SecurityLog};
use crate::broadcast::SessionBroadcast;
use crate::state::{ActivityKind, SessionState};
use crate::transport::AuthTransport;

/// Timer configuration for the controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Lifetime of an access token.
    pub access_ttl: Duration,
    /// How long before access expiry the silent refresh fires.
    pub refresh_lead: Duration,
    /// Inactivity window after which the session expires.
    pub inactivity_timeout: Duration,
    /// Finite timeout on each refresh network call.
    pub refresh_call_timeout: Duration,
    /// Capacity of the security event ring buffer.
    pub audit_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            access_ttl: Duration::from_secs(15 * 60),
            refresh_lead: Duration::from_secs(60),
            inactivity_timeout: Duration::from_secs(30 * 60),
            refresh_call_timeout: Duration::from_secs(10),
            audit_capacity: 10,
        }
    }
}

/// Handles for the tasks a session owns. All are cancelled on any exit
/// from the `Active` state.
#[derive(Debug, Default)]
struct Timers {
    refresh: Option<JoinHandle<()>>,
    inactivity: Option<JoinHandle<()>>,
    listener: Option<JoinHandle<()>>,
}

struct Inner {
    config: ControllerConfig,
    transport: Arc<dyn AuthTransport>,
    broadcast: Arc<dyn SessionBroadcast>,
    /// The access token, held in volatile memory only.
    token: Mutex<Option<String>>,
    state_tx: watch::Sender<SessionState>,
    audit: Mutex<SecurityLog>,
    timers: Mutex<Timers>,
    /// The inactivity deadline; qualifying input pushes it forward.
    activity_deadline: Mutex<Instant>,
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &*self.state_tx.borrow())
            .finish()
    }
}

/// Client-side session controller.
#[derive(Debug, Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    /// Creates a signed-out controller.
    pub fn new(
        transport: Arc<dyn AuthTransport>,
        broadcast: Arc<dyn SessionBroadcast>,
        config: ControllerConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::SignedOut);
        let audit_capacity = config.audit_capacity;
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                broadcast,
                token: Mutex::new(None),
                state_tx,
                audit: Mutex::new(SecurityLog::new(audit_capacity)),
                timers: Mutex::new(Timers::default()),
                activity_deadline: Mutex::new(Instant::now()),
            }),
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        *self.inner.state_tx.borrow()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    /// The in-memory access token, if any.
    pub fn access_token(&self) -> Option<String> {
        self.inner.token.lock().unwrap().clone()
    }

    /// Snapshot of the security event log, oldest first.
    pub fn security_events(&self) -> Vec<SecurityEvent> {
        self.inner.audit.lock().unwrap().events()
    }

    /// Starts a session after a successful authentication.
    ///
    /// Unconditionally cancels stale timers first, so repeated logins are
    /// idempotent. Attaches the cross-tab listener exactly once for this
    /// session; `logout` and expiry detach it symmetrically.
    pub fn start(&self, access_token: String) {
        let inner = &self.inner;
        inner.cancel_all_timers();

        *inner.token.lock().unwrap() = Some(access_token);
        *inner.activity_deadline.lock().unwrap() =
            Instant::now() + inner.config.inactivity_timeout;
        inner.state_tx.send_replace(SessionState::Active);
        inner.record_event("login", EventStatus::Success, "session started");

        let refresh = tokio::spawn(Arc::clone(inner).run_refresh_loop());
        let inactivity = tokio::spawn(Arc::clone(inner).run_inactivity_watch());
        let listener = tokio::spawn(
            Arc::clone(inner).run_logout_listener(inner.broadcast.subscribe()),
        );

        let mut timers = inner.timers.lock().unwrap();
        timers.refresh = Some(refresh);
        timers.inactivity = Some(inactivity);
        timers.listener = Some(listener);
    }

    /// Reports a qualifying input event, postponing the inactivity
    /// deadline. Ignored outside the `Active` state — the listeners are
    /// detached once the session ends.
    pub fn notify_activity(&self, kind: ActivityKind) {
        let inner = &self.inner;
        if *inner.state_tx.borrow() != SessionState::Active {
            return;
        }
        debug!(?kind, "Activity observed");
        *inner.activity_deadline.lock().unwrap() =
            Instant::now() + inner.config.inactivity_timeout;
    }

    /// Logs out: cancels both timers, drops the token, announces the
    /// logout to other tabs, and tells the server (best-effort).
    pub async fn logout(&self) {
        let inner = &self.inner;
        inner.cancel_all_timers();
        *inner.token.lock().unwrap() = None;
        inner.state_tx.send_replace(SessionState::SignedOut);
        inner.record_event("logout", EventStatus::Success, "user logout");
        inner.broadcast.publish_logout();

        let _ = tokio::time::timeout(inner.config.refresh_call_timeout, inner.transport.logout())
            .await;
    }
}

impl Inner {
    /// Aborts every session task. Safe to call repeatedly.
    fn cancel_all_timers(&self) {
        let mut timers = self.timers.lock().unwrap();
        for handle in [
            timers.refresh.take(),
            timers.inactivity.take(),
            timers.listener.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }

    /// Appends to the ring buffer and mirrors the event to the server
    /// without blocking on failure.
    fn record_event(&self, kind: &str, status: EventStatus, context: impl Into<String>) {
        let event = SecurityEvent::new(kind, status, context);
        self.audit.lock().unwrap().push(event.clone());

        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            if let Err(e) = transport.mirror_event(&event).await {
                debug!(error = %e, "Security event mirror failed");
            }
        });
    }

    /// Silent refresh loop: sleeps until shortly before access expiry,
    /// then exchanges the refresh cookie for a new token. Any failure is
    /// terminal — no retry.
    async fn run_refresh_loop(self: Arc<Self>) {
        let mut ttl = self.config.access_ttl;
        loop {
            let wait = ttl
                .saturating_sub(self.config.refresh_lead)
                .max(Duration::from_secs(1));
            tokio::time::sleep(wait).await;

            let result =
                tokio::time::timeout(self.config.refresh_call_timeout, self.transport.refresh())
                    .await;

            match result {
                Ok(Ok(refreshed)) => {
                    *self.token.lock().unwrap() = Some(refreshed.access_token);
                    ttl = refreshed.expires_in;
                    self.record_event("refresh", EventStatus::Success, "access token renewed");
                }
                Ok(Err(e)) => {
                    self.record_event("refresh", EventStatus::Failure, e.to_string());
                    self.fail_session();
                    break;
                }
                Err(_) => {
                    self.record_event("refresh", EventStatus::Failure, "refresh timed out");
                    self.fail_session();
                    break;
                }
            }
        }
    }

    /// A failed refresh forces an immediate logout.
    fn fail_session(&self) {
        // Called from the refresh task itself: take all handles, abort the
        // others, and let our own finish by returning.
        let (inactivity, listener) = {
            let mut timers = self.timers.lock().unwrap();
            let _ = timers.refresh.take();
            (timers.inactivity.take(), timers.listener.take())
        };
        if let Some(handle) = inactivity {
            handle.abort();
        }
        if let Some(handle) = listener {
            handle.abort();
        }

        *self.token.lock().unwrap() = None;
        self.state_tx.send_replace(SessionState::SignedOut);
        self.broadcast.publish_logout();
    }

    /// Watches the sliding inactivity deadline.
    async fn run_inactivity_watch(self: Arc<Self>) {
        loop {
            let deadline = *self.activity_deadline.lock().unwrap();
            if Instant::now() >= deadline {
                self.expire_session();
                break;
            }
            tokio::time::sleep_until(deadline).await;
        }
    }

    /// Inactivity expiry. The pending refresh timer is cancelled before
    /// anything else, so no refresh fires after this point.
    fn expire_session(&self) {
        let (refresh, listener) = {
            let mut timers = self.timers.lock().unwrap();
            let _ = timers.inactivity.take();
            (timers.refresh.take(), timers.listener.take())
        };
        if let Some(handle) = refresh {
            handle.abort();
        }
        if let Some(handle) = listener {
            handle.abort();
        }

        *self.token.lock().unwrap() = None;
        self.record_event(
            "session_expired",
            EventStatus::Success,
            "inactivity timeout",
        );
        self.state_tx.send_replace(SessionState::Expired);
        self.broadcast.publish_logout();
    }

    /// Observes logout announcements from other tabs.
    async fn run_logout_listener(self: Arc<Self>, mut rx: broadcast::Receiver<()>) {
        loop {
            match rx.recv().await {
                Ok(()) => {
                    // Our own announcements arrive here too; only a still
                    // Active session has anything to tear down.
                    if *self.state_tx.borrow() == SessionState::Active {
                        self.observe_remote_logout();
                    }
                    break;
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Another tab logged out: cancel local timers, drop the token.
    fn observe_remote_logout(&self) {
        let (refresh, inactivity) = {
            let mut timers = self.timers.lock().unwrap();
            let _ = timers.listener.take();
            (timers.refresh.take(), timers.inactivity.take())
        };
        if let Some(handle) = refresh {
            handle.abort();
        }
        if let Some(handle) = inactivity {
            handle.abort();
        }

        *self.token.lock().unwrap() = None;
        self.record_event("logout", EventStatus::Success, "logout observed from another tab");
        self.state_tx.send_replace(SessionState::SignedOut);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::TabBroadcast;
    use crate::transport::{RefreshedToken, TransportError};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct FakeTransport {
        refresh_calls: AtomicUsize,
        mirrored: AtomicUsize,
        fail_refresh: AtomicBool,
    }

    #[async_trait::async_trait]
    impl AuthTransport for FakeTransport {
        async fn refresh(&self) -> Result<RefreshedToken, TransportError> {
            let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_refresh.load(Ordering::SeqCst) {
                return Err(TransportError::Revoked);
            }
            Ok(RefreshedToken {
                access_token: format!("token-{n}"),
                expires_in: Duration::from_secs(15 * 60),
            })
        }

        async fn logout(&self) -> Result<(), TransportError> {
            Ok(())
        }

        async fn mirror_event(&self, _event: &SecurityEvent) -> Result<(), TransportError> {
            self.mirrored.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn controller(transport: Arc<FakeTransport>) -> SessionController {
        SessionController::new(
            transport,
            Arc::new(TabBroadcast::new()),
            ControllerConfig::default(),
        )
    }

    /// Advance the paused clock and let woken tasks run.
    async fn advance(duration: Duration) {
        // Let freshly spawned tasks arm their (relative) timers before the
        // clock jumps, mirroring how spawn-then-poll happens in real time.
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        tokio::time::advance(duration).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_fires_before_access_expiry() {
        let transport = Arc::new(FakeTransport::default());
        let controller = controller(Arc::clone(&transport));
        controller.start("initial-token".to_string());

        // 14 of 15 minutes: the silent refresh fires.
        advance(Duration::from_secs(14 * 60)).await;

        assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.access_token(), Some("token-1".to_string()));
        assert_eq!(controller.state(), SessionState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactivity_expires_session_and_cancels_refresh() {
        let transport = Arc::new(FakeTransport::default());
        // Long access TTL so the refresh timer is still pending when the
        // inactivity deadline lands.
        let config = ControllerConfig {
            access_ttl: Duration::from_secs(60 * 60),
            ..ControllerConfig::default()
        };
        let controller = SessionController::new(
            Arc::clone(&transport) as Arc<dyn AuthTransport>,
            Arc::new(TabBroadcast::new()),
            config,
        );
        controller.start("initial-token".to_string());

        // 30 minutes of silence.
        advance(Duration::from_secs(30 * 60)).await;
        assert_eq!(controller.state(), SessionState::Expired);
        assert_eq!(controller.access_token(), None);

        // The cancelled refresh timer never fires, even long after.
        advance(Duration::from_secs(90 * 60)).await;
        assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_postpones_expiry() {
        let transport = Arc::new(FakeTransport::default());
        let controller = controller(Arc::clone(&transport));
        controller.start("initial-token".to_string());

        advance(Duration::from_secs(20 * 60)).await;
        controller.notify_activity(ActivityKind::PointerMove);

        // 20 more minutes: 40 since login but only 20 since activity.
        advance(Duration::from_secs(20 * 60)).await;
        assert_eq!(controller.state(), SessionState::Active);

        // 11 more minutes with no input crosses the 30-minute window.
        advance(Duration::from_secs(11 * 60)).await;
        assert_eq!(controller.state(), SessionState::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_is_terminal() {
        let transport = Arc::new(FakeTransport::default());
        transport.fail_refresh.store(true, Ordering::SeqCst);
        let controller = controller(Arc::clone(&transport));
        controller.start("initial-token".to_string());

        advance(Duration::from_secs(14 * 60)).await;

        // One attempt, no retry, immediate logout.
        assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.state(), SessionState::SignedOut);
        assert_eq!(controller.access_token(), None);

        advance(Duration::from_secs(60 * 60)).await;
        assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_broadcast_reaches_other_tabs() {
        let transport = Arc::new(FakeTransport::default());
        let group = Arc::new(TabBroadcast::new());

        let tab_a = SessionController::new(
            Arc::clone(&transport) as Arc<dyn AuthTransport>,
            Arc::clone(&group) as Arc<dyn SessionBroadcast>,
            ControllerConfig::default(),
        );
        let tab_b = SessionController::new(
            Arc::clone(&transport) as Arc<dyn AuthTransport>,
            Arc::clone(&group) as Arc<dyn SessionBroadcast>,
            ControllerConfig::default(),
        );
        tab_a.start("token-a".to_string());
        tab_b.start("token-b".to_string());

        tab_a.logout().await;
        advance(Duration::from_millis(10)).await;

        assert_eq!(tab_a.state(), SessionState::SignedOut);
        assert_eq!(tab_b.state(), SessionState::SignedOut);
        assert_eq!(tab_b.access_token(), None);

        // Tab B's timers were cancelled on receipt: no refresh ever fires.
        advance(Duration::from_secs(60 * 60)).await;
        assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_login_cancels_stale_timers() {
        let transport = Arc::new(FakeTransport::default());
        let controller = controller(Arc::clone(&transport));

        controller.start("first".to_string());
        advance(Duration::from_secs(60)).await;
        controller.start("second".to_string());

        // Only the second session's refresh schedule is live: one call at
        // its own 14-minute mark, not two.
        advance(Duration::from_secs(14 * 60)).await;
        assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.state(), SessionState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_security_log_is_bounded_and_mirrored() {
        let transport = Arc::new(FakeTransport::default());
        let controller = controller(Arc::clone(&transport));

        for _ in 0..12 {
            controller.start("token".to_string());
        }
        advance(Duration::from_millis(10)).await;

        let events = controller.security_events();
        assert_eq!(events.len(), 10);
        assert!(events.iter().all(|e| e.kind == "login"));
        // Mirroring is best-effort but did happen for each push.
        assert_eq!(transport.mirrored.load(Ordering::SeqCst), 12);
    }
}
