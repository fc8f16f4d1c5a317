//! Session manager - drives the token lifecycle machine against a provider.

use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;

use session_state::{Session, SessionEvent, SessionPhase, StateMachine};

use crate::auth::provider::TokenProvider;
use crate::error::{Error, Result};

/// Owns the session state machine and runs refresh cycles against the
/// configured [`TokenProvider`].
///
/// At most one silent fetch is in flight at a time: a refresh arriving
/// while another is outstanding returns the current snapshot immediately
/// instead of queueing a second fetch.
pub struct SessionManager {
    provider: Arc<dyn TokenProvider>,
    machine: RwLock<StateMachine>,
    // Held across the provider call; try_lock is what coalesces
    // concurrent refreshes into the one in-flight fetch.
    fetch_guard: Mutex<()>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("machine", &self.machine)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            machine: RwLock::new(StateMachine::new()),
            fetch_guard: Mutex::new(()),
        }
    }

    /// Current session snapshot.
    pub fn session(&self) -> Session {
        self.machine
            .read()
            .expect("session machine lock")
            .session()
            .clone()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.machine.read().expect("session machine lock").phase()
    }

    /// Run one refresh cycle and return the resulting snapshot.
    ///
    /// Idempotent under repeated calls; a call that lands while a fetch is
    /// already in flight is a no-op returning the snapshot as it stands.
    /// A failed fetch demotes the session to unauthenticated; callers
    /// retry by calling this again, never the manager on its own.
    pub async fn refresh(&self) -> Session {
        let Ok(_guard) = self.fetch_guard.try_lock() else {
            log::debug!("Refresh ignored: a token fetch is already in flight");
            return self.session();
        };

        {
            let mut machine = self.machine.write().expect("session machine lock");
            // The machine starts out in `checking`; only a later cycle
            // needs the explicit trigger event.
            if !machine.phase().is_fetch_in_flight() {
                machine.handle_event(SessionEvent::Refresh);
            }
        }

        let outcome = self.provider.fetch_token_silently().await;

        let mut machine = self.machine.write().expect("session machine lock");
        match outcome {
            Ok(access_token) => machine.handle_event(SessionEvent::FetchSucceeded { access_token }),
            Err(err) => machine.handle_event(SessionEvent::FetchFailed {
                reason: err.to_string(),
            }),
        };
        machine.session().clone()
    }

    /// Bearer token for an outgoing request.
    pub fn bearer_token(&self) -> Result<String> {
        self.session().access_token.ok_or(Error::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use url::Url;

    /// Provider that counts fetches and can be made slow or failing.
    struct ScriptedProvider {
        calls: AtomicUsize,
        delay: Duration,
        result: std::result::Result<String, String>,
    }

    impl ScriptedProvider {
        fn ok(token: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                result: Ok(token.to_string()),
            }
        }

        fn slow_ok(token: &str, delay: Duration) -> Self {
            Self {
                delay,
                ..Self::ok(token)
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                result: Err(reason.to_string()),
            }
        }
    }

    #[async_trait]
    impl TokenProvider for ScriptedProvider {
        async fn fetch_token_silently(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.result.clone().map_err(Error::TokenFetch)
        }

        fn login_url(&self, return_to: &str) -> Result<Url> {
            Url::parse(return_to).map_err(|e| Error::TokenFetch(e.to_string()))
        }

        fn logout_url(&self, return_to: &str) -> Result<Url> {
            Url::parse(return_to).map_err(|e| Error::TokenFetch(e.to_string()))
        }
    }

    #[tokio::test]
    async fn refresh_populates_session() {
        let manager = SessionManager::new(Arc::new(ScriptedProvider::ok("tok")));
        assert_eq!(manager.phase(), SessionPhase::Checking);

        let session = manager.refresh().await;
        assert!(session.is_authenticated);
        assert!(session.is_loaded);
        assert_eq!(manager.phase(), SessionPhase::Idle);
        assert_eq!(manager.bearer_token().expect("token"), "tok");
    }

    #[tokio::test]
    async fn failed_refresh_demotes_to_unauthenticated() {
        let manager = SessionManager::new(Arc::new(ScriptedProvider::failing("login required")));

        let session = manager.refresh().await;
        assert!(session.is_loaded);
        assert!(!session.is_authenticated);
        assert!(matches!(
            manager.bearer_token(),
            Err(Error::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn concurrent_refreshes_share_one_fetch() {
        let provider = Arc::new(ScriptedProvider::slow_ok(
            "tok",
            Duration::from_millis(50),
        ));
        let manager = SessionManager::new(Arc::clone(&provider) as Arc<_>);

        // join! polls all three on one thread: the first acquires the fetch
        // guard and suspends in the provider, the other two coalesce.
        let (a, b, c) = tokio::join!(manager.refresh(), manager.refresh(), manager.refresh());

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(a.is_authenticated);
        // The coalesced calls returned whatever snapshot existed at the
        // time; they must not have triggered a second fetch.
        let _ = (b, c);
    }

    #[tokio::test]
    async fn sequential_refreshes_fetch_each_time() {
        let provider = Arc::new(ScriptedProvider::ok("tok"));
        let manager = SessionManager::new(Arc::clone(&provider) as Arc<_>);

        manager.refresh().await;
        manager.refresh().await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }
}
