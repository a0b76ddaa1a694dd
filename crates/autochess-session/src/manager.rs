//! The session manager: owns the one active player identity.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Running the bootstrap chain exactly once per application start
//! - Exposing the active identity and the "bootstrap complete" flag
//! - Applying player edits (name, character) and re-persisting them
//! - Clearing the identity when the remote service reports sign-out
//!
//! # Concurrency note
//!
//! The identity lives in a `std::sync::Mutex` shared with the sign-out
//! listener task. Every critical section is short and synchronous (a
//! field update plus one storage write), so the lock is never held across
//! an `.await`. A sign-out racing a mutation resolves as last-write-wins.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use autochess_protocol::{
    CharacterChoice, Codec, GameId, JsonCodec, PlayerIdentity,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::bootstrap::{auth_warning, now_millis, persist_or_warn};
use crate::listener::SignOutListener;
use crate::store::persist_identity;
use crate::{
    AnonymousAuth, BootstrapContext, BootstrapOutcome, IdentitySource,
    IdentityStore, SessionConfig, SessionState,
};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// The part of the session that the sign-out listener also touches.
pub(crate) struct Shared<S, C> {
    state: Mutex<SessionState>,
    store: S,
    codec: C,
    storage_key: String,
}

impl<S: IdentityStore, C: Codec> Shared<S, C> {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes `identity` to storage. A failed write is logged and
    /// swallowed; the in-memory identity stays authoritative.
    fn persist(&self, identity: &PlayerIdentity) {
        if let Err(e) =
            persist_identity(&self.store, &self.codec, &self.storage_key, identity)
        {
            warn!(player_id = %identity.id(), error = %e, "failed to persist identity");
        }
    }

    /// Applies a remote sign-out.
    ///
    /// Returns `true` if an identity was cleared. Offline fallback
    /// identities have nothing to sign out of and are left untouched.
    pub(crate) fn handle_sign_out(&self) -> bool {
        let mut state = self.lock();

        let player_id = match &state.identity {
            Some(identity) if !identity.is_offline() => identity.id().clone(),
            Some(identity) => {
                debug!(player_id = %identity.id(), "sign-out ignored for offline identity");
                return false;
            }
            None => return false,
        };

        state.identity = None;
        if let Err(e) = self.store.remove(&self.storage_key) {
            warn!(%player_id, error = %e, "failed to erase stored identity");
        }
        info!(%player_id, "player signed out, identity cleared");
        true
    }
}

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

/// Owns the player identity for one run of the application.
///
/// The manager is an ordinary value: construct one per application (or
/// per test) and hand consumers a reference. There is no global.
///
/// ## Lifecycle
///
/// ```text
/// new() ──→ listen_for_sign_out() ──→ bootstrap() ──→ [ready]
///                                                       │
///             update_name() / select_character() ◀─────┤
///             sign-out event ──→ identity cleared ◀─────┤
///                                                       ▼
///                                                   dispose()
/// ```
///
/// [`SessionManager::start`] does the first three steps in one call.
pub struct SessionManager<A, S, C = JsonCodec>
where
    A: AnonymousAuth,
    S: IdentityStore,
    C: Codec,
{
    shared: Arc<Shared<S, C>>,
    auth: A,
    config: SessionConfig,

    /// Serializes concurrent `bootstrap()` calls so the chain runs once.
    bootstrap_lock: tokio::sync::Mutex<()>,

    /// Flips to `true` once bootstrap has finished. Awaited by
    /// `wait_ready`.
    ready: watch::Sender<bool>,

    listener: Option<SignOutListener>,
}

impl<A, S> SessionManager<A, S, JsonCodec>
where
    A: AnonymousAuth,
    S: IdentityStore,
{
    /// Creates a manager that stores identities as JSON.
    ///
    /// Nothing happens until [`bootstrap`](Self::bootstrap) is called.
    pub fn new(auth: A, store: S, config: SessionConfig) -> Self {
        Self::with_codec(auth, store, JsonCodec, config)
    }

    /// Creates a manager, starts the sign-out listener, and runs
    /// bootstrap. Must be called from within a Tokio runtime.
    pub async fn start(auth: A, store: S, config: SessionConfig) -> Self {
        let mut manager = Self::new(auth, store, config);
        manager.listen_for_sign_out();
        manager.bootstrap().await;
        manager
    }
}

impl<A, S, C> SessionManager<A, S, C>
where
    A: AnonymousAuth,
    S: IdentityStore,
    C: Codec,
{
    /// Creates a manager with a custom record codec.
    pub fn with_codec(auth: A, store: S, codec: C, config: SessionConfig) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::default()),
                store,
                codec,
                storage_key: config.storage_key.clone(),
            }),
            auth,
            config,
            bootstrap_lock: tokio::sync::Mutex::new(()),
            ready,
            listener: None,
        }
    }

    // =====================================================================
    // Startup and teardown
    // =====================================================================

    /// Registers for sign-out notifications from the auth service.
    ///
    /// Only the first call has an effect. Must be called from within a
    /// Tokio runtime.
    pub fn listen_for_sign_out(&mut self) {
        if self.listener.is_some() {
            return;
        }
        let events = self.auth.subscribe();
        self.listener = Some(SignOutListener::spawn(Arc::clone(&self.shared), events));
        debug!("sign-out listener registered");
    }

    /// Establishes the active identity by walking the bootstrap chain.
    ///
    /// Runs at most once: later (or concurrent) calls wait for the first
    /// one and then just return the current identity. Never fails; if
    /// every configured source fails, an offline identity is synthesized
    /// anyway.
    pub async fn bootstrap(&self) -> Option<PlayerIdentity> {
        let _guard = self.bootstrap_lock.lock().await;
        if self.is_ready() {
            return self.identity();
        }

        let ctx = BootstrapContext {
            auth: &self.auth,
            store: &self.shared.store,
            codec: &self.shared.codec,
            storage_key: &self.config.storage_key,
            auth_timeout: self.config.auth_timeout,
        };

        let (identity, source, warning) = match self.config.chain.run(&ctx).await {
            BootstrapOutcome::Resolved(resolution) => {
                (resolution.identity, resolution.source, resolution.warning)
            }
            BootstrapOutcome::Exhausted { failures } => {
                warn!(
                    attempts = failures.len(),
                    "every identity source failed, falling back to offline identity"
                );
                let identity = PlayerIdentity::offline_fallback(now_millis());
                persist_or_warn(&ctx, &identity);
                (identity, IdentitySource::Offline, auth_warning(&failures))
            }
        };

        {
            let mut state = self.shared.lock();
            state.identity = Some(identity.clone());
            state.source = Some(source);
            state.warning = warning;
        }
        self.ready.send_replace(true);

        Some(identity)
    }

    /// Stops the sign-out listener and waits for it to exit.
    ///
    /// After this returns no sign-out event can touch the session's state
    /// or storage.
    pub async fn dispose(mut self) {
        if let Some(listener) = self.listener.take() {
            listener.shutdown().await;
        }
    }

    // =====================================================================
    // Readers
    // =====================================================================

    /// `true` once bootstrap has completed. Identity-dependent actions
    /// should stay disabled until then.
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// `true` while bootstrap has not completed.
    pub fn loading(&self) -> bool {
        !self.is_ready()
    }

    /// Resolves once bootstrap has completed.
    pub async fn wait_ready(&self) {
        let mut rx = self.ready.subscribe();
        // The sender lives in `self`, so the channel can't close while
        // we're borrowing it.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    pub fn identity(&self) -> Option<PlayerIdentity> {
        self.shared.lock().identity.clone()
    }

    /// Which source produced the current identity.
    pub fn source(&self) -> Option<IdentitySource> {
        self.shared.lock().source
    }

    /// The soft auth warning, if remote sign-in failed during bootstrap.
    pub fn warning(&self) -> Option<String> {
        self.shared.lock().warning.clone()
    }

    /// `true` if the active identity is the offline fallback. Callers use
    /// this to disable server-dependent actions.
    pub fn is_offline(&self) -> bool {
        self.shared
            .lock()
            .identity
            .as_ref()
            .is_some_and(PlayerIdentity::is_offline)
    }

    pub fn pending_character(&self) -> Option<CharacterChoice> {
        self.shared.lock().pending_character.clone()
    }

    pub fn current_game(&self) -> Option<GameId> {
        self.shared.lock().current_game.clone()
    }

    /// A copy of the whole in-memory state.
    pub fn snapshot(&self) -> SessionState {
        self.shared.lock().clone()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // =====================================================================
    // Mutations
    // =====================================================================

    /// Sets the player's display name and re-persists the full record.
    ///
    /// Returns the updated identity, or `None` (doing nothing) if there
    /// is no active identity.
    pub fn update_name(&self, name: impl Into<String>) -> Option<PlayerIdentity> {
        let mut state = self.shared.lock();
        let updated = state.identity.clone()?.with_name(name);

        self.shared.persist(&updated);
        state.identity = Some(updated.clone());

        info!(player_id = %updated.id(), "player name updated");
        Some(updated)
    }

    /// Records `choice` as the pending selection and, if there is an
    /// active identity, merges it in and re-persists.
    ///
    /// Returns the updated identity, or `None` if there was no identity.
    /// Without an identity nothing is written to storage.
    pub fn select_character(&self, choice: CharacterChoice) -> Option<PlayerIdentity> {
        let mut state = self.shared.lock();
        state.pending_character = Some(choice.clone());

        let updated = state.identity.clone()?.with_character(choice);

        self.shared.persist(&updated);
        state.identity = Some(updated.clone());

        info!(
            player_id = %updated.id(),
            character = ?updated.character().map(|c| &c.id),
            "character selected"
        );
        Some(updated)
    }

    /// Remembers the game the player is creating or joining.
    pub fn set_current_game(&self, game_id: GameId) {
        self.shared.lock().current_game = Some(game_id);
    }

    /// Forgets the current game and the pending character. The persisted
    /// identity is not touched.
    pub fn reset_game(&self) {
        let mut state = self.shared.lock();
        state.current_game = None;
        state.pending_character = None;
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionManager`.
    //!
    //! Naming convention: `test_{function}_{scenario}_{expected}`.
    //!
    //! The remote service is a scripted fake: it either issues a fixed
    //! uid or fails, and counts how often it was asked. Sign-out events
    //! are pushed through its broadcast sender.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use autochess_protocol::{PlayerId, find_character};
    use tokio::sync::broadcast;

    use super::*;
    use crate::{AuthEvent, MemoryStore, RemoteUser, SessionError};

    // -- Helpers ----------------------------------------------------------

    struct FakeAuth {
        uid: Option<&'static str>,
        calls: AtomicUsize,
        events: broadcast::Sender<AuthEvent>,
    }

    impl FakeAuth {
        fn issuing(uid: &'static str) -> Self {
            let (events, _) = broadcast::channel(8);
            Self {
                uid: Some(uid),
                calls: AtomicUsize::new(0),
                events,
            }
        }

        fn failing() -> Self {
            let (events, _) = broadcast::channel(8);
            Self {
                uid: None,
                calls: AtomicUsize::new(0),
                events,
            }
        }
    }

    impl AnonymousAuth for FakeAuth {
        async fn sign_in_anonymously(&self) -> Result<RemoteUser, SessionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.uid {
                Some(uid) => Ok(RemoteUser {
                    uid: PlayerId::new(uid),
                }),
                None => Err(SessionError::AuthFailed("network unreachable".into())),
            }
        }

        fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
            self.events.subscribe()
        }
    }

    fn manager(
        auth: FakeAuth,
        store: Arc<MemoryStore>,
    ) -> SessionManager<FakeAuth, Arc<MemoryStore>> {
        SessionManager::new(auth, store, SessionConfig::default())
    }

    fn stored(store: &MemoryStore) -> Option<PlayerIdentity> {
        store
            .get("gameUser")
            .map(|bytes| JsonCodec.decode_identity(&bytes).expect("stored record is valid"))
    }

    // =====================================================================
    // bootstrap()
    // =====================================================================

    #[tokio::test]
    async fn test_bootstrap_before_call_is_not_ready() {
        let mgr = manager(FakeAuth::issuing("abc"), Arc::new(MemoryStore::new()));

        assert!(!mgr.is_ready());
        assert!(mgr.loading());
        assert!(mgr.identity().is_none());
    }

    #[tokio::test]
    async fn test_bootstrap_runs_chain_only_once() {
        let store = Arc::new(MemoryStore::new());
        let mgr = manager(FakeAuth::issuing("abc"), Arc::clone(&store));

        let first = mgr.bootstrap().await;
        let second = mgr.bootstrap().await;

        assert_eq!(first, second);
        assert_eq!(mgr.auth.calls.load(Ordering::SeqCst), 1);
        assert_eq!(mgr.source(), Some(IdentitySource::Remote));
    }

    #[tokio::test]
    async fn test_bootstrap_exhausted_chain_still_yields_offline_identity() {
        let chain = crate::BootstrapChain::new(vec![
            IdentitySource::Stored,
            IdentitySource::Remote,
        ])
        .unwrap();
        let store = Arc::new(MemoryStore::new());
        let mgr = SessionManager::new(
            FakeAuth::failing(),
            Arc::clone(&store),
            SessionConfig::default().with_chain(chain),
        );

        let identity = mgr.bootstrap().await.expect("bootstrap always yields an identity");

        assert!(identity.is_offline());
        assert!(mgr.is_ready());
        assert!(mgr.warning().is_some());
        assert_eq!(stored(&store), Some(identity));
    }

    #[tokio::test]
    async fn test_wait_ready_resolves_after_bootstrap() {
        let mgr = manager(FakeAuth::issuing("abc"), Arc::new(MemoryStore::new()));

        let (_, identity) = tokio::join!(mgr.wait_ready(), mgr.bootstrap());

        assert!(mgr.is_ready());
        assert!(identity.is_some());
    }

    // =====================================================================
    // update_name()
    // =====================================================================

    #[tokio::test]
    async fn test_update_name_without_identity_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let mgr = manager(FakeAuth::issuing("abc"), Arc::clone(&store));

        assert_eq!(mgr.update_name("Ada"), None);
        assert_eq!(store.get("gameUser"), None);
    }

    #[tokio::test]
    async fn test_update_name_persists_full_record() {
        let store = Arc::new(MemoryStore::new());
        let mgr = manager(FakeAuth::issuing("abc"), Arc::clone(&store));
        mgr.bootstrap().await;

        let updated = mgr.update_name("Ada").expect("identity exists");

        assert_eq!(updated.name(), Some("Ada"));
        assert_eq!(updated.id().as_str(), "abc");
        assert_eq!(stored(&store), Some(updated));
    }

    // =====================================================================
    // select_character() / reset_game()
    // =====================================================================

    #[tokio::test]
    async fn test_select_character_without_identity_sets_pending_only() {
        let store = Arc::new(MemoryStore::new());
        let mgr = manager(FakeAuth::issuing("abc"), Arc::clone(&store));
        let mage = find_character("mage").unwrap();

        let result = mgr.select_character(mage.clone());

        assert_eq!(result, None);
        assert_eq!(mgr.pending_character(), Some(mage));
        assert_eq!(store.get("gameUser"), None);
    }

    #[tokio::test]
    async fn test_select_character_with_identity_merges_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let mgr = manager(FakeAuth::issuing("abc"), Arc::clone(&store));
        mgr.bootstrap().await;
        let archer = find_character("archer").unwrap();

        let updated = mgr.select_character(archer.clone()).expect("identity exists");

        assert_eq!(updated.character(), Some(&archer));
        assert_eq!(mgr.pending_character(), Some(archer));
        assert_eq!(stored(&store), Some(updated));
    }

    #[tokio::test]
    async fn test_reset_game_clears_session_local_state_only() {
        let store = Arc::new(MemoryStore::new());
        let mgr = manager(FakeAuth::issuing("abc"), Arc::clone(&store));
        mgr.bootstrap().await;
        mgr.set_current_game(GameId::new("room-1"));
        let persisted = mgr.select_character(find_character("healer").unwrap());

        mgr.reset_game();

        assert_eq!(mgr.current_game(), None);
        assert_eq!(mgr.pending_character(), None);
        assert_eq!(mgr.identity(), persisted);
        assert_eq!(stored(&store), persisted);
    }

    // =====================================================================
    // handle_sign_out()
    // =====================================================================

    #[tokio::test]
    async fn test_handle_sign_out_online_identity_clears_memory_and_storage() {
        let store = Arc::new(MemoryStore::new());
        let mgr = manager(FakeAuth::issuing("abc"), Arc::clone(&store));
        mgr.bootstrap().await;

        assert!(mgr.shared.handle_sign_out());

        assert!(mgr.identity().is_none());
        assert_eq!(store.get("gameUser"), None);
        // Mutations are now no-ops.
        assert_eq!(mgr.update_name("Ada"), None);
    }

    #[tokio::test]
    async fn test_handle_sign_out_offline_identity_is_untouched() {
        let store = Arc::new(MemoryStore::new());
        let mgr = manager(FakeAuth::failing(), Arc::clone(&store));
        let identity = mgr.bootstrap().await;

        assert!(!mgr.shared.handle_sign_out());

        assert_eq!(mgr.identity(), identity);
        assert_eq!(stored(&store), identity);
    }

    #[tokio::test]
    async fn test_handle_sign_out_without_identity_returns_false() {
        let mgr = manager(FakeAuth::issuing("abc"), Arc::new(MemoryStore::new()));

        assert!(!mgr.shared.handle_sign_out());
    }

    // =====================================================================
    // Listener lifecycle
    // =====================================================================

    #[tokio::test]
    async fn test_dispose_stops_listener_before_returning() {
        let store = Arc::new(MemoryStore::new());
        let auth = FakeAuth::issuing("abc");
        let events = auth.events.clone();
        let mgr = SessionManager::start(auth, Arc::clone(&store), SessionConfig::default()).await;

        mgr.dispose().await;

        // With the listener gone there is no subscriber left.
        assert_eq!(events.receiver_count(), 0);
        assert!(events.send(AuthEvent::SignedOut).is_err());
        assert!(store.get("gameUser").is_some());
    }

    #[tokio::test]
    async fn test_listen_for_sign_out_registers_once() {
        let auth = FakeAuth::issuing("abc");
        let events = auth.events.clone();
        let mut mgr = manager(auth, Arc::new(MemoryStore::new()));

        mgr.listen_for_sign_out();
        mgr.listen_for_sign_out();

        assert_eq!(events.receiver_count(), 1);
        mgr.dispose().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_listener_clears_identity_on_sign_out_event() {
        let store = Arc::new(MemoryStore::new());
        let auth = FakeAuth::issuing("abc");
        let events = auth.events.clone();
        let mgr = SessionManager::start(auth, Arc::clone(&store), SessionConfig::default()).await;

        events.send(AuthEvent::SignedOut).expect("listener is subscribed");

        // Let the listener task run.
        for _ in 0..10 {
            if mgr.identity().is_none() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert!(mgr.identity().is_none());
        assert_eq!(store.get("gameUser"), None);
        mgr.dispose().await;
    }
}
