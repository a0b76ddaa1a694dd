//! Integration tests for the page flows running over a real session.

use std::sync::Arc;

use autochess::prelude::*;
use tokio::sync::broadcast;

// =========================================================================
// Mock authenticator
// =========================================================================

/// Issues a fixed uid, or fails when `uid` is `None`.
struct TestAuth {
    uid: Option<&'static str>,
    events: broadcast::Sender<AuthEvent>,
}

impl TestAuth {
    fn online() -> Self {
        let (events, _) = broadcast::channel(4);
        Self {
            uid: Some("uid-1"),
            events,
        }
    }

    fn offline() -> Self {
        let (events, _) = broadcast::channel(4);
        Self { uid: None, events }
    }
}

impl AnonymousAuth for TestAuth {
    async fn sign_in_anonymously(&self) -> Result<RemoteUser, SessionError> {
        self.uid
            .map(|uid| RemoteUser {
                uid: PlayerId::new(uid),
            })
            .ok_or_else(|| SessionError::AuthFailed("offline".into()))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

// =========================================================================
// Helpers
// =========================================================================

type TestSession = SessionManager<TestAuth, Arc<MemoryStore>>;

async fn ready_session(auth: TestAuth) -> (TestSession, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let session = SessionManager::start(auth, Arc::clone(&store), SessionConfig::default()).await;
    (session, store)
}

fn unbooted_session() -> TestSession {
    SessionManager::new(
        TestAuth::online(),
        Arc::new(MemoryStore::new()),
        SessionConfig::default(),
    )
}

// =========================================================================
// Home
// =========================================================================

#[tokio::test]
async fn test_home_before_bootstrap_is_disabled() {
    let session = unbooted_session();
    let home = HomeFlow::new(&session);

    assert!(!home.is_enabled());
    assert_eq!(home.create_game("Ada"), Err(FlowError::NotReady));
    assert_eq!(home.join_game("Ada", "r1"), Err(FlowError::NotReady));
}

#[tokio::test]
async fn test_home_create_game_saves_name_and_routes_to_select() {
    let (session, _) = ready_session(TestAuth::online()).await;
    let home = HomeFlow::new(&session);

    let route = home.create_game("Ada").expect("valid input");

    assert_eq!(route, Route::Select { game_id: None });
    assert_eq!(session.identity().unwrap().name(), Some("Ada"));
    assert_eq!(HomeFlow::new(&session).initial_name(), "Ada");
}

#[tokio::test]
async fn test_home_blank_inputs_are_rejected() {
    let (session, _) = ready_session(TestAuth::online()).await;
    let home = HomeFlow::new(&session);

    assert_eq!(home.create_game("   "), Err(FlowError::MissingName));
    assert_eq!(home.join_game("", "r1"), Err(FlowError::MissingName));
    assert_eq!(home.join_game("Ada", "  "), Err(FlowError::MissingGameId));
    // Nothing was saved by the failed attempts.
    assert_eq!(session.identity().unwrap().name(), None);
}

#[tokio::test]
async fn test_home_join_game_remembers_game_id() {
    let (session, _) = ready_session(TestAuth::online()).await;
    let home = HomeFlow::new(&session);

    let route = home.join_game("Ada", " room-42 ").expect("valid input");

    let game_id = GameId::new("room-42");
    assert_eq!(
        route,
        Route::Select {
            game_id: Some(game_id.clone())
        }
    );
    assert_eq!(session.current_game(), Some(game_id));
}

#[tokio::test]
async fn test_home_reports_offline_status_for_fallback_identity() {
    let (online, _) = ready_session(TestAuth::online()).await;
    let (offline, _) = ready_session(TestAuth::offline()).await;

    assert_eq!(HomeFlow::new(&online).connection_status(), ConnectionStatus::Online);
    assert_eq!(HomeFlow::new(&offline).connection_status(), ConnectionStatus::Offline);
    assert!(offline.warning().is_some());
}

// =========================================================================
// Character select
// =========================================================================

#[tokio::test]
async fn test_select_start_without_choice_is_rejected() {
    let (session, _) = ready_session(TestAuth::online()).await;
    let select = CharacterSelect::new(&session, None);

    assert!(!select.can_start());
    assert_eq!(select.start_game(), Err(FlowError::NoCharacterSelected));
}

#[tokio::test]
async fn test_select_unknown_character_is_rejected() {
    let (session, _) = ready_session(TestAuth::online()).await;
    let mut select = CharacterSelect::new(&session, None);

    select.choose("necromancer");

    assert_eq!(
        select.start_game(),
        Err(FlowError::UnknownCharacter("necromancer".into()))
    );
    assert!(session.identity().unwrap().character().is_none());
}

#[tokio::test]
async fn test_select_start_game_persists_character_and_routes_to_game() {
    let (session, store) = ready_session(TestAuth::online()).await;
    let game_id = Some(GameId::new("room-9"));
    let mut select = CharacterSelect::new(&session, game_id.clone());
    assert_eq!(select.title(), "Join game");
    assert_eq!(select.characters().len(), 4);

    select.choose("mage");
    let route = select.start_game().expect("mage exists");

    assert_eq!(route, Route::Game { game_id });
    assert_eq!(session.identity().unwrap().character().unwrap().id, "mage");
    assert!(
        store
            .get("gameUser")
            .is_some_and(|bytes| String::from_utf8_lossy(&bytes).contains("\"mage\""))
    );
}

#[tokio::test]
async fn test_select_highlights_previous_choice() {
    let (session, _) = ready_session(TestAuth::online()).await;
    session.select_character(find_character("healer").unwrap());

    let select = CharacterSelect::new(&session, None);

    assert_eq!(select.highlighted(), Some("healer"));
    assert_eq!(select.title(), "Choose your character");
}

// =========================================================================
// Game board
// =========================================================================

#[tokio::test]
async fn test_game_view_before_bootstrap_is_loading() {
    let session = unbooted_session();

    assert_eq!(GameView::open(&session, None), GameView::Loading);
}

#[tokio::test]
async fn test_game_view_without_character_redirects_to_select() {
    let (session, _) = ready_session(TestAuth::online()).await;
    let game_id = Some(GameId::new("room-1"));

    let view = GameView::open(&session, game_id.clone());

    assert_eq!(view, GameView::Redirect(Route::Select { game_id }));
}

#[tokio::test]
async fn test_game_view_after_sign_out_redirects_home() {
    let auth = TestAuth::online();
    let events = auth.events.clone();
    let (session, _) = ready_session(auth).await;

    events.send(AuthEvent::SignedOut).unwrap();
    for _ in 0..10 {
        if session.identity().is_none() {
            break;
        }
        tokio::task::yield_now().await;
    }

    assert_eq!(GameView::open(&session, None), GameView::Redirect(Route::Home));
}

#[tokio::test]
async fn test_full_flow_home_select_board() {
    let (session, _) = ready_session(TestAuth::online()).await;

    let route = HomeFlow::new(&session).create_game("Ada").unwrap();
    let Route::Select { game_id } = route else {
        panic!("create_game routes to select");
    };
    let mut select = CharacterSelect::new(&session, game_id);
    select.choose("warrior");
    let Route::Game { game_id } = select.start_game().unwrap() else {
        panic!("start_game routes to the board");
    };

    let GameView::Ready(view) = GameView::open(&session, game_id) else {
        panic!("player has a character");
    };
    assert_eq!(view.game_label, "New game");
    assert_eq!(view.turn, 1);
    assert_eq!(view.player_name.as_deref(), Some("Ada"));
    assert_eq!(view.character.id, "warrior");
    assert_eq!(view.board.cell(0, 0).unwrap().token.as_deref(), Some("⚔️"));
    assert_eq!(view.board.cell(0, 0).unwrap().shade, Shade::Light);
    assert_eq!(view.cards, Card::HAND);

    session.reset_game();
    assert!(session.pending_character().is_none());
    // The persisted character survives a reset.
    assert!(matches!(GameView::open(&session, None), GameView::Ready(_)));
}
