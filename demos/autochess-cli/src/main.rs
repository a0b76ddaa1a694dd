//! Walks the three pages against a local identity store:
//!
//! ```text
//! cargo run -p autochess-cli -- [name] [character] [game-id]
//! ```
//!
//! `AUTOCHESS_DATA_DIR` picks where the identity file lives (default: the
//! system temp dir). `AUTOCHESS_OFFLINE=1` makes sign-in fail so the
//! offline fallback kicks in.

use std::path::PathBuf;

use autochess::prelude::*;
use rand::Rng;
use tokio::sync::broadcast;
use tracing::info;

// ---------------------------------------------------------------------------
// Development authenticator
// ---------------------------------------------------------------------------

/// Issues a fresh random uid on every sign-in, or refuses when offline.
struct DevAuth {
    offline: bool,
    events: broadcast::Sender<AuthEvent>,
}

impl DevAuth {
    fn new(offline: bool) -> Self {
        let (events, _) = broadcast::channel(8);
        Self { offline, events }
    }
}

impl AnonymousAuth for DevAuth {
    async fn sign_in_anonymously(&self) -> Result<RemoteUser, SessionError> {
        if self.offline {
            return Err(SessionError::AuthFailed("network unavailable".into()));
        }
        let uid = PlayerId::new(random_uid());
        let _ = self.events.send(AuthEvent::SignedIn(uid.clone()));
        Ok(RemoteUser { uid })
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

/// 128 random bits as 32 hex characters.
fn random_uid() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), AutochessError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let name = args.next().unwrap_or_else(|| "Player".to_string());
    let character = args.next().unwrap_or_else(|| "warrior".to_string());
    let game_id = args.next();

    let data_dir = std::env::var_os("AUTOCHESS_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);
    let offline = std::env::var("AUTOCHESS_OFFLINE").is_ok_and(|v| v == "1");
    info!(data_dir = %data_dir.display(), offline, "starting autochess client");

    let session = SessionManager::start(
        DevAuth::new(offline),
        FileStore::new(data_dir),
        SessionConfig::default(),
    )
    .await;

    if let Some(warning) = session.warning() {
        eprintln!("warning: {warning}");
    }
    let home = HomeFlow::new(&session);
    println!("status: {:?}", home.connection_status());

    let route = match game_id.as_deref() {
        Some(id) => home.join_game(&name, id)?,
        None => home.create_game(&name)?,
    };
    println!("→ {route}");

    let game_id = match route {
        Route::Select { game_id } => game_id,
        _ => None,
    };
    let mut select = CharacterSelect::new(&session, game_id);
    println!("{}", select.title());
    for choice in select.characters() {
        println!("  {} {:<8} {}", choice.icon, choice.id, choice.description);
    }
    select.choose(&character);
    let route = select.start_game()?;
    println!("→ {route}");

    let game_id = match route {
        Route::Game { game_id } => game_id,
        _ => None,
    };
    match GameView::open(&session, game_id) {
        GameView::Ready(view) => {
            println!("{} · turn {}", view.game_label, view.turn);
            println!(
                "{} the {}",
                view.player_name.as_deref().unwrap_or("Anonymous"),
                view.character.name
            );
            print!("{}", view.board);
            let hand: Vec<_> = view.cards.iter().map(|c| c.label()).collect();
            println!("cards: {}", hand.join(" | "));
        }
        GameView::Redirect(route) => println!("→ {route}"),
        GameView::Loading => println!("loading…"),
    }

    session.dispose().await;
    Ok(())
}
