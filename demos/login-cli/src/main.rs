//! Walks the whole session lifecycle in a terminal: start a provider,
//! apply a login whose token expires a few seconds out, watch the
//! scheduler force the logout.
//!
//! Run with logging to see the internals:
//!
//! ```text
//! RUST_LOG=debug cargo run -p login-cli
//! ```

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use tokio::sync::Notify;
use tracing::info;

use healthsight::{LoginResponse, Navigator, SessionProvider, UserProfile, apply_login};
use healthsight_storage::CredentialVault;

/// "Router" that just announces the redirect and wakes `main`.
struct PrintlnNavigator {
    done: Arc<Notify>,
}

impl Navigator for PrintlnNavigator {
    fn to_login(&self) {
        println!(">> navigating to /login");
        self.done.notify_one();
    }
}

/// Fabricates an unsigned token carrying the given `exp` claim —
/// enough for the client side, which never checks signatures.
fn demo_token(expires_at_secs: i64) -> String {
    let header = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
    let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .encode(format!(r#"{{"exp":{expires_at_secs}}}"#).as_bytes());
    format!("{header}.{payload}.demo")
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let done = Arc::new(Notify::new());
    let vault = Arc::new(CredentialVault::in_memory());
    let navigator = Arc::new(PrintlnNavigator { done: done.clone() });

    let provider = SessionProvider::start(vault, navigator, None);

    provider.store().subscribe(|state| {
        println!(
            "-- session changed: authenticated={} remember={} expires_at={:?}",
            state.is_authenticated(),
            state.remember,
            state.expires_at
        );
    });

    let now_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after 1970")
        .as_secs() as i64;

    info!("logging in with a token that expires in 3 seconds");
    apply_login(
        provider.store(),
        provider.vault(),
        LoginResponse {
            access_token: demo_token(now_secs + 3),
            token_type: Some("Bearer".to_string()),
            expires_in: None, // let the token payload decide
            user: Some(UserProfile {
                full_name: Some("Demo User".to_string()),
                email: Some("demo@healthsight.example".to_string()),
                ..UserProfile::default()
            }),
        },
        true,
    )
    .expect("demo login response carries a token");

    println!("waiting for the expiry scheduler to force the logout...");
    done.notified().await;

    println!(
        "remember preference survived the forced logout: {}",
        provider.vault().load_remember()
    );
    provider.shutdown();
}
