//! Bearer-token session shared by every clone of an [`ApiClient`](crate::ApiClient)

use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tokens {
    access: Option<String>,
    refresh: Option<String>,
}

/// Access and refresh tokens for one signed-in user
///
/// Held behind an `Arc` by the client, so a refresh performed by one request
/// is seen by all others.
#[derive(Debug, Default)]
pub struct Session {
    tokens: RwLock<Tokens>,
}

impl Session {
    /// Create a session from an optional access and refresh token
    #[must_use]
    pub fn new(access: Option<String>, refresh: Option<String>) -> Self {
        Self {
            tokens: RwLock::new(Tokens { access, refresh }),
        }
    }

    /// Current access token
    pub async fn access_token(&self) -> Option<String> {
        self.tokens.read().await.access.clone()
    }

    /// Current refresh token
    pub async fn refresh_token(&self) -> Option<String> {
        self.tokens.read().await.refresh.clone()
    }

    /// Store tokens returned by the refresh endpoint
    ///
    /// The refresh token is only replaced when the backend rotated it.
    pub async fn update(&self, access: String, refresh: Option<String>) {
        let mut tokens = self.tokens.write().await;
        tokens.access = Some(access);
        if refresh.is_some() {
            tokens.refresh = refresh;
        }
    }

    /// Forget both tokens
    pub async fn clear(&self) {
        let mut tokens = self.tokens.write().await;
        tokens.access = None;
        tokens.refresh = None;
    }
}
