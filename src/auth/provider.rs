//! Token provider
//!
//! Keeps one token slot per client. The slot is either empty, waiting on a
//! single in-flight acquisition that every caller shares, or holding resolved
//! tokens. Transitions made after awaiting the acquisition are checked against
//! a generation counter so a stale completion never overwrites tokens that
//! were set, invalidated or reset in the meantime. The stored refresh token
//! is updated under the same check.

use super::grants;
use super::types::{FetchContext, Grant, TokenFetcher, TokenState};
use crate::config::ClientSettings;
use crate::error::{Error, Result};
use crate::http::Transport;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

type PendingTokens = Shared<BoxFuture<'static, Acquisition>>;

/// Outcome of one acquisition, shared by every caller waiting on it
#[derive(Clone)]
struct Acquisition {
    outcome: std::result::Result<TokenState, Arc<Error>>,
    refresh: RefreshUpdate,
}

/// What the acquisition means for the stored refresh token
#[derive(Clone, Debug, PartialEq, Eq)]
enum RefreshUpdate {
    Keep,
    Store(String),
    /// The token endpoint rejected this refresh token
    Forget(String),
}

enum TokenSlot {
    Empty,
    Pending(PendingTokens),
    Resolved(TokenState),
}

struct SlotState {
    slot: TokenSlot,
    generation: u64,
}

impl SlotState {
    fn replace(&mut self, slot: TokenSlot) {
        self.generation = self.generation.wrapping_add(1);
        self.slot = slot;
    }
}

/// Obtains, caches and invalidates the tokens of one client
pub struct TokenProvider {
    grant: Option<Grant>,
    transport: Arc<dyn Transport>,
    settings: Arc<RwLock<ClientSettings>>,
    state: Mutex<SlotState>,
}

impl TokenProvider {
    /// Create a provider with an empty token slot.
    ///
    /// `grant` may be `None` when the settings carry JWT material; acquiring
    /// without either fails with a missing setting error.
    pub fn new(
        grant: Option<Grant>,
        transport: Arc<dyn Transport>,
        settings: Arc<RwLock<ClientSettings>>,
    ) -> Self {
        Self {
            grant,
            transport,
            settings,
            state: Mutex::new(SlotState {
                slot: TokenSlot::Empty,
                generation: 0,
            }),
        }
    }

    /// Current tokens, acquiring them if nothing is cached.
    ///
    /// Concurrent callers share one acquisition. A failed acquisition empties
    /// the slot so the next call starts over.
    pub async fn get_tokens(&self) -> Result<TokenState> {
        let (pending, generation) = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            match &state.slot {
                TokenSlot::Resolved(tokens) => {
                    debug!("Using cached access token");
                    return Ok(tokens.clone());
                }
                TokenSlot::Pending(pending) => {
                    debug!("Joining in-flight token acquisition");
                    (pending.clone(), state.generation)
                }
                TokenSlot::Empty => {
                    let pending = self.acquire().shared();
                    state.replace(TokenSlot::Pending(pending.clone()));
                    (pending, state.generation)
                }
            }
        };

        let Acquisition { outcome, refresh } = pending.await;

        let mut state = self.state.lock().await;
        if state.generation == generation && matches!(state.slot, TokenSlot::Pending(_)) {
            self.apply_refresh_update(refresh).await;
            state.slot = match &outcome {
                Ok(tokens) => TokenSlot::Resolved(tokens.clone()),
                Err(_) => TokenSlot::Empty,
            };
        }
        outcome.map_err(Error::TokenAcquisition)
    }

    /// Pre-populate the slot with tokens obtained elsewhere
    pub async fn set_tokens(&self, tokens: TokenState) -> Result<()> {
        if tokens.access_token.is_empty() {
            return Err(Error::invalid_token_response("access_token must not be empty"));
        }
        if let Some(refresh_token) = &tokens.refresh_token {
            self.settings.write().await.refresh_token = Some(refresh_token.clone());
        }
        self.state.lock().await.replace(TokenSlot::Resolved(tokens));
        Ok(())
    }

    /// Empty the slot if it still holds `stale_access_token`.
    ///
    /// Returns false when the slot already moved on (another request refreshed
    /// first, or an acquisition is in flight).
    pub async fn invalidate(&self, stale_access_token: &str) -> bool {
        let mut state = self.state.lock().await;
        let is_stale = matches!(
            &state.slot,
            TokenSlot::Resolved(tokens) if tokens.access_token == stale_access_token
        );
        if is_stale {
            state.replace(TokenSlot::Empty);
        }
        is_stale
    }

    /// Drop whatever the slot holds, including an in-flight acquisition
    pub async fn reset(&self) {
        self.state.lock().await.replace(TokenSlot::Empty);
    }

    /// Resolved tokens, without triggering an acquisition
    pub async fn cached(&self) -> Option<TokenState> {
        match &self.state.lock().await.slot {
            TokenSlot::Resolved(tokens) => Some(tokens.clone()),
            TokenSlot::Empty | TokenSlot::Pending(_) => None,
        }
    }

    async fn apply_refresh_update(&self, update: RefreshUpdate) {
        match update {
            RefreshUpdate::Keep => {}
            RefreshUpdate::Store(token) => {
                self.settings.write().await.refresh_token = Some(token);
            }
            RefreshUpdate::Forget(stale) => {
                let mut settings = self.settings.write().await;
                if settings.refresh_token.as_deref() == Some(stale.as_str()) {
                    debug!("Dropping rejected refresh token");
                    settings.refresh_token = None;
                }
            }
        }
    }

    fn acquire(&self) -> BoxFuture<'static, Acquisition> {
        let grant = self.grant.clone();
        let transport = Arc::clone(&self.transport);
        let settings = Arc::clone(&self.settings);

        async move {
            let snapshot = settings.read().await.clone();
            let (outcome, mut refresh) =
                acquire_tokens(grant.as_ref(), transport.as_ref(), &snapshot).await;
            let outcome = outcome.map_err(|e| {
                warn!("Token acquisition failed: {e}");
                Arc::new(e)
            });
            if let Ok(TokenState {
                refresh_token: Some(token),
                ..
            }) = &outcome
            {
                refresh = RefreshUpdate::Store(token.clone());
            }
            Acquisition { outcome, refresh }
        }
        .boxed()
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("grant", &self.grant)
            .finish_non_exhaustive()
    }
}

/// Run the grant for a settings snapshot.
///
/// A stored refresh token rejected by the token endpoint is reported as
/// `Forget`; client-credentials and password grants then run once more
/// without it.
async fn acquire_tokens(
    grant: Option<&Grant>,
    transport: &dyn Transport,
    snapshot: &ClientSettings,
) -> (Result<TokenState>, RefreshUpdate) {
    let token_url = match snapshot.token_url() {
        Ok(url) => url,
        Err(e) => return (Err(e), RefreshUpdate::Keep),
    };

    if let Some(jwt) = snapshot.jwt_credentials() {
        info!(grant = "jwt", "Requesting access token");
        let result = grants::jwt_token(transport, &token_url, jwt.jwt, jwt.app_name, jwt.org_id).await;
        return (result.and_then(non_empty), RefreshUpdate::Keep);
    }

    let Some(grant) = grant else {
        return (Err(Error::missing_setting("clientId")), RefreshUpdate::Keep);
    };

    info!(grant = grant.name(), "Requesting access token");
    let ctx = FetchContext {
        transport,
        token_url: &token_url,
        settings: snapshot,
    };
    let result = grant.fetch(ctx).await;

    let stale = match ctx.refresh_token() {
        Some(stale)
            if !matches!(grant, Grant::Custom(_)) && result.as_ref().is_err_and(is_rejection) =>
        {
            stale.to_string()
        }
        _ => return (result.and_then(non_empty), RefreshUpdate::Keep),
    };

    if !matches!(grant, Grant::ClientCredentials | Grant::Password { .. }) {
        return (result, RefreshUpdate::Forget(stale));
    }

    warn!(
        grant = grant.name(),
        "Refresh token rejected, requesting new tokens without it"
    );
    let mut fresh = snapshot.clone();
    fresh.refresh_token = None;
    let ctx = FetchContext {
        settings: &fresh,
        ..ctx
    };
    let result = grant.fetch(ctx).await.and_then(non_empty);
    (result, RefreshUpdate::Forget(stale))
}

/// Token endpoint answered with a client error
fn is_rejection(error: &Error) -> bool {
    matches!(error.status(), Some(400..=499))
}

fn non_empty(tokens: TokenState) -> Result<TokenState> {
    if tokens.access_token.is_empty() {
        return Err(Error::invalid_token_response("access_token must not be empty"));
    }
    Ok(tokens)
}
