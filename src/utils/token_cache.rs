use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

// ============================================================================
// Service Token Cache
// ============================================================================
//
// Expiry-aware cache around an admin/service token endpoint (Keycloak-style).
// Two rules:
// 1. A token is never handed out inside `refresh_margin` of its expiry.
// 2. Refresh is single-flight: concurrent callers that find the token stale
//    wait for ONE refresh instead of stampeding the token endpoint.
//
// The single lock held across the fetch is what provides single-flight.
//
// ============================================================================

/// A token plus its advertised lifetime.
#[derive(Debug, Clone)]
pub struct ServiceToken {
    pub access_token: String,
    pub expires_in: Duration,
}

/// Source of fresh tokens (an HTTP client against the identity provider in
/// production; a stub in tests).
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    async fn fetch(&self) -> anyhow::Result<ServiceToken>;
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

pub struct TokenCache {
    fetcher: Arc<dyn TokenFetcher>,
    refresh_margin: Duration,
    state: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(fetcher: Arc<dyn TokenFetcher>, refresh_margin: Duration) -> Self {
        Self {
            fetcher,
            refresh_margin,
            state: Mutex::new(None),
        }
    }

    /// Current token, refreshed if missing or inside the refresh margin.
    pub async fn token(&self) -> anyhow::Result<String> {
        let mut state = self.state.lock().await;

        if let Some(cached) = state.as_ref() {
            if Instant::now() + self.refresh_margin < cached.expires_at {
                return Ok(cached.token.clone());
            }
        }

        tracing::debug!("service token missing or near expiry, refreshing");
        let fresh = self.fetcher.fetch().await?;
        let token = fresh.access_token.clone();
        *state = Some(CachedToken {
            token: fresh.access_token,
            expires_at: Instant::now() + fresh.expires_in,
        });

        Ok(token)
    }

    /// Drop the cached token (after a 401 from the downstream service).
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        *state = None;
    }
}
