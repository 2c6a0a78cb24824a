use std::sync::Arc;

use chrono::Duration;

use taskdeck_auth::{Hs256TokenCodec, TokenCodec};
use taskdeck_store::{AuditRecorder, Store};

/// Shared state handed to every handler via `Extension`.
pub struct AppServices {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<dyn TokenCodec>,
    pub audit: AuditRecorder,
    pub token_ttl: Duration,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, jwt_secret: &str) -> Self {
        let tokens: Arc<dyn TokenCodec> = Arc::new(Hs256TokenCodec::new(jwt_secret.as_bytes()));
        Self {
            audit: AuditRecorder::new(store.clone()),
            store,
            tokens,
            token_ttl: Duration::hours(24),
        }
    }
}
