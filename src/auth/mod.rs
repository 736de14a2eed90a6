//! Credentials bundle and its local cache.
//!
//! The bundle is stored as base64-encoded JSON under the `encryptedTokens`
//! key. This is obfuscation for the local cache only: anyone with access to
//! the storage file can recover the tokens. It is not encryption and must not
//! be relied on as a security control.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::storage::{KEY_API_KEY, KEY_ENCRYPTED_TOKENS, KEY_TELEGRAM_USER_ID, LocalStorage};

/// Marketplace API credentials plus optional report-bot settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub ozon_api_token: String,
    #[serde(default)]
    pub ozon_client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_bot_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_chat_id: Option<String>,
}

impl Credentials {
    pub fn new(api_token: &str, client_id: &str) -> Self {
        Self {
            ozon_api_token: api_token.to_string(),
            ozon_client_id: client_id.to_string(),
            ..Self::default()
        }
    }

    /// Authenticated iff both the API token and the client id are non-empty.
    pub fn is_authenticated(&self) -> bool {
        !self.ozon_api_token.is_empty() && !self.ozon_client_id.is_empty()
    }

    /// Token with everything but the last four characters masked, for display.
    pub fn masked_token(&self) -> String {
        mask(&self.ozon_api_token)
    }
}

fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Serialize a bundle to JSON and base64-encode it.
pub fn encode(bundle: &Credentials) -> String {
    // Serializing a struct of strings cannot fail.
    let json = serde_json::to_string(bundle).unwrap_or_default();
    BASE64.encode(json.as_bytes())
}

/// Inverse of [`encode`]. Any malformed input decodes to the empty bundle.
pub fn decode(token: &str) -> Credentials {
    try_decode(token).unwrap_or_default()
}

fn try_decode(token: &str) -> Option<Credentials> {
    let bytes = BASE64.decode(token.trim()).ok()?;
    let json = String::from_utf8(bytes).ok()?;
    serde_json::from_str(&json).ok()
}

// ---------------------------------------------------------------------------
// Token store
// ---------------------------------------------------------------------------

/// Persist a bundle in local storage.
pub fn save_tokens(storage: &mut LocalStorage, bundle: &Credentials) -> anyhow::Result<()> {
    storage.set(KEY_ENCRYPTED_TOKENS, encode(bundle))
}

/// Load the cached bundle, or the empty bundle when none is stored.
pub fn load_tokens(storage: &LocalStorage) -> Credentials {
    storage
        .get(KEY_ENCRYPTED_TOKENS)
        .map(decode)
        .unwrap_or_default()
}

/// Remove the cached bundle and the cached backend API key.
pub fn clear_tokens(storage: &mut LocalStorage) -> anyhow::Result<()> {
    storage.remove(KEY_ENCRYPTED_TOKENS)?;
    storage.remove(KEY_API_KEY)
}

/// Cached backend API key, if any.
pub fn api_key(storage: &LocalStorage) -> Option<String> {
    storage
        .get(KEY_API_KEY)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

pub fn set_api_key(storage: &mut LocalStorage, key: &str) -> anyhow::Result<()> {
    storage.set(KEY_API_KEY, key)
}

/// Telegram user id remembered from the last identity handoff.
pub fn telegram_user_id(storage: &LocalStorage) -> Option<u64> {
    storage.get(KEY_TELEGRAM_USER_ID)?.parse().ok()
}

pub fn set_telegram_user_id(storage: &mut LocalStorage, user_id: u64) -> anyhow::Result<()> {
    storage.set(KEY_TELEGRAM_USER_ID, user_id.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
