#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;

use estate_desk::auth::CredentialStore;
use estate_desk::config::Config;
use estate_desk::notify::MemoryNotifier;
use estate_desk::AppContext;

const SIGNING_KEY: &[u8] = b"integration-test-signing-key";

/// Sign `claims` as an HS256 token, the way the CRM backend issues them.
pub fn mint_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(json!({"alg": "HS256", "typ": "JWT"}).to_string());
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    let signing_input = format!("{}.{}", header, payload);

    let mut mac = Hmac::<Sha256>::new_from_slice(SIGNING_KEY).unwrap();
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    format!("{}.{}", signing_input, signature)
}

pub fn token_for(role: &str, expires_in_secs: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + expires_in_secs;
    mint_token(&json!({
        "userId": format!("{}-1", role),
        "firstName": "Ada",
        "lastName": "Obi",
        "email": "ada@example.com",
        "role": role,
        "exp": exp,
    }))
}

pub fn profile(role: &str) -> Value {
    json!({
        "_id": format!("{}-1", role),
        "firstName": "Ada",
        "lastName": "Obi",
        "email": "ada@example.com",
        "role": role,
    })
}

pub fn config(api_url: &str, storage_path: &Path) -> Config {
    let api_url = api_url.to_string();
    let storage_path = storage_path.to_string_lossy().to_string();
    Config::from_lookup(move |key| match key {
        "CRM_API_URL" => Some(api_url.clone()),
        "CRM_STORAGE_PATH" => Some(storage_path.clone()),
        "CRM_PAGE_SIZE" => Some("2".to_string()),
        "CRM_HTTP_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap()
}

pub fn context(
    api_url: &str,
    store: Arc<dyn CredentialStore>,
) -> (AppContext, Arc<MemoryNotifier>) {
    let notifier = Arc::new(MemoryNotifier::new());
    let config = config(api_url, Path::new("/unused/storage.json"));
    let ctx = AppContext::with_store(config, store, notifier.clone()).unwrap();
    (ctx, notifier)
}
