mod common;

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use common::{ScriptedApi, grant};
use elektra::api::{TOKEN_EXPIRY_MARGIN_SECS, TokenManager};
use elektra::error::ElektraError;

#[tokio::test]
async fn valid_token_is_reused_without_network_calls() {
    let api = Arc::new(ScriptedApi::new());
    api.push_token(Ok(grant(3600)));

    let mut manager = TokenManager::new(api.clone());
    let obtained_at = Utc.with_ymd_and_hms(2024, 5, 4, 10, 0, 0).unwrap();

    let first = manager.ensure_valid_token_at(obtained_at).await.unwrap();
    assert_eq!(api.token_calls(), 1);

    // Any instant strictly before T + E - 60s reuses the held token
    let just_before = obtained_at + Duration::seconds(3600 - TOKEN_EXPIRY_MARGIN_SECS - 1);
    let second = manager.ensure_valid_token_at(just_before).await.unwrap();
    assert_eq!(api.token_calls(), 1);
    assert_eq!(second.access_token, first.access_token);
}

#[tokio::test]
async fn expired_token_triggers_exactly_one_exchange() {
    let api = Arc::new(ScriptedApi::new());
    api.push_token(Ok(grant(3600)));
    api.push_token(Ok(grant(3600)));

    let mut manager = TokenManager::new(api.clone());
    let obtained_at = Utc.with_ymd_and_hms(2024, 5, 4, 10, 0, 0).unwrap();
    manager.ensure_valid_token_at(obtained_at).await.unwrap();

    // At exactly T + E - 60s the token counts as expired
    let boundary = obtained_at + Duration::seconds(3600 - TOKEN_EXPIRY_MARGIN_SECS);
    manager.ensure_valid_token_at(boundary).await.unwrap();
    assert_eq!(api.token_calls(), 2);

    // The replacement token is good again from its own issue instant
    manager
        .ensure_valid_token_at(boundary + Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(api.token_calls(), 2);
}

#[tokio::test]
async fn expiry_uses_margin_adjusted_lifetime() {
    let api = Arc::new(ScriptedApi::new());
    api.push_token(Ok(grant(300)));

    let mut manager = TokenManager::new(api.clone());
    let obtained_at = Utc.with_ymd_and_hms(2024, 5, 4, 10, 0, 0).unwrap();
    let token = manager.ensure_valid_token_at(obtained_at).await.unwrap();

    assert_eq!(
        token.expires_at,
        obtained_at + Duration::seconds(300 - TOKEN_EXPIRY_MARGIN_SECS)
    );
}

#[tokio::test]
async fn rejected_exchange_surfaces_auth_error() {
    let api = Arc::new(ScriptedApi::new());
    api.push_token(Err(ElektraError::auth("Token endpoint returned status 401")));

    let mut manager = TokenManager::new(api.clone());
    let err = manager
        .ensure_valid_token_at(Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, ElektraError::Auth { .. }));
    assert!(manager.current().is_none());
}
