use chirpy_auth::application_impl::*;
use chirpy_auth::application_port::*;
use chirpy_auth::infra_memory::InMemoryStore;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use std::sync::Arc;

const SECRET: &[u8] = b"integration-secret";

fn session_manager() -> (RealAuthSessionManager, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let manager = RealAuthSessionManager::new(
        store.clone(),
        Arc::new(Argon2PasswordHasher::with_cost(64, 1, 1).unwrap()),
        Arc::new(JwtHs256Codec::new(SECRET)),
        RefreshTokenStore::new(store.clone(), DEFAULT_REFRESH_TTL),
        AuthConfig::default(),
    );
    (manager, store)
}

fn login_input() -> LoginInput {
    LoginInput {
        email: "a@x.com".to_string(),
        password: "p4ss".to_string(),
    }
}

#[tokio::test]
async fn login_refresh_revoke_round() {
    let (manager, store) = session_manager();

    let err = manager.login(login_input()).await.unwrap_err();
    assert!(matches!(err, AuthError::UnknownUser));

    let registered = manager
        .register(RegisterInput {
            email: "a@x.com".to_string(),
            password: "p4ss".to_string(),
        })
        .await
        .unwrap();

    let before = Utc::now();
    let login = manager.login(login_input()).await.unwrap();
    assert_eq!(login.user_id, registered.user_id);

    let access_ttl = login.tokens.access_token_expires_at - before;
    assert!(access_ttl.num_seconds() >= 3599 && access_ttl.num_seconds() <= 3601);
    let refresh_ttl = login.tokens.refresh_token_expires_at - before;
    assert!(refresh_ttl.num_days() == 59 || refresh_ttl.num_days() == 60);
    assert_eq!(login.tokens.refresh_token.0.len(), 64);
    assert_eq!(store.refresh_token_count(), 1);

    let subject = manager
        .authenticate(&login.tokens.access_token.0)
        .await
        .unwrap();
    assert_eq!(subject, registered.user_id);

    let refreshed = manager
        .refresh(&login.tokens.refresh_token.0)
        .await
        .unwrap();
    let subject = manager
        .authenticate(&refreshed.access_token.0)
        .await
        .unwrap();
    assert_eq!(subject, registered.user_id);

    manager.revoke(&login.tokens.refresh_token.0).await.unwrap();
    let err = manager
        .refresh(&login.tokens.refresh_token.0)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenRevoked));

    // Revoking a refresh token leaves issued access tokens alone.
    manager
        .authenticate(&refreshed.access_token.0)
        .await
        .unwrap();
}

#[tokio::test]
async fn stale_access_token_never_verifies() {
    let (manager, _store) = session_manager();
    let registered = manager
        .register(RegisterInput {
            email: "a@x.com".to_string(),
            password: "p4ss".to_string(),
        })
        .await
        .unwrap();

    let now = Utc::now().timestamp();
    let claims = serde_json::json!({
        "iss": TOKEN_ISSUER,
        "sub": registered.user_id.to_string(),
        "iat": now - 7200,
        "exp": now - 3600,
    });
    let stale = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET),
    )
    .unwrap();

    let codec = JwtHs256Codec::new(SECRET);
    let err = codec
        .verify_access_token(&AccessToken(stale.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenExpired));

    for _ in 0..3 {
        let err = manager.authenticate(&stale).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }
}

#[tokio::test]
async fn changed_password_is_the_only_one_accepted() {
    let (manager, _store) = session_manager();
    manager
        .register(RegisterInput {
            email: "a@x.com".to_string(),
            password: "p4ss".to_string(),
        })
        .await
        .unwrap();
    let login = manager.login(login_input()).await.unwrap();

    manager
        .change_password(
            &login.tokens.access_token.0,
            ChangePasswordInput {
                new_email: "b@x.com".to_string(),
                new_password: "n3w".to_string(),
            },
        )
        .await
        .unwrap();

    let err = manager.login(login_input()).await.unwrap_err();
    assert!(matches!(err, AuthError::UnknownUser));
    let relogin = manager
        .login(LoginInput {
            email: "b@x.com".to_string(),
            password: "n3w".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(relogin.user_id, login.user_id);
}
