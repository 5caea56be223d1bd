use super::*;

fn cfg() -> IdentityConfig {
    IdentityConfig {
        secret: "devsecret".into(),
        issuer: "gallery".into(),
        ttl_seconds: 60,
    }
}

#[test]
fn admin_token_claims_contain_subject_and_role() {
    let cfg = cfg();
    let token = mint_admin_token(&cfg, "owner@studio.test").expect("token");

    let decoded = decode::<serde_json::Value>(
        &token,
        &DecodingKey::from_secret(cfg.secret.as_bytes()),
        &Validation::default(),
    )
    .expect("decode");

    assert_eq!(decoded.claims["iss"], "gallery");
    assert_eq!(decoded.claims["sub"], "owner@studio.test");
    assert_eq!(decoded.claims["role"], "admin");
}

#[test]
fn bearer_admin_token_is_accepted() {
    let cfg = cfg();
    let token = mint_admin_token(&cfg, "owner").expect("token");

    let principal = verify_admin(&cfg, Some(&format!("Bearer {token}"))).expect("admin");
    assert_eq!(principal.subject, "owner");

    let bare = verify_admin(&cfg, Some(&token)).expect("bare token");
    assert_eq!(bare.subject, "owner");
}

#[test]
fn missing_token_is_rejected() {
    assert!(matches!(verify_admin(&cfg(), None), Err(AuthError::Missing)));
    assert!(matches!(
        verify_admin(&cfg(), Some("Bearer  ")),
        Err(AuthError::Missing)
    ));
}

#[test]
fn non_admin_role_is_rejected() {
    let cfg = cfg();
    let token = mint_token(&cfg, "visitor", "viewer").expect("token");
    assert!(matches!(
        verify_admin(&cfg, Some(&token)),
        Err(AuthError::NotAdmin(subject)) if subject == "visitor"
    ));
}

#[test]
fn foreign_secret_or_issuer_is_rejected() {
    let cfg = cfg();
    let forged = mint_admin_token(
        &IdentityConfig {
            secret: "other".into(),
            ..cfg.clone()
        },
        "owner",
    )
    .expect("token");
    assert!(matches!(
        verify_admin(&cfg, Some(&forged)),
        Err(AuthError::Invalid(_))
    ));

    let foreign_issuer = mint_admin_token(
        &IdentityConfig {
            issuer: "elsewhere".into(),
            ..cfg.clone()
        },
        "owner",
    )
    .expect("token");
    assert!(matches!(
        verify_admin(&cfg, Some(&foreign_issuer)),
        Err(AuthError::Invalid(_))
    ));
}

#[test]
fn expired_token_is_rejected() {
    let cfg = IdentityConfig {
        ttl_seconds: -3600,
        ..cfg()
    };
    let token = mint_admin_token(&cfg, "owner").expect("token");
    assert!(matches!(
        verify_admin(&cfg, Some(&token)),
        Err(AuthError::Invalid(_))
    ));
}
