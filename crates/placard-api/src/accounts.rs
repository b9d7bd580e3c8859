use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand_core::OsRng;
use tracing::info;

use placard_db::{Database, accounts};
use placard_types::api::{LoginRequest, LoginResponse, RegisterRequest};

use crate::claims::TokenService;
use crate::error::{ApiError, ApiResult};

fn require_field(value: &str, what: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{} can't be empty", what)));
    }
    Ok(())
}

/// Creates an account in the unaffiliated bucket and returns its id.
pub fn register(db: &Database, req: &RegisterRequest) -> ApiResult<i64> {
    require_field(&req.username, "username")?;
    require_field(&req.first_name, "first name")?;
    require_field(&req.last_name, "last name")?;
    require_field(&req.password, "password")?;

    // Hash password with Argon2id before taking the write lock
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Storage(anyhow::anyhow!("failed to create password hash: {}", e)))?
        .to_string();

    let user_id = db.with_tx(|tx| {
        if accounts::username_exists(tx, &req.username)? {
            return Err(ApiError::conflict("username already exists"));
        }
        let user_id = accounts::insert_user(tx, &req.username, &password_hash)?;
        accounts::insert_userinfo(tx, user_id, &req.first_name, &req.last_name)?;
        Ok(user_id)
    })?;

    info!("Registered account {} ({})", req.username, user_id);
    Ok(user_id)
}

pub fn login(db: &Database, tokens: &TokenService, req: &LoginRequest) -> ApiResult<LoginResponse> {
    if req.username.is_empty() {
        return Err(ApiError::validation("username not supplied"));
    }
    if req.password.is_empty() {
        return Err(ApiError::validation("password not supplied"));
    }

    let account = db
        .with_conn(|conn| accounts::account_by_username(conn, &req.username).map_err(ApiError::from))?
        .ok_or_else(|| ApiError::unauthorized("failed to login"))?;

    let parsed_hash = PasswordHash::new(&account.password)
        .map_err(|e| ApiError::Storage(anyhow::anyhow!("stored hash unreadable: {}", e)))?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::unauthorized("failed to login"))?;

    let token = tokens.mint(account.id, &account.username, account.party_id)?;

    Ok(LoginResponse {
        token,
        party_name: account.party_name,
        user_id: account.id,
        party_id: account.party_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testutil;
    use placard_types::UNAFFILIATED_PARTY_ID;

    fn register_req(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            password: password.into(),
        }
    }

    #[test]
    fn empty_fields_are_rejected() {
        let db = testutil::db();
        let mut req = register_req("ada", "secret");
        req.last_name = String::new();
        assert_eq!(register(&db, &req).unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(
            register(&db, &register_req("", "secret")).unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn duplicate_username_conflicts() {
        let db = testutil::db();
        register(&db, &register_req("ada", "secret")).unwrap();
        let err = register(&db, &register_req("ada", "other")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn login_returns_unaffiliated_membership() {
        let db = testutil::db();
        let tokens = testutil::tokens();
        let id = register(&db, &register_req("ada", "secret")).unwrap();

        let res = login(
            &db,
            &tokens,
            &LoginRequest {
                username: "ada".into(),
                password: "secret".into(),
            },
        )
        .unwrap();

        assert_eq!(res.user_id, id);
        assert_eq!(res.party_id, UNAFFILIATED_PARTY_ID);
        assert_eq!(res.party_name, "unaffiliated");
        let claims = tokens.verify(&res.token).unwrap();
        assert!(claims.matches(id, UNAFFILIATED_PARTY_ID));
    }

    #[test]
    fn bad_credentials_fail_login() {
        let db = testutil::db();
        let tokens = testutil::tokens();
        register(&db, &register_req("ada", "secret")).unwrap();

        for (username, password) in [("ada", "wrong"), ("nobody", "secret")] {
            let err = login(
                &db,
                &tokens,
                &LoginRequest {
                    username: username.into(),
                    password: password.into(),
                },
            )
            .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Authorization);
        }
    }
}
