use crate::{
    config::Config,
    error::{AppError, Result},
    services::Database,
};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AuthService {
    config: Config,
    db: Arc<Database>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,      // 用户ID
    pub jti: Uuid,      // 令牌ID，用于吊销
    pub exp: i64,       // 过期时间
    pub iat: i64,       // 签发时间
    pub username: String,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// 已认证的请求用户，由认证中间件写入请求扩展
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub claims: Claims,
}

impl AuthService {
    pub async fn new(config: &Config, db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            db,
        })
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut rand::rngs::OsRng);
        let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(password_hash)?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn issue_token(&self, user_id: Uuid, username: &str) -> Result<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.config.jwt_expiry_hours);
        let claims = Claims {
            sub: user_id,
            jti: Uuid::new_v4(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            username: username.to_string(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )?;

        debug!("Issued token {} for user {}", claims.jti, user_id);
        Ok((token, expires_at))
    }

    pub fn verify_jwt(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.config.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(token_data) => {
                debug!("JWT token verified for user: {}", token_data.claims.sub);
                Ok(token_data.claims)
            }
            Err(e) => {
                warn!("JWT verification failed: {}", e);
                Err(AppError::unauthorized("Invalid token"))
            }
        }
    }

    /// 校验签名和有效期，并确认令牌未被吊销
    pub async fn authenticate(&self, token: &str) -> Result<AuthUser> {
        let claims = self.verify_jwt(token)?;

        if self.is_revoked(claims.jti).await? {
            debug!("Rejected revoked token {}", claims.jti);
            return Err(AppError::unauthorized("Token has been revoked"));
        }

        Ok(AuthUser {
            id: claims.sub,
            username: claims.username.clone(),
            claims,
        })
    }

    pub async fn is_revoked(&self, jti: Uuid) -> Result<bool> {
        let revoked: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM revoked_tokens
                WHERE jti = $1 AND expires_at > NOW()
            )
            "#,
        )
        .bind(jti)
        .fetch_one(self.db.pool())
        .await?;

        Ok(revoked)
    }

    /// 吊销令牌，记录保留到令牌自身的过期时间
    pub async fn revoke(&self, claims: &Claims) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, user_id, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(claims.jti)
        .bind(claims.sub)
        .bind(claims.expires_at())
        .execute(self.db.pool())
        .await?;

        info!("Token {} revoked for user {}", claims.jti, claims.sub);
        Ok(())
    }
}

// Axum extractor for authentication
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        let config = Config::default();
        let db = Arc::new(Database::connect_lazy(&config).unwrap());
        AuthService { config, db }
    }

    #[tokio::test]
    async fn test_password_hash_roundtrip() {
        let auth = service();
        let hash = auth.hash_password("correct horse 42").unwrap();

        assert!(auth.verify_password("correct horse 42", &hash).unwrap());
        assert!(!auth.verify_password("wrong horse 42", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_issue_and_verify_token() {
        let auth = service();
        let user_id = Uuid::new_v4();

        let (token, expires_at) = auth.issue_token(user_id, "maya").unwrap();
        let claims = auth.verify_jwt(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "maya");
        assert_eq!(claims.expires_at().timestamp(), expires_at.timestamp());
    }

    #[tokio::test]
    async fn test_tampered_token_rejected() {
        let auth = service();
        let (token, _) = auth.issue_token(Uuid::new_v4(), "maya").unwrap();

        let mut other = Config::default();
        other.jwt_secret = "another-secret".to_string();
        let foreign = AuthService {
            config: other,
            db: auth.db.clone(),
        };

        let err = foreign.verify_jwt(&token).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_each_token_gets_unique_jti() {
        let auth = service();
        let user_id = Uuid::new_v4();
        let (a, _) = auth.issue_token(user_id, "maya").unwrap();
        let (b, _) = auth.issue_token(user_id, "maya").unwrap();

        assert_ne!(auth.verify_jwt(&a).unwrap().jti, auth.verify_jwt(&b).unwrap().jti);
    }
}
