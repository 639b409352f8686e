use crate::{
    error::{AppError, Result},
    models::user::*,
    services::{AuthService, Database},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct UserService {
    db: Arc<Database>,
    auth_service: AuthService,
}

impl UserService {
    pub async fn new(db: Arc<Database>, auth_service: AuthService) -> Result<Self> {
        Ok(Self { db, auth_service })
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse> {
        request.validate()?;
        debug!("Registering user {}", request.username);

        let password_hash = self.auth_service.hash_password(&request.password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash, display_name, gender)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.username)
        .bind(request.email.to_lowercase())
        .bind(&password_hash)
        .bind(request.display_name.trim())
        .bind(request.gender)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Username or email already registered"))?;

        let (token, expires_at) = self.auth_service.issue_token(user.id, &user.username)?;

        info!("Registered user {} ({})", user.username, user.id);
        Ok(AuthResponse {
            token,
            expires_at,
            user: user.to_response(),
        })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
        request.validate()?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(request.email.to_lowercase())
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid email or password"))?;

        if !self
            .auth_service
            .verify_password(&request.password, &user.password_hash)?
        {
            debug!("Password mismatch for user {}", user.id);
            return Err(AppError::unauthorized("Invalid email or password"));
        }

        let (token, expires_at) = self.auth_service.issue_token(user.id, &user.username)?;

        info!("User {} logged in", user.id);
        Ok(AuthResponse {
            token,
            expires_at,
            user: user.to_response(),
        })
    }

    pub async fn find_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(user)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User> {
        self.find_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<User> {
        request.validate()?;
        debug!("Updating profile for user {}", user_id);

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                display_name = COALESCE($2, display_name),
                bio = COALESCE($3, bio),
                avatar_url = COALESCE($4, avatar_url),
                gender = COALESCE($5, gender),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(request.display_name.as_deref().map(str::trim))
        .bind(request.bio.as_deref())
        .bind(request.avatar_url.as_deref())
        .bind(request.gender)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

        info!("Updated profile for user {}", user_id);
        Ok(user)
    }

    /// 开通或续期会员：从当前有效期与现在两者较晚者起算
    pub async fn subscribe_premium(&self, user_id: Uuid, request: PremiumRequest) -> Result<User> {
        request.validate()?;

        let mut tx = self.db.begin().await?;

        let current: Option<Option<chrono::DateTime<Utc>>> = sqlx::query_scalar(
            "SELECT premium_expires_at FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let current = current.ok_or_else(|| AppError::not_found("User"))?;

        let expires_at = extend_premium(current, Utc::now(), request.months);

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET is_premium = TRUE, premium_expires_at = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("User {} premium extended until {}", user_id, expires_at);
        Ok(user)
    }
}
