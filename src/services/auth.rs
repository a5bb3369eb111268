// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{normalize_email, AuthResponse, Claims, User, UserRole, UserStatus},
};

const TOKEN_TTL_DAYS: i64 = 7;

/// Emissão e verificação dos JWT (HS256).
#[derive(Clone)]
pub struct TokenKeys {
    secret: String,
}

impl TokenKeys {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    pub fn issue(&self, user_id: Uuid, role: UserRole) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(TOKEN_TTL_DAYS);

        let claims = Claims {
            sub: user_id,
            role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    keys: TokenKeys,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, keys: TokenKeys, pool: PgPool) -> Self {
        Self { user_repo, keys, pool }
    }

    /// Cadastro público: sempre cria um usuário da equipe (Staff).
    pub async fn register_user(&self, name: &str, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let email = normalize_email(email);
        let hashed_password = hash_password(password).await?;

        let user = self
            .user_repo
            .create_user(&self.pool, name.trim(), &email, &hashed_password, UserRole::Staff)
            .await?;

        tracing::info!(user_id = %user.id, "Novo usuário registrado");

        let token = self.keys.issue(user.id, user.role)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        if user.status == UserStatus::Inactive {
            return Err(AppError::UserInactive);
        }

        let token = self.keys.issue(user.id, user.role)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.keys.verify(token)?;

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?; // Usuário apagado depois de emitir o token

        if user.status == UserStatus::Inactive {
            return Err(AppError::UserInactive);
        }

        Ok(user)
    }

    /// Garante que exista ao menos um administrador para o primeiro acesso.
    pub async fn ensure_default_admin(&self, email: &str, password: &str) -> Result<(), AppError> {
        let email = normalize_email(email);

        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Ok(());
        }

        let hashed_password = hash_password(password).await?;
        self.user_repo
            .create_user(&self.pool, "Admin User", &email, &hashed_password, UserRole::Admin)
            .await?;

        tracing::info!(%email, "Administrador padrão criado");
        Ok(())
    }
}

// bcrypt é caro: roda fora do executor assíncrono
async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_round_trips_subject_and_role() {
        let keys = TokenKeys::new("segredo-de-teste");
        let user_id = Uuid::new_v4();

        let token = keys.issue(user_id, UserRole::Admin).unwrap();
        let claims = keys.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, UserRole::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = TokenKeys::new("um").issue(Uuid::new_v4(), UserRole::Staff).unwrap();

        let err = TokenKeys::new("outro").verify(&token).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let err = TokenKeys::new("segredo").verify("nem-um-jwt").unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[sqlx::test]
    async fn token_of_a_deleted_user_is_rejected_as_invalid(pool: PgPool) {
        let auth = AuthService::new(
            UserRepository::new(pool.clone()),
            TokenKeys::new("segredo-de-teste"),
            pool.clone(),
        );
        let registered = auth
            .register_user("Carla", "carla@hostel.com", "senha123")
            .await
            .unwrap();
        assert_eq!(registered.user.role, UserRole::Staff);

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(registered.user.id)
            .execute(&pool)
            .await
            .unwrap();

        let err = auth.validate_token(&registered.token).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn hashed_password_verifies() {
        let hashed = hash_password("admin123").await.unwrap();
        assert!(verify("admin123", &hashed).unwrap());
        assert!(!verify("admin124", &hashed).unwrap());
    }
}
