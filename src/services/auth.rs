// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{StudentRepository, UserRepository},
    models::auth::{Claims, User},
};

const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    student_repo: StudentRepository,
    jwt_secret: String,
    admin_email: Option<String>,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        student_repo: StudentRepository,
        jwt_secret: String,
        admin_email: Option<String>,
        pool: PgPool,
    ) -> Self {
        Self {
            user_repo,
            student_repo,
            jwt_secret,
            admin_email,
            pool,
        }
    }

    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<String, AppError> {
        // 1. Hashing fora da transação (não toca no banco)
        let password_clone = password.to_owned();
        let hashed_password =
            tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let is_admin = self.is_admin_email(email);

        // 2. Cria o usuário e vincula os cadastros de aluno com o mesmo e-mail
        let mut tx = self.pool.begin().await?;

        let new_user = self
            .user_repo
            .create_user(&mut *tx, email, &hashed_password, display_name, is_admin)
            .await?;

        let linked = self
            .student_repo
            .link_user_to_existing_students(&mut *tx, new_user.id, &new_user.email)
            .await?;

        if linked > 0 {
            tracing::info!("🔗 Usuário vinculado a {} cadastro(s) de aluno.", linked);
        }

        // 3. Commit
        tx.commit().await?;

        self.create_token(new_user.id)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(user.id)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let user_id = self.decode_token(token)?;

        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    fn is_admin_email(&self, email: &str) -> bool {
        self.admin_email
            .as_deref()
            .is_some_and(|admin| admin.eq_ignore_ascii_case(email.trim()))
    }

    fn decode_token(&self, token: &str) -> Result<Uuid, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims.sub)
    }

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(TOKEN_TTL_DAYS);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service(admin_email: Option<&str>) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/library_test")
            .expect("URL válida");
        AuthService::new(
            UserRepository::new(pool.clone()),
            StudentRepository::new(),
            "segredo-de-teste".to_string(),
            admin_email.map(str::to_string),
            pool,
        )
    }

    #[tokio::test]
    async fn token_round_trips_the_user_id() {
        let svc = service(None);
        let user_id = Uuid::new_v4();

        let token = svc.create_token(user_id).unwrap();
        assert_eq!(svc.decode_token(&token).unwrap(), user_id);
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let svc = service(None);
        let mut other = service(None);
        other.jwt_secret = "outro-segredo".to_string();

        let token = other.create_token(Uuid::new_v4()).unwrap();
        assert!(matches!(svc.decode_token(&token), Err(AppError::InvalidToken)));
        assert!(matches!(svc.decode_token("lixo"), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn admin_email_match_is_case_insensitive() {
        let svc = service(Some("admin@library.dev"));
        assert!(svc.is_admin_email("Admin@Library.dev"));
        assert!(!svc.is_admin_email("someone@library.dev"));
        assert!(!service(None).is_admin_email("admin@library.dev"));
    }
}
