//! Authentication and account management service

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{
        CreateUser, LoginRequest, LoginResponse, UpdateProfile, User, UserChanges, UserClaims,
    },
    repository::UserStore,
};

/// Argon2 password hashing, constructed once and shared
#[derive(Clone, Default)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hash(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    pub fn verify(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    passwords: PasswordService,
    config: AuthConfig,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, passwords: PasswordService, config: AuthConfig) -> Self {
        Self {
            users,
            passwords,
            config,
        }
    }

    /// Register a new account
    pub async fn register(&self, data: CreateUser) -> AppResult<User> {
        data.validate()?;
        let email = normalize_email(&data.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            name: data.name.trim().to_string(),
            password_hash: self.passwords.hash(&data.password)?,
            created_at: now,
            updated_at: now,
        };
        let created = self.users.insert(&user).await?;
        tracing::info!(user_id = %created.id, "User registered");
        Ok(created)
    }

    /// Check credentials and issue a bearer token
    pub async fn login(&self, data: LoginRequest) -> AppResult<LoginResponse> {
        let invalid = || AppError::Authentication("Invalid email or password".to_string());

        let user = self
            .users
            .find_by_email(&normalize_email(&data.email))
            .await?
            .ok_or_else(invalid)?;

        if !self.passwords.verify(&data.password, &user.password_hash)? {
            return Err(invalid());
        }

        let token = self.create_token_for_user(&user)?;
        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.expiration_seconds(),
            user,
        })
    }

    fn expiration_seconds(&self) -> i64 {
        self.config.jwt_expiration_hours as i64 * 3600
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        UserClaims::for_user(user, self.expiration_seconds())
            .sign(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Resolve a bearer token into the claims it carries
    pub fn authenticate(&self, token: &str) -> AppResult<UserClaims> {
        UserClaims::verify(token, &self.config.jwt_secret).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            AppError::Authentication("Invalid or expired token".to_string())
        })
    }

    pub async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    /// Update the caller's own profile
    pub async fn update_profile(&self, id: Uuid, data: UpdateProfile) -> AppResult<User> {
        data.validate()?;
        let user = self.get_user(id).await?;

        let password_hash = match data.new_password {
            Some(ref new_password) => {
                let current = data.current_password.as_deref().ok_or_else(|| {
                    AppError::Validation("Current password is required to change password".to_string())
                })?;
                if !self.passwords.verify(current, &user.password_hash)? {
                    return Err(AppError::Authentication("Current password is incorrect".to_string()));
                }
                Some(self.passwords.hash(new_password)?)
            }
            None => None,
        };

        let changes = UserChanges {
            name: data.name.map(|n| n.trim().to_string()),
            email: data.email.as_deref().map(normalize_email),
            password_hash,
        };
        self.users
            .update(id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }
}
