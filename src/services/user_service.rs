use crate::models::user::{Profile, Role, User};
use crate::repositories::user_repository::{NewUser, UserRepository};
use crate::repositories::RepositoryError;
use crate::services::email_service::EmailService;
use crate::services::token_service::{TokenError, TokenService};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Password too weak (minimum 8 characters)")]
    WeakPassword,
    #[error("Email already exists")]
    EmailTaken,
    #[error("Username already taken")]
    UsernameTaken,
    #[error("Email or username not found")]
    UnknownLogin,
    #[error("Email not verified")]
    EmailNotVerified,
    #[error("Invalid password")]
    InvalidPassword,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Verification link has expired")]
    TokenExpired,
    #[error("Email already verified")]
    AlreadyVerified,
    #[error("User not found")]
    UserNotFound,
    #[error("Access denied")]
    Forbidden,
    #[error("Password hashing failed: {0}")]
    HashingError(String),
    #[error("Token error: {0}")]
    Token(TokenError),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

pub struct SignupRequest {
    pub fullname: String,
    pub email: String,
    pub password: String,
}

pub struct SigninRequest {
    pub email_or_username: String,
    pub password: String,
}

pub struct CreateUserRequest {
    pub fullname: String,
    pub email: String,
    pub password: String,
    pub is_verified: bool,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct SigninResponse {
    pub token: String,
    pub user: User,
}

pub struct UserService {
    repository: Arc<dyn UserRepository>,
    email_service: Arc<dyn EmailService>,
    tokens: Arc<TokenService>,
    base_url: String,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        email_service: Arc<dyn EmailService>,
        tokens: Arc<TokenService>,
        base_url: String,
    ) -> Self {
        Self {
            repository,
            email_service,
            tokens,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Registers an unverified account and mails a verification link.
    ///
    /// A failed mail delivery is logged; the account is kept either way.
    pub async fn signup(&self, request: SignupRequest) -> Result<User, UserServiceError> {
        let fullname = request.fullname.trim().to_string();
        let email = request.email.trim().to_string();

        let user = self
            .create_user(CreateUserRequest {
                fullname,
                email,
                password: request.password,
                is_verified: false,
                role: Role::User,
            })
            .await?;

        let token = self
            .tokens
            .issue_verification_token(user.id)
            .map_err(UserServiceError::Token)?;
        let link = format!("{}/api/verify/{}", self.base_url, token);

        tracing::info!("Sending verification email to: {}", user.email);
        match self
            .email_service
            .send_verification_email(&user.email, &user.fullname, &link)
            .await
        {
            Ok(()) => tracing::info!("✅ Verification email sent to: {}", user.email),
            Err(e) => tracing::error!(
                "❌ Failed to send verification email to {}: {}. Account kept unverified",
                user.email,
                e
            ),
        }

        Ok(user)
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User, UserServiceError> {
        if request.fullname.trim().is_empty() {
            return Err(UserServiceError::MissingField("fullname"));
        }
        self.validate_email(&request.email)?;
        self.validate_password(&request.password)?;

        if self.repository.find_by_email(&request.email).await?.is_some() {
            return Err(UserServiceError::EmailTaken);
        }

        let password_hash = self.hash_password(&request.password)?;
        let username = self.available_username(&request.email).await?;

        let new_user = NewUser {
            fullname: request.fullname.trim().to_string(),
            email: request.email.clone(),
            username,
            password_hash,
            is_verified: request.is_verified,
            role: request.role,
        };

        match self.repository.create_user(new_user).await {
            Ok(user) => Ok(user),
            Err(RepositoryError::AlreadyExists) => {
                if self.repository.find_by_email(&request.email).await?.is_some() {
                    Err(UserServiceError::EmailTaken)
                } else {
                    Err(UserServiceError::UsernameTaken)
                }
            }
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    pub async fn signin(&self, request: SigninRequest) -> Result<SigninResponse, UserServiceError> {
        let login = request.email_or_username.trim();
        if login.is_empty() {
            return Err(UserServiceError::MissingField("emailOrUsername"));
        }

        let user = self
            .repository
            .find_by_email_or_username(login)
            .await?
            .ok_or(UserServiceError::UnknownLogin)?;

        if !user.is_verified {
            return Err(UserServiceError::EmailNotVerified);
        }

        if !self.verify_password(&request.password, &user.password_hash) {
            return Err(UserServiceError::InvalidPassword);
        }

        let token = self
            .tokens
            .issue_access_token(user.id, user.role)
            .map_err(UserServiceError::Token)?;

        Ok(SigninResponse { token, user })
    }

    pub async fn verify_email(&self, token: &str) -> Result<User, UserServiceError> {
        let claims = self
            .tokens
            .verify_verification_token(token)
            .map_err(|e| match e {
                TokenError::Expired => UserServiceError::TokenExpired,
                _ => UserServiceError::InvalidToken,
            })?;

        let user = self
            .repository
            .find_by_id(claims.sub)
            .await?
            .ok_or(UserServiceError::InvalidToken)?;

        if user.is_verified {
            return Err(UserServiceError::AlreadyVerified);
        }

        if !self.repository.mark_verified(user.id).await? {
            return Err(UserServiceError::AlreadyVerified);
        }

        tracing::info!("Email verified for user {}", user.id);
        Ok(User {
            is_verified: true,
            ..user
        })
    }

    pub async fn get_profile(&self, user_id: i64) -> Result<Profile, UserServiceError> {
        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or(UserServiceError::UserNotFound)?;

        Ok(Profile {
            profile_img: user.profile_img,
        })
    }

    pub async fn list_all_users(&self, caller_role: Role) -> Result<Vec<User>, UserServiceError> {
        if caller_role != Role::Admin {
            return Err(UserServiceError::Forbidden);
        }
        Ok(self.repository.list_users(None, None).await?)
    }

    pub async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<User>, UserServiceError> {
        Ok(self.repository.list_users(limit, offset).await?)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self.repository.find_by_email(email).await?)
    }

    pub async fn mark_verified(&self, id: i64) -> Result<bool, UserServiceError> {
        Ok(self.repository.mark_verified(id).await?)
    }

    pub async fn set_role(&self, id: i64, role: Role) -> Result<(), UserServiceError> {
        match self.repository.set_role(id, role).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), UserServiceError> {
        match self.repository.delete_user(id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    /// The email local-part, suffixed with a counter when already taken.
    async fn available_username(&self, email: &str) -> Result<String, UserServiceError> {
        let base = derive_username(email);
        if self.repository.find_by_username(&base).await?.is_none() {
            return Ok(base);
        }

        for n in 2..1000 {
            let candidate = format!("{}{}", base, n);
            if self.repository.find_by_username(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }

        Err(UserServiceError::UsernameTaken)
    }

    fn validate_email(&self, email: &str) -> Result<(), UserServiceError> {
        if email.is_empty() {
            return Err(UserServiceError::MissingField("email"));
        }
        let Some((local, domain)) = email.split_once('@') else {
            return Err(UserServiceError::InvalidEmail);
        };
        if local.is_empty() || domain.is_empty() || email.len() > 255 {
            return Err(UserServiceError::InvalidEmail);
        }
        Ok(())
    }

    fn validate_password(&self, password: &str) -> Result<(), UserServiceError> {
        if password.len() < 8 {
            return Err(UserServiceError::WeakPassword);
        }
        Ok(())
    }

    fn hash_password(&self, password: &str) -> Result<String, UserServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserServiceError::HashingError(e.to_string()))
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        if let Ok(parsed_hash) = PasswordHash::new(password_hash) {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
        } else {
            false
        }
    }
}

pub fn derive_username(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}
