use async_trait::async_trait;
use pdfnotes::{
    models::user::Role,
    repositories::{user_repository::SqliteUserRepository, UserRepository},
    services::{
        email_service::{EmailError, EmailService},
        user_service::{SigninRequest, SignupRequest, UserService, UserServiceError},
        TokenService,
    },
    test_utils::test_helpers,
};
use std::sync::{Arc, Mutex};

/// Keeps every verification link instead of mailing it.
#[derive(Default)]
struct CapturingEmailService {
    links: Mutex<Vec<String>>,
}

impl CapturingEmailService {
    fn last_token(&self) -> String {
        let links = self.links.lock().unwrap();
        let link = links.last().expect("no verification email sent");
        link.rsplit('/').next().unwrap().to_string()
    }
}

#[async_trait]
impl EmailService for CapturingEmailService {
    async fn send_verification_email(
        &self,
        _to_email: &str,
        _fullname: &str,
        verification_link: &str,
    ) -> Result<(), EmailError> {
        self.links
            .lock()
            .unwrap()
            .push(verification_link.to_string());
        Ok(())
    }
}

struct Harness {
    service: UserService,
    repository: Arc<SqliteUserRepository>,
    mail: Arc<CapturingEmailService>,
}

async fn harness(tokens: TokenService) -> Harness {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool));
    let mail = Arc::new(CapturingEmailService::default());
    let service = UserService::new(
        repository.clone(),
        mail.clone(),
        Arc::new(tokens),
        test_helpers::TEST_BASE_URL.to_string(),
    );

    Harness {
        service,
        repository,
        mail,
    }
}

fn signup(email: &str) -> SignupRequest {
    SignupRequest {
        fullname: "Ada Lovelace".to_string(),
        email: email.to_string(),
        password: "password123".to_string(),
    }
}

fn signin(login: &str, password: &str) -> SigninRequest {
    SigninRequest {
        email_or_username: login.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_signup_creates_unverified_user_and_sends_link() {
    let h = harness(TokenService::new(test_helpers::TEST_JWT_SECRET)).await;

    let user = h.service.signup(signup("ada@example.com")).await.unwrap();
    assert!(!user.is_verified);
    assert_eq!(user.username, "ada");
    assert_eq!(user.role, Role::User);

    let links = h.mail.links.lock().unwrap().clone();
    assert_eq!(links.len(), 1);
    assert!(links[0].starts_with("http://localhost:5000/api/verify/"));
}

#[tokio::test]
async fn test_signup_duplicate_email_creates_no_row() {
    let h = harness(TokenService::new(test_helpers::TEST_JWT_SECRET)).await;

    h.service.signup(signup("dup@example.com")).await.unwrap();
    let result = h.service.signup(signup("dup@example.com")).await;

    assert!(matches!(result, Err(UserServiceError::EmailTaken)));
    assert_eq!(h.repository.list_users(None, None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_username_collision_gets_suffix() {
    let h = harness(TokenService::new(test_helpers::TEST_JWT_SECRET)).await;

    let first = h.service.signup(signup("sam@example.com")).await.unwrap();
    let second = h.service.signup(signup("sam@example.org")).await.unwrap();

    assert_eq!(first.username, "sam");
    assert_eq!(second.username, "sam2");
}

#[tokio::test]
async fn test_signin_before_verification_fails() {
    let h = harness(TokenService::new(test_helpers::TEST_JWT_SECRET)).await;
    h.service.signup(signup("early@example.com")).await.unwrap();

    let result = h
        .service
        .signin(signin("early@example.com", "password123"))
        .await;
    assert!(matches!(result, Err(UserServiceError::EmailNotVerified)));
}

#[tokio::test]
async fn test_verify_then_signin_by_username() {
    let tokens = TokenService::new(test_helpers::TEST_JWT_SECRET);
    let h = harness(tokens.clone()).await;
    h.service.signup(signup("grace@example.com")).await.unwrap();

    let verified = h.service.verify_email(&h.mail.last_token()).await.unwrap();
    assert!(verified.is_verified);

    let response = h.service.signin(signin("grace", "password123")).await.unwrap();
    assert_eq!(response.user.email, "grace@example.com");

    let claims = tokens.verify_access_token(&response.token).unwrap();
    assert_eq!(claims.sub, response.user.id);
    assert_eq!(claims.role, Role::User);

    let wrong = h.service.signin(signin("grace", "not-the-password")).await;
    assert!(matches!(wrong, Err(UserServiceError::InvalidPassword)));
}

#[tokio::test]
async fn test_verify_twice_conflicts() {
    let h = harness(TokenService::new(test_helpers::TEST_JWT_SECRET)).await;
    h.service.signup(signup("twice@example.com")).await.unwrap();
    let token = h.mail.last_token();

    assert!(h.service.verify_email(&token).await.is_ok());
    assert!(matches!(
        h.service.verify_email(&token).await,
        Err(UserServiceError::AlreadyVerified)
    ));
}

#[tokio::test]
async fn test_verify_with_expired_token_fails() {
    let tokens = TokenService::new(test_helpers::TEST_JWT_SECRET)
        .with_lifetimes(chrono::Duration::days(7), chrono::Duration::seconds(-60));
    let h = harness(tokens).await;
    let user = h.service.signup(signup("late@example.com")).await.unwrap();

    let result = h.service.verify_email(&h.mail.last_token()).await;
    assert!(matches!(result, Err(UserServiceError::TokenExpired)));

    let stored = h.repository.find_by_id(user.id).await.unwrap().unwrap();
    assert!(!stored.is_verified);
}

#[tokio::test]
async fn test_verify_with_garbage_token_fails() {
    let h = harness(TokenService::new(test_helpers::TEST_JWT_SECRET)).await;
    assert!(matches!(
        h.service.verify_email("not-a-token").await,
        Err(UserServiceError::InvalidToken)
    ));
}

#[tokio::test]
async fn test_list_all_users_requires_admin() {
    let h = harness(TokenService::new(test_helpers::TEST_JWT_SECRET)).await;
    h.service.signup(signup("one@example.com")).await.unwrap();

    assert!(matches!(
        h.service.list_all_users(Role::User).await,
        Err(UserServiceError::Forbidden)
    ));
    assert_eq!(h.service.list_all_users(Role::Admin).await.unwrap().len(), 1);
}
