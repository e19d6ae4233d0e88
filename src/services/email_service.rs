use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Failed to build email message: {0}")]
    MessageBuild(String),
    #[error("Failed to send email: {0}")]
    SendFailed(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait EmailService: Send + Sync {
    async fn send_verification_email(
        &self,
        to_email: &str,
        fullname: &str,
        verification_link: &str,
    ) -> Result<(), EmailError>;
}

fn verification_text(fullname: &str, verification_link: &str) -> String {
    format!(
        "Hi {},\n\nPlease verify your email address by clicking the following link:\n\n{}\n\n\
         This link will expire in 24 hours.\n\nBest regards,\nThe Team",
        fullname, verification_link
    )
}

/// Logs outgoing mail instead of sending it. Used when SMTP is not configured.
#[derive(Debug, Default)]
pub struct ConsoleEmailService;

impl ConsoleEmailService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailService for ConsoleEmailService {
    async fn send_verification_email(
        &self,
        to_email: &str,
        fullname: &str,
        verification_link: &str,
    ) -> Result<(), EmailError> {
        tracing::info!("📧 [CONSOLE EMAIL] Verification email to: {}", to_email);
        tracing::info!("   Subject: Verify Your Email Address");
        tracing::info!("   Recipient name: {}", fullname);
        tracing::info!("   Verification link: {}", verification_link);
        tracing::info!("   ---");
        Ok(())
    }
}

pub struct SmtpEmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
    from_name: String,
}

impl SmtpEmailService {
    pub fn new(config: &SmtpConfig) -> Result<Self, EmailError> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());

        let mailer = match config.encryption.to_lowercase().as_str() {
            "tls" => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| EmailError::ConfigError(format!("SMTP relay error: {}", e)))?
                .port(config.port)
                .credentials(credentials)
                .build(),
            "starttls" => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| EmailError::ConfigError(format!("SMTP starttls error: {}", e)))?
                .port(config.port)
                .credentials(credentials)
                .build(),
            "none" => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(config.port)
                .credentials(credentials)
                .build(),
            other => {
                return Err(EmailError::ConfigError(format!(
                    "Invalid SMTP_ENCRYPTION value: {}. Use 'tls', 'starttls', or 'none'",
                    other
                )))
            }
        };

        Ok(Self {
            mailer,
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
        })
    }
}

#[async_trait]
impl EmailService for SmtpEmailService {
    async fn send_verification_email(
        &self,
        to_email: &str,
        fullname: &str,
        verification_link: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                format!("{} <{}>", self.from_name, self.from_email)
                    .parse()
                    .map_err(|e| {
                        EmailError::MessageBuild(format!("Invalid from address: {}", e))
                    })?,
            )
            .to(to_email
                .parse()
                .map_err(|e| EmailError::MessageBuild(format!("Invalid to address: {}", e)))?)
            .subject("Verify Your Email Address")
            .header(ContentType::TEXT_PLAIN)
            .body(verification_text(fullname, verification_link))
            .map_err(|e| EmailError::MessageBuild(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| EmailError::SendFailed(e.to_string()))?;

        Ok(())
    }
}

pub fn create_email_service(config: Option<&SmtpConfig>) -> Box<dyn EmailService> {
    match config {
        Some(smtp) => match SmtpEmailService::new(smtp) {
            Ok(service) => {
                tracing::info!("Using SMTP email service");
                Box::new(service)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize SMTP email service: {}. Falling back to console service",
                    e
                );
                Box::new(ConsoleEmailService::new())
            }
        },
        None => {
            tracing::info!(
                "SMTP not configured. Using console email service (emails will be logged)"
            );
            Box::new(ConsoleEmailService::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_text_contains_link_and_name() {
        let text = verification_text("Ada", "http://localhost:5000/api/verify/tok");
        assert!(text.starts_with("Hi Ada,"));
        assert!(text.contains("http://localhost:5000/api/verify/tok"));
        assert!(text.contains("24 hours"));
    }

    #[tokio::test]
    async fn test_console_service_always_succeeds() {
        let service = create_email_service(None);
        let result = service
            .send_verification_email("a@example.com", "Ada", "http://x/api/verify/t")
            .await;
        assert!(result.is_ok());
    }
}
