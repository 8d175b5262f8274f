use async_trait::async_trait;
use lettre::message::{Mailbox, Message, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use std::error::Error;
use lettre::{AsyncSmtpTransport, Tokio1Executor, AsyncTransport};

use crate::domain::email::model::Email;
use crate::domain::email::service::EmailService;
use crate::utils::config::SmtpSettings;
use crate::utils::errors::ApiError;

#[derive(Clone)]
pub struct SmtpEmailService {
    username: String,
    mailer: AsyncSmtpTransport<Tokio1Executor>
}

impl SmtpEmailService {

    pub fn new(settings: &SmtpSettings) -> Result<Self, lettre::transport::smtp::Error> {
        let credentials = Credentials::new(settings.username.clone(), settings.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.server)?
            .credentials(credentials)
            .build();
        Ok(SmtpEmailService {
            username: settings.username.clone(),
            mailer
        })
    }

    async fn send_email_internal(&self, email: &Email) -> Result<(), Box<dyn Error + Send + Sync>> {
        let message = Message::builder()
            .from(format!("Adopta Pets <{}>", self.username).parse::<Mailbox>()?)
            .to(format!("<{}>", email.to).parse::<Mailbox>()?)
            .subject(&email.subject)
            .multipart(MultiPart::alternative_plain_html(
                email.text_body.clone(),
                email.html_body.clone(),
            ))?;

        self.mailer.send(message).await?;
        Ok(())
    }
}

#[async_trait]
impl EmailService for SmtpEmailService {

    async fn send_email(&self, email: &Email) -> Result<(), ApiError> {
        self.send_email_internal(email)
            .await
            .map_err(|e| ApiError::InternalServerError(format!("No se pudo enviar el correo: {}", e)))
    }
}

/// Used when no SMTP relay is configured: the email is written to the log instead.
#[derive(Clone, Default)]
pub struct LogEmailService;

#[async_trait]
impl EmailService for LogEmailService {

    async fn send_email(&self, email: &Email) -> Result<(), ApiError> {
        log::warn!(
            "SMTP not configured, email to {} not sent. Subject: {}\n{}",
            email.to, email.subject, email.text_body
        );
        Ok(())
    }
}
