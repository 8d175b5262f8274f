use async_trait::async_trait;
use crate::{domain::email::model::Email, utils::errors::ApiError};

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send_email(&self, email: &Email) -> Result<(), ApiError>;

    async fn send_password_reset_email(&self, to: &str, reset_link: &str) -> Result<(), ApiError> {
        self.send_email(&Email::password_reset(to, reset_link)).await
    }
}
