//! Fixtures shared by the handler tests: an in-memory application state,
//! seeded accounts and a multipart body builder.

use std::path::Path;
use std::sync::{Arc, Mutex};

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web};
use async_trait::async_trait;
use serde_json::Value;
use tempfile::TempDir;

use crate::api::state::AppState;
use crate::domain::email::{model::Email, service::EmailService};
use crate::domain::pet::model::{Gender, NewPet, Size, Species};
use crate::domain::{Pet, User, UserRole};
use crate::utils::config::{AppConfig, MEMORY_DATABASE_URL};
use crate::utils::errors::ApiError;
use crate::utils::security::auth::AuthUtils;

pub const TEST_SECRET: &str = "test_secret_key_for_jwt_signing_operations";
pub const TEST_PASSWORD: &str = "secreto1";
const TEST_BCRYPT_COST: u32 = 4;
const BOUNDARY: &str = "----adoptaPetsTestBoundary";

pub fn test_config(upload_dir: &Path) -> AppConfig {
    AppConfig {
        database_url: MEMORY_DATABASE_URL.to_string(),
        database_name: "adopciones_test".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        secret_key: TEST_SECRET.to_string(),
        jwt_expiration_minutes: 60,
        bcrypt_cost: TEST_BCRYPT_COST,
        upload_dir: upload_dir.to_path_buf(),
        frontend_url: "http://front.test".to_string(),
        smtp: None,
    }
}

/// Keeps every email instead of sending it.
#[derive(Default)]
pub struct RecordingEmailService {
    pub sent: Mutex<Vec<Email>>,
}

#[async_trait]
impl EmailService for RecordingEmailService {
    async fn send_email(&self, email: &Email) -> Result<(), ApiError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub mailer: Arc<RecordingEmailService>,
    pub uploads: TempDir,
}

pub fn test_context() -> TestContext {
    let uploads = tempfile::tempdir().unwrap();
    let mailer = Arc::new(RecordingEmailService::default());
    let state = AppState::memory(test_config(uploads.path()), mailer.clone());

    TestContext {
        state: web::Data::new(state),
        mailer,
        uploads,
    }
}

/// Stores an account whose password is [`TEST_PASSWORD`]; the name is the email's local part.
pub async fn seed_user(state: &AppState, email: &str, role: UserRole) -> User {
    let name = email.split('@').next().unwrap_or(email).to_string();
    let hash = AuthUtils::hash_password(TEST_PASSWORD, TEST_BCRYPT_COST).unwrap();
    state
        .users
        .insert(User::new(name, "Prueba".to_string(), email.to_string(), hash, role))
        .await
        .unwrap()
}

pub fn token_for(state: &AppState, user: &User) -> String {
    AuthUtils::generate_access_token(user, &state.config.secret_key, state.config.jwt_expiration_minutes).unwrap()
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub fn new_pet(name: &str) -> NewPet {
    NewPet {
        name: name.to_string(),
        age: 3,
        species: Species::Perro,
        breed: "Mestizo".to_string(),
        gender: Gender::Hembra,
        size: Size::Medium,
        description: "Muy cariñosa".to_string(),
        location: "Madrid".to_string(),
        contact_phone: "+34600111222".to_string(),
        owner_email: None,
    }
}

pub async fn seed_pet(state: &AppState, owner: &User, name: &str) -> Pet {
    state
        .pets
        .insert(Pet::new(new_pet(name), Vec::new(), owner.id.unwrap()))
        .await
        .unwrap()
}

/// Builds a `multipart/form-data` body; files are `(field, filename, content)`.
pub fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &str)]) -> ((header::HeaderName, String), Vec<u8>) {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            BOUNDARY, name, value
        ));
    }
    for (name, filename, content) in files {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n{}\r\n",
            BOUNDARY, name, filename, content
        ));
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));

    let content_type = (
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={}", BOUNDARY),
    );
    (content_type, body.into_bytes())
}

/// Calls the service and returns status plus JSON body, whether the error came
/// from a handler or from a middleware.
pub async fn send<S, R, B>(app: &S, req: R) -> (StatusCode, Value)
where
    S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    match test::try_call_service(app, req).await {
        Ok(resp) => {
            let status = resp.status();
            let bytes = test::read_body(resp).await;
            (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            let bytes = actix_web::body::to_bytes(resp.into_body()).await.unwrap_or_default();
            (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
        }
    }
}

macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .configure(crate::routes::configure),
        )
        .await
    };
}

pub(crate) use init_app;
