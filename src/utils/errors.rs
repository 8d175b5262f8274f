use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use mongodb::{bson, error::Error as MongoError};
use thiserror::Error;
use bson::ser::Error as BsonError;
use bson::de::Error as BsonDeError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error(transparent)]
    MongoError(#[from] MongoError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] BsonError),

    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] BsonDeError)
}

impl ApiError {
    pub fn forbidden() -> Self {
        ApiError::Forbidden("No tienes permiso para realizar esta acción".to_string())
    }

    fn client_message(&self) -> String {
        match self {
            ApiError::BadRequest(message)
            | ApiError::Unauthorized(message)
            | ApiError::Forbidden(message)
            | ApiError::NotFound(message)
            | ApiError::InternalServerError(message) => message.clone(),
            ApiError::MongoError(_) => "Error en la base de datos".to_string(),
            ApiError::SerializationError(_) | ApiError::DeserializationError(_) => {
                "Formato de datos inválido".to_string()
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalServerError(_) | ApiError::MongoError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::DeserializationError(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        }

        HttpResponse::build(status).json(serde_json::json!({
            "mensaje": self.client_message(),
            "code": status.as_u16()
        }))
    }
}

// ----------------------------- TESTS --------------------------------
