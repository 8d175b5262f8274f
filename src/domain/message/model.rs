use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::domain::store::Record;
use crate::domain::validation;
use crate::utils::errors::ApiError;

pub const MAX_SUBJECT_LEN: usize = 100;
pub const MAX_CONTENT_LEN: usize = 1000;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Consulta,
    Soporte,
    Reporte,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    #[default]
    Abierto,
    EnProceso,
    Cerrado,
}

/// Support or contact message sent by a user.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "usuario")]
    pub sender: ObjectId,
    #[serde(rename = "asunto")]
    pub subject: String,
    #[serde(rename = "contenido")]
    pub content: String,
    #[serde(rename = "tipo", default)]
    pub kind: MessageKind,
    #[serde(rename = "estado", default)]
    pub status: MessageStatus,
    #[serde(rename = "borrado", default)]
    pub deleted: bool,
    #[serde(rename = "borradoEn", default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Message {
    pub fn new(sender: ObjectId, data: NewMessage) -> Self {
        let now = Utc::now();
        Message {
            id: None,
            sender,
            subject: data.subject,
            content: data.content,
            kind: data.kind,
            status: MessageStatus::Abierto,
            deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for Message {
    const COLLECTION: &'static str = "mensajes";

    fn id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted = true;
        self.deleted_at = Some(at);
    }

    fn restore(&mut self) {
        self.deleted = false;
        self.deleted_at = None;
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct CreateMessage {
    #[serde(rename = "asunto", default)]
    pub subject: Option<String>,
    #[serde(rename = "contenido", default)]
    pub content: Option<String>,
    #[serde(rename = "tipo", default)]
    pub kind: Option<MessageKind>,
    #[serde(rename = "emailUsuario", default)]
    pub user_email: Option<String>,
}

#[derive(Debug, PartialEq)]
pub struct NewMessage {
    pub subject: String,
    pub content: String,
    pub kind: MessageKind,
    pub user_email: Option<String>,
}

impl CreateMessage {
    pub fn validate(self) -> Result<NewMessage, ApiError> {
        Ok(NewMessage {
            subject: validation::required("asunto", self.subject.as_deref(), MAX_SUBJECT_LEN)?,
            content: validation::required("contenido", self.content.as_deref(), MAX_CONTENT_LEN)?,
            kind: self.kind.unwrap_or_default(),
            user_email: self
                .user_email
                .filter(|v| !v.trim().is_empty())
                .map(|v| validation::email(Some(&v)))
                .transpose()?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct MessageChanges {
    #[serde(rename = "asunto", default)]
    pub subject: Option<String>,
    #[serde(rename = "contenido", default)]
    pub content: Option<String>,
    #[serde(rename = "tipo", default)]
    pub kind: Option<MessageKind>,
    #[serde(rename = "estado", default)]
    pub status: Option<MessageStatus>,
}

impl MessageChanges {
    pub fn apply(self, message: &mut Message) -> Result<(), ApiError> {
        if let Some(subject) = validation::optional("asunto", self.subject.as_deref(), MAX_SUBJECT_LEN)? {
            message.subject = subject;
        }
        if let Some(content) = validation::optional("contenido", self.content.as_deref(), MAX_CONTENT_LEN)? {
            message.content = content;
        }
        if let Some(kind) = self.kind {
            message.kind = kind;
        }
        if let Some(status) = self.status {
            message.status = status;
        }
        Ok(())
    }
}
