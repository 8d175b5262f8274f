use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::domain::store::Record;
use crate::domain::validation;
use crate::utils::errors::ApiError;

pub const MAX_MESSAGE_LEN: usize = 500;

/// Any status may be set from any other.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdoptionStatus {
    #[default]
    Pendiente,
    Aceptada,
    Rechazada,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AdoptionRequest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "usuario")]
    pub user: ObjectId,
    #[serde(rename = "mascota")]
    pub pet: ObjectId,
    #[serde(rename = "fechaSolicitud")]
    pub requested_at: DateTime<Utc>,
    #[serde(rename = "estado", default)]
    pub status: AdoptionStatus,
    #[serde(rename = "mensaje", default)]
    pub message: String,
    #[serde(rename = "borrado", default)]
    pub deleted: bool,
    #[serde(rename = "borradoEn", default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl AdoptionRequest {
    pub fn new(user: ObjectId, pet: ObjectId, message: String) -> Self {
        let now = Utc::now();
        AdoptionRequest {
            id: None,
            user,
            pet,
            requested_at: now,
            status: AdoptionStatus::Pendiente,
            message,
            deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn pair_key(user: &ObjectId, pet: &ObjectId) -> String {
        format!("{}:{}", user.to_hex(), pet.to_hex())
    }
}

impl Record for AdoptionRequest {
    const COLLECTION: &'static str = "adopciones";

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

    /// One live request per (user, pet); deleted ones do not count.
    fn unique_key(&self) -> Option<String> {
        (!self.deleted).then(|| Self::pair_key(&self.user, &self.pet))
    }

    fn duplicate_message() -> &'static str {
        "Ya existe una solicitud de adopción activa para esta mascota"
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct CreateAdoption {
    #[serde(rename = "mascota", default)]
    pub pet: Option<String>,
    #[serde(rename = "mensaje", default)]
    pub message: Option<String>,
    #[serde(rename = "emailUsuario", default)]
    pub user_email: Option<String>,
}

#[derive(Debug, PartialEq)]
pub struct NewAdoption {
    pub pet: ObjectId,
    pub message: String,
    pub user_email: Option<String>,
}

impl CreateAdoption {
    pub fn validate(self) -> Result<NewAdoption, ApiError> {
        let pet = validation::required("mascota", self.pet.as_deref(), 24)?;
        Ok(NewAdoption {
            pet: validation::object_id("mascota", &pet)?,
            message: validation::max_length("mensaje", self.message.as_deref().unwrap_or("").trim(), MAX_MESSAGE_LEN)?,
            user_email: self
                .user_email
                .filter(|v| !v.trim().is_empty())
                .map(|v| validation::email(Some(&v)))
                .transpose()?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct AdoptionChanges {
    #[serde(rename = "estado", default)]
    pub status: Option<AdoptionStatus>,
    #[serde(rename = "mensaje", default)]
    pub message: Option<String>,
}

impl AdoptionChanges {
    pub fn apply(self, adoption: &mut AdoptionRequest) -> Result<(), ApiError> {
        if let Some(message) = self.message {
            adoption.message = validation::max_length("mensaje", message.trim(), MAX_MESSAGE_LEN)?;
        }
        if let Some(status) = self.status {
            adoption.status = status;
        }
        Ok(())
    }
}
