//! Response shapes. Stored records never leave the API as-is: ids are rendered
//! as hex strings, password material is dropped, and references are populated.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::Serialize;

use crate::domain::adoption::model::{AdoptionRequest, AdoptionStatus};
use crate::domain::message::model::{Message, MessageKind, MessageStatus};
use crate::domain::pet::model::{Gender, Pet, Size, Species};
use crate::domain::{Store, User, UserRole};
use crate::utils::errors::ApiError;

fn hex(id: Option<ObjectId>) -> String {
    id.map(|id| id.to_hex()).unwrap_or_default()
}

/// A reference resolved to a summary, or the bare id when the target is gone.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Populated<T> {
    Summary(T),
    Id(String),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UserView {
    #[serde(rename = "_id")]
    pub id: String,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub rol: UserRole,
    pub activo: bool,
    #[serde(rename = "fotoPerfil")]
    pub foto_perfil: Option<String>,
    pub borrado: bool,
    #[serde(rename = "borradoEn")]
    pub borrado_en: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        UserView {
            id: hex(user.id),
            nombre: user.name.clone(),
            apellido: user.surname.clone(),
            email: user.email.clone(),
            rol: user.role,
            activo: user.active,
            foto_perfil: user.photo.clone(),
            borrado: user.deleted,
            borrado_en: user.deleted_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    #[serde(rename = "fotoPerfil")]
    pub foto_perfil: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: hex(user.id),
            nombre: user.name.clone(),
            apellido: user.surname.clone(),
            email: user.email.clone(),
            foto_perfil: user.photo.clone(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PetSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub nombre: String,
    pub especie: Species,
    pub raza: String,
    pub fotos: Vec<String>,
    pub estado: bool,
}

impl From<&Pet> for PetSummary {
    fn from(pet: &Pet) -> Self {
        PetSummary {
            id: hex(pet.id),
            nombre: pet.name.clone(),
            especie: pet.species,
            raza: pet.breed.clone(),
            fotos: pet.photos.clone(),
            estado: pet.available,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PetView {
    #[serde(rename = "_id")]
    pub id: String,
    pub nombre: String,
    pub edad: i32,
    pub especie: Species,
    pub raza: String,
    pub genero: Gender,
    pub tamano: Size,
    pub descripcion: String,
    pub fotos: Vec<String>,
    pub ubicacion: String,
    #[serde(rename = "telefonoContacto")]
    pub telefono_contacto: String,
    pub estado: bool,
    pub usuario: Populated<UserSummary>,
    pub borrado: bool,
    #[serde(rename = "borradoEn")]
    pub borrado_en: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AdoptionView {
    #[serde(rename = "_id")]
    pub id: String,
    pub usuario: Populated<UserSummary>,
    pub mascota: Populated<PetSummary>,
    #[serde(rename = "fechaSolicitud")]
    pub fecha_solicitud: DateTime<Utc>,
    pub estado: AdoptionStatus,
    pub mensaje: String,
    pub borrado: bool,
    #[serde(rename = "borradoEn")]
    pub borrado_en: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MessageView {
    #[serde(rename = "_id")]
    pub id: String,
    pub usuario: Populated<UserSummary>,
    pub asunto: String,
    pub contenido: String,
    pub tipo: MessageKind,
    pub estado: MessageStatus,
    pub borrado: bool,
    #[serde(rename = "borradoEn")]
    pub borrado_en: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

pub async fn user_ref(users: &dyn Store<User>, id: &ObjectId) -> Result<Populated<UserSummary>, ApiError> {
    Ok(match users.find_by_id(id).await? {
        Some(user) => Populated::Summary(UserSummary::from(&user)),
        None => Populated::Id(id.to_hex()),
    })
}

pub async fn pet_ref(pets: &dyn Store<Pet>, id: &ObjectId) -> Result<Populated<PetSummary>, ApiError> {
    Ok(match pets.find_by_id(id).await? {
        Some(pet) => Populated::Summary(PetSummary::from(&pet)),
        None => Populated::Id(id.to_hex()),
    })
}

pub async fn pet_view(users: &dyn Store<User>, pet: &Pet) -> Result<PetView, ApiError> {
    Ok(PetView {
        id: hex(pet.id),
        nombre: pet.name.clone(),
        edad: pet.age,
        especie: pet.species,
        raza: pet.breed.clone(),
        genero: pet.gender,
        tamano: pet.size,
        descripcion: pet.description.clone(),
        fotos: pet.photos.clone(),
        ubicacion: pet.location.clone(),
        telefono_contacto: pet.contact_phone.clone(),
        estado: pet.available,
        usuario: user_ref(users, &pet.owner).await?,
        borrado: pet.deleted,
        borrado_en: pet.deleted_at,
        created_at: pet.created_at,
        updated_at: pet.updated_at,
    })
}

pub async fn adoption_view(
    users: &dyn Store<User>,
    pets: &dyn Store<Pet>,
    adoption: &AdoptionRequest,
) -> Result<AdoptionView, ApiError> {
    Ok(AdoptionView {
        id: hex(adoption.id),
        usuario: user_ref(users, &adoption.user).await?,
        mascota: pet_ref(pets, &adoption.pet).await?,
        fecha_solicitud: adoption.requested_at,
        estado: adoption.status,
        mensaje: adoption.message.clone(),
        borrado: adoption.deleted,
        borrado_en: adoption.deleted_at,
        created_at: adoption.created_at,
        updated_at: adoption.updated_at,
    })
}

pub async fn message_view(users: &dyn Store<User>, message: &Message) -> Result<MessageView, ApiError> {
    Ok(MessageView {
        id: hex(message.id),
        usuario: user_ref(users, &message.sender).await?,
        asunto: message.subject.clone(),
        contenido: message.content.clone(),
        tipo: message.kind,
        estado: message.status,
        borrado: message.deleted,
        borrado_en: message.deleted_at,
        created_at: message.created_at,
        updated_at: message.updated_at,
    })
}
