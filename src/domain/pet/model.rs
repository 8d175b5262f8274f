use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::domain::store::Record;
use crate::domain::validation::{self, field, FormFields};
use crate::utils::errors::ApiError;

pub const MAX_AGE: i32 = 30;
pub const MAX_PHOTOS: usize = 5;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Perro,
    Gato,
    Otro,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Macho,
    Hembra,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Size {
    #[serde(rename = "pequeño")]
    Small,
    #[serde(rename = "mediano")]
    Medium,
    #[serde(rename = "grande")]
    Large,
}

impl std::str::FromStr for Species {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "perro" => Ok(Species::Perro),
            "gato" => Ok(Species::Gato),
            "otro" => Ok(Species::Otro),
            _ => Err(()),
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "macho" => Ok(Gender::Macho),
            "hembra" => Ok(Gender::Hembra),
            _ => Err(()),
        }
    }
}

impl std::str::FromStr for Size {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pequeño" | "pequeno" => Ok(Size::Small),
            "mediano" => Ok(Size::Medium),
            "grande" => Ok(Size::Large),
            _ => Err(()),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Pet {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "edad")]
    pub age: i32,
    #[serde(rename = "especie")]
    pub species: Species,
    #[serde(rename = "raza")]
    pub breed: String,
    #[serde(rename = "genero")]
    pub gender: Gender,
    #[serde(rename = "tamano")]
    pub size: Size,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "fotos", default)]
    pub photos: Vec<String>,
    #[serde(rename = "ubicacion")]
    pub location: String,
    #[serde(rename = "telefonoContacto")]
    pub contact_phone: String,
    /// Available for adoption.
    #[serde(rename = "estado", default = "available_by_default")]
    pub available: bool,
    #[serde(rename = "usuario")]
    pub owner: ObjectId,
    #[serde(rename = "borrado", default)]
    pub deleted: bool,
    #[serde(rename = "borradoEn", default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

fn available_by_default() -> bool {
    true
}

impl Pet {
    pub fn new(data: NewPet, photos: Vec<String>, owner: ObjectId) -> Self {
        let now = Utc::now();
        Pet {
            id: None,
            name: data.name,
            age: data.age,
            species: data.species,
            breed: data.breed,
            gender: data.gender,
            size: data.size,
            description: data.description,
            photos,
            location: data.location,
            contact_phone: data.contact_phone,
            available: true,
            owner,
            deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for Pet {
    const COLLECTION: &'static str = "mascotas";

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

fn age(value: &str) -> Result<i32, ApiError> {
    let age: i32 = validation::parse_field("edad", value)?;
    if !(0..=MAX_AGE).contains(&age) {
        return Err(ApiError::BadRequest(format!("La edad debe estar entre 0 y {}", MAX_AGE)));
    }
    Ok(age)
}

fn choice<T: std::str::FromStr>(name: &str, value: &str, allowed: &str) -> Result<T, ApiError> {
    value
        .trim()
        .to_lowercase()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("El campo {} debe ser uno de: {}", name, allowed)))
}

fn species(value: &str) -> Result<Species, ApiError> {
    choice("especie", value, "perro, gato, otro")
}

fn gender(value: &str) -> Result<Gender, ApiError> {
    choice("genero", value, "macho, hembra")
}

fn size(value: &str) -> Result<Size, ApiError> {
    choice("tamano", value, "pequeño, mediano, grande")
}

/// Validated fields of a new listing.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPet {
    pub name: String,
    pub age: i32,
    pub species: Species,
    pub breed: String,
    pub gender: Gender,
    pub size: Size,
    pub description: String,
    pub location: String,
    pub contact_phone: String,
    /// Admin-only: publish on behalf of this account.
    pub owner_email: Option<String>,
}

impl NewPet {
    pub fn from_fields(fields: &FormFields) -> Result<Self, ApiError> {
        let required = |name: &str, max: usize| validation::required(name, field(fields, name), max);

        Ok(NewPet {
            name: required("nombre", 50)?,
            age: age(&required("edad", 3)?)?,
            species: species(&required("especie", 10)?)?,
            breed: required("raza", 50)?,
            gender: gender(&required("genero", 10)?)?,
            size: size(&required("tamano", 10)?)?,
            description: required("descripcion", 500)?,
            location: required("ubicacion", 100)?,
            contact_phone: validation::phone(field(fields, "telefonoContacto"))?,
            owner_email: field(fields, "emailUsuario")
                .filter(|v| !v.trim().is_empty())
                .map(|v| validation::email(Some(v)))
                .transpose()?,
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PetChanges {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub species: Option<Species>,
    pub breed: Option<String>,
    pub gender: Option<Gender>,
    pub size: Option<Size>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub contact_phone: Option<String>,
    pub available: Option<bool>,
}

impl PetChanges {
    pub fn from_fields(fields: &FormFields) -> Result<Self, ApiError> {
        let optional = |name: &str, max: usize| validation::optional(name, field(fields, name), max);

        Ok(PetChanges {
            name: optional("nombre", 50)?,
            age: optional("edad", 3)?.map(|v| age(&v)).transpose()?,
            species: optional("especie", 10)?.map(|v| species(&v)).transpose()?,
            breed: optional("raza", 50)?,
            gender: optional("genero", 10)?.map(|v| gender(&v)).transpose()?,
            size: optional("tamano", 10)?.map(|v| size(&v)).transpose()?,
            description: optional("descripcion", 500)?,
            location: optional("ubicacion", 100)?,
            contact_phone: field(fields, "telefonoContacto").map(|v| validation::phone(Some(v))).transpose()?,
            available: field(fields, "estado").map(|v| validation::flag("estado", v)).transpose()?,
        })
    }

    pub fn apply(self, pet: &mut Pet) {
        if let Some(name) = self.name {
            pet.name = name;
        }
        if let Some(age) = self.age {
            pet.age = age;
        }
        if let Some(species) = self.species {
            pet.species = species;
        }
        if let Some(breed) = self.breed {
            pet.breed = breed;
        }
        if let Some(gender) = self.gender {
            pet.gender = gender;
        }
        if let Some(size) = self.size {
            pet.size = size;
        }
        if let Some(description) = self.description {
            pet.description = description;
        }
        if let Some(location) = self.location {
            pet.location = location;
        }
        if let Some(contact_phone) = self.contact_phone {
            pet.contact_phone = contact_phone;
        }
        if let Some(available) = self.available {
            pet.available = available;
        }
    }
}
