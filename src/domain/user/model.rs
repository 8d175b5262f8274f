use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use mongodb::bson::oid::ObjectId;

use crate::domain::store::Record;
use crate::domain::validation::{self, field, FormFields};
use crate::utils::errors::ApiError;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UserRole {
    #[default]
    #[serde(rename = "usuario")]
    User,
    #[serde(rename = "admin")]
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "usuario",
            UserRole::Admin => "admin",
        }
    }
}

impl FromStr for UserRole {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "usuario" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            _ => Err(ApiError::BadRequest("El rol debe ser usuario o admin".to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "apellido")]
    pub surname: String,
    pub email: String,
    /// bcrypt hash.
    pub password: String,
    #[serde(rename = "rol", default)]
    pub role: UserRole,
    #[serde(rename = "activo", default = "default_true")]
    pub active: bool,
    #[serde(rename = "fotoPerfil", default)]
    pub photo: Option<String>,
    /// SHA-256 of the emailed reset token.
    #[serde(rename = "resetToken", default)]
    pub reset_token: Option<String>,
    #[serde(rename = "resetTokenExpira", default)]
    pub reset_token_expires: Option<DateTime<Utc>>,
    #[serde(rename = "borrado", default)]
    pub deleted: bool,
    #[serde(rename = "borradoEn", default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl User {
    pub fn new(name: String, surname: String, email: String, password_hash: String, role: UserRole) -> Self {
        let now = Utc::now();
        User {
            id: None,
            name,
            surname,
            email,
            password: password_hash,
            role,
            active: true,
            photo: None,
            reset_token: None,
            reset_token_expires: None,
            deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Soft-deleted or deactivated accounts cannot log in.
    pub fn can_log_in(&self) -> bool {
        self.active && !self.deleted
    }
}

impl Record for User {
    const COLLECTION: &'static str = "usuarios";

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
        self.active = false;
    }

    fn restore(&mut self) {
        self.deleted = false;
        self.deleted_at = None;
        self.active = true;
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.email.clone())
    }

    fn duplicate_message() -> &'static str {
        "El email ya está registrado"
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct RegisterUser {
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
    #[serde(rename = "apellido", default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Only honoured on the admin endpoint.
    #[serde(rename = "rol", default)]
    pub role: Option<UserRole>,
}

/// Validated registration data, password still in clear text.
#[derive(Debug, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

impl RegisterUser {
    pub fn validate(self) -> Result<NewUser, ApiError> {
        Ok(NewUser {
            name: validation::required("nombre", self.name.as_deref(), 50)?,
            surname: validation::required("apellido", self.surname.as_deref(), 50)?,
            email: validation::email(self.email.as_deref())?,
            password: validation::password(self.password.as_deref())?,
            role: self.role.unwrap_or_default(),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserLoginReceive {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PasswordRecoveryRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PasswordResetRequest {
    #[serde(default)]
    pub password: Option<String>,
}

/// Partial update of an account, read from a multipart form.
#[derive(Debug, Default, PartialEq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
    pub active: Option<bool>,
}

impl UserChanges {
    /// `rol` and `activo` are read only when `admin_fields` is set.
    pub fn from_fields(fields: &FormFields, admin_fields: bool) -> Result<Self, ApiError> {
        let mut changes = UserChanges {
            name: validation::optional("nombre", field(fields, "nombre"), 50)?,
            surname: validation::optional("apellido", field(fields, "apellido"), 50)?,
            email: field(fields, "email").map(|v| validation::email(Some(v))).transpose()?,
            password: field(fields, "password")
                .filter(|v| !v.is_empty())
                .map(|v| validation::password(Some(v)))
                .transpose()?,
            ..Default::default()
        };

        if admin_fields {
            changes.role = field(fields, "rol").map(str::trim).map(UserRole::from_str).transpose()?;
            changes.active = field(fields, "activo").map(|v| validation::flag("activo", v)).transpose()?;
        }

        Ok(changes)
    }

    /// Applies everything except the password, which must be hashed by the caller.
    pub fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(surname) = &self.surname {
            user.surname = surname.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(active) = self.active {
            user.active = active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> FormFields {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_value(UserRole::Admin).unwrap(), "admin");
        assert_eq!(serde_json::to_value(UserRole::User).unwrap(), "usuario");
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("root".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_register_validation() {
        let valid = RegisterUser {
            name: Some("Ana".into()),
            surname: Some("García".into()),
            email: Some("ANA@example.com".into()),
            password: Some("secreto1".into()),
            role: None,
        }
        .validate()
        .unwrap();

        assert_eq!(valid.email, "ana@example.com");
        assert_eq!(valid.role, UserRole::User);

        let missing = RegisterUser { name: Some("Ana".into()), ..Default::default() }.validate();
        assert_eq!(
            missing.unwrap_err().to_string(),
            "Bad request: El campo apellido es obligatorio"
        );
    }

    #[test]
    fn test_soft_delete_deactivates_and_restore_reactivates() {
        let mut user = User::new("Ana".into(), "García".into(), "ana@example.com".into(), "hash".into(), UserRole::User);
        user.mark_deleted(Utc::now());
        assert!(user.deleted && !user.active && user.deleted_at.is_some());
        assert!(!user.can_log_in());

        user.restore();
        assert!(!user.deleted && user.active && user.deleted_at.is_none());
    }

    #[test]
    fn test_user_changes_ignore_admin_fields_for_profile() {
        let form = fields(&[("nombre", "Eva"), ("rol", "admin"), ("activo", "false")]);

        let profile = UserChanges::from_fields(&form, false).unwrap();
        assert_eq!(profile.name.as_deref(), Some("Eva"));
        assert_eq!(profile.role, None);
        assert_eq!(profile.active, None);

        let admin = UserChanges::from_fields(&form, true).unwrap();
        assert_eq!(admin.role, Some(UserRole::Admin));
        assert_eq!(admin.active, Some(false));
    }

    #[test]
    fn test_user_changes_validate_present_fields() {
        assert!(UserChanges::from_fields(&fields(&[("email", "bad")]), false).is_err());
        assert!(UserChanges::from_fields(&fields(&[("password", "123")]), false).is_err());
        assert!(UserChanges::from_fields(&fields(&[("nombre", " ")]), false).is_err());
        assert_eq!(UserChanges::from_fields(&fields(&[("password", "")]), false).unwrap().password, None);
    }

    #[test]
    fn test_stored_user_deserializes_with_defaults() {
        let json = serde_json::json!({
            "nombre": "Ana",
            "apellido": "García",
            "email": "ana@example.com",
            "password": "hash",
            "createdAt": "2026-01-01T00:00:00Z",
            "updatedAt": "2026-01-01T00:00:00Z"
        });
        let user: User = serde_json::from_value(json).unwrap();

        assert_eq!(user.role, UserRole::User);
        assert!(user.active);
        assert!(!user.deleted);
    }
}
