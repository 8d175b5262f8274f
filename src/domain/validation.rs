use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;

use mongodb::bson::oid::ObjectId;
use regex::Regex;

use crate::utils::errors::ApiError;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn required(field: &str, value: Option<&str>, max_len: usize) -> Result<String, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => max_length(field, value, max_len),
        None => Err(ApiError::BadRequest(format!("El campo {} es obligatorio", field))),
    }
}

/// Like [`required`] but a missing value is fine; a present one must not be blank.
pub fn optional(field: &str, value: Option<&str>, max_len: usize) -> Result<Option<String>, ApiError> {
    value.map(|v| required(field, Some(v), max_len)).transpose()
}

pub fn max_length(field: &str, value: &str, max_len: usize) -> Result<String, ApiError> {
    if value.chars().count() > max_len {
        return Err(ApiError::BadRequest(format!(
            "El campo {} no puede superar {} caracteres",
            field, max_len
        )));
    }
    Ok(value.to_string())
}

/// Trims and lower-cases the address after checking its shape.
pub fn email(value: Option<&str>) -> Result<String, ApiError> {
    let value = required("email", value, 100)?.to_lowercase();
    if !EMAIL_RE.is_match(&value) {
        return Err(ApiError::BadRequest("El email no es válido".to_string()));
    }
    Ok(value)
}

pub fn password(value: Option<&str>) -> Result<String, ApiError> {
    let value = value.unwrap_or_default();
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest("El campo password es obligatorio".to_string()));
    }
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "La contraseña debe tener al menos {} caracteres",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(value.to_string())
}

/// 7 to 15 digits with an optional leading `+`; spaces and dashes are dropped.
pub fn phone(value: Option<&str>) -> Result<String, ApiError> {
    let raw = required("telefonoContacto", value, 25)?;
    let cleaned: String = raw.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);

    if !(7..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::BadRequest("El teléfono de contacto no es válido".to_string()));
    }
    Ok(cleaned)
}

pub fn parse_field<T: FromStr>(field: &str, value: &str) -> Result<T, ApiError> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("El campo {} tiene un valor inválido", field)))
}

pub fn object_id(field: &str, value: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(value.trim())
        .map_err(|_| ApiError::BadRequest(format!("El identificador de {} no es válido", field)))
}

pub fn flag(field: &str, value: &str) -> Result<bool, ApiError> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ApiError::BadRequest(format!("El campo {} debe ser true o false", field))),
    }
}

/// Text fields of a submitted form, looked up by their wire names.
pub type FormFields = HashMap<String, String>;

pub fn field<'a>(fields: &'a FormFields, name: &str) -> Option<&'a str> {
    fields.get(name).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_blank_values() {
        assert!(required("nombre", None, 10).is_err());
        assert!(required("nombre", Some("   "), 10).is_err());
        assert_eq!(required("nombre", Some(" Luna "), 10).unwrap(), "Luna");
    }

    #[test]
    fn test_max_length_counts_characters() {
        assert!(max_length("nombre", "ñandú", 5).is_ok());
        let err = max_length("nombre", "abcdef", 5).unwrap_err();
        assert_eq!(err.to_string(), "Bad request: El campo nombre no puede superar 5 caracteres");
    }

    #[test]
    fn test_email_is_normalized() {
        assert_eq!(email(Some("  Ana@Example.COM ")).unwrap(), "ana@example.com");
        assert!(email(Some("not-an-email")).is_err());
        assert!(email(Some("a@b")).is_err());
    }

    #[test]
    fn test_password_minimum_length() {
        assert!(password(Some("12345")).is_err());
        assert!(password(Some("123456")).is_ok());
        assert!(password(None).is_err());
    }

    #[test]
    fn test_phone_formats() {
        assert_eq!(phone(Some("+34 600-123-456")).unwrap(), "+34600123456");
        assert!(phone(Some("12345")).is_err());
        assert!(phone(Some("600abc123")).is_err());
    }

    #[test]
    fn test_flag_values() {
        assert!(flag("estado", "true").unwrap());
        assert!(!flag("estado", "0").unwrap());
        assert!(flag("estado", "yes").is_err());
    }

    #[test]
    fn test_object_id_parsing() {
        let id = ObjectId::new();
        assert_eq!(object_id("mascota", &id.to_hex()).unwrap(), id);
        assert!(object_id("mascota", "nope").is_err());
    }
}
