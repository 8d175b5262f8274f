use std::collections::HashMap;

use mongodb::bson::oid::ObjectId;

use crate::domain::validation;
use crate::utils::errors::ApiError;

/// Query string of a listing endpoint.
#[derive(Debug, Default, Clone)]
pub struct ListParams(HashMap<String, String>);

impl From<HashMap<String, String>> for ListParams {
    fn from(params: HashMap<String, String>) -> Self {
        ListParams(params)
    }
}

impl ListParams {
    /// 1-based; anything missing, non-numeric or below 1 reads as 1.
    pub fn page(&self) -> u64 {
        self.0
            .get("page")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(1)
            .max(1)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Switches such as `borradas=true`; anything but `true`/`1` is off.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.text(key).map(str::trim), Some("true") | Some("1"))
    }

    pub fn bool(&self, key: &str) -> Result<Option<bool>, ApiError> {
        match self.text(key).map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => validation::flag(key, value).map(Some),
            None => Ok(None),
        }
    }

    pub fn object_id(&self, key: &str) -> Result<Option<ObjectId>, ApiError> {
        match self.text(key).map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => validation::object_id(key, value).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ListQuery, MAX_PAGE};

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>()
            .into()
    }

    #[test]
    fn test_page_falls_back_to_one() {
        assert_eq!(params(&[]).page(), 1);
        assert_eq!(params(&[("page", "0")]).page(), 1);
        assert_eq!(params(&[("page", "-3")]).page(), 1);
        assert_eq!(params(&[("page", "dos")]).page(), 1);
        assert_eq!(params(&[("page", "4")]).page(), 4);
        assert_eq!(ListQuery::new(params(&[("page", "18446744073709551615")]).page()).page, MAX_PAGE);
    }

    #[test]
    fn test_flags_and_typed_values() {
        let p = params(&[("borradas", "true"), ("estado", "false"), ("usuario", "nope")]);

        assert!(p.flag("borradas"));
        assert!(!p.flag("inactivas"));
        assert_eq!(p.bool("estado").unwrap(), Some(false));
        assert_eq!(p.bool("otro").unwrap(), None);
        assert!(p.object_id("usuario").is_err());
    }
}
