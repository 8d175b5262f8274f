use async_trait::async_trait;
use mongodb::bson::{self, oid::ObjectId, Bson, Document};
use tokio::sync::RwLock;

use crate::domain::store::{Filter, ListQuery, Page, Record, Store};
use crate::utils::errors::ApiError;

/// Process-local `Store` used with `DATABASE_URL=memory://` and in tests.
///
/// Records are kept in insertion order; uniqueness is checked under the write lock.
pub struct MemoryStore<T: Record> {
    records: RwLock<Vec<T>>,
}

impl<T: Record> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Record> MemoryStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn field_matches(document: &Document, filter: &Filter) -> bool {
    match filter {
        Filter::Contains(field, needle) => match document.get(*field) {
            Some(Bson::String(value)) => value.to_lowercase().contains(&needle.to_lowercase()),
            _ => false,
        },
        Filter::Equals(field, expected) => match document.get(*field) {
            Some(value) => value == expected,
            None => *expected == Bson::Null,
        },
    }
}

/// Evaluates filters against the record's stored (BSON) form, as the database would.
pub fn matches<T: Record>(record: &T, filters: &[Filter]) -> Result<bool, ApiError> {
    if filters.is_empty() {
        return Ok(true);
    }
    let document = bson::to_document(record)?;
    Ok(filters.iter().all(|filter| field_matches(&document, filter)))
}

fn check_unique<T: Record>(records: &[T], candidate: &T) -> Result<(), ApiError> {
    let Some(key) = candidate.unique_key() else {
        return Ok(());
    };

    let clash = records
        .iter()
        .any(|other| other.id() != candidate.id() && other.unique_key().as_deref() == Some(key.as_str()));

    if clash {
        return Err(ApiError::BadRequest(T::duplicate_message().to_string()));
    }
    Ok(())
}

#[async_trait]
impl<T: Record> Store<T> for MemoryStore<T> {

    async fn insert(&self, mut record: T) -> Result<T, ApiError> {
        if record.id().is_none() {
            record.set_id(ObjectId::new());
        }

        let mut records = self.records.write().await;
        check_unique(&records, &record)?;
        records.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<T>, ApiError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id().as_ref() == Some(id)).cloned())
    }

    async fn find_one(&self, filters: &[Filter]) -> Result<Option<T>, ApiError> {
        let records = self.records.read().await;
        for record in records.iter() {
            if matches(record, filters)? {
                return Ok(Some(record.clone()));
            }
        }
        Ok(None)
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<T>, ApiError> {
        let records = self.records.read().await;

        let mut matching = Vec::new();
        for record in records.iter().rev() {
            if matches(record, &query.filters)? {
                matching.push(record);
            }
        }

        let total = matching.len() as u64;
        let docs = matching
            .into_iter()
            .skip(query.skip() as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(Page::new(docs, total, query))
    }

    async fn replace(&self, record: &T) -> Result<(), ApiError> {
        let id = record
            .id()
            .ok_or_else(|| ApiError::InternalServerError(format!("{} record without _id", T::COLLECTION)))?;

        let mut records = self.records.write().await;
        check_unique(&records, record)?;

        let slot = records
            .iter_mut()
            .find(|r| r.id() == Some(id))
            .ok_or_else(|| ApiError::NotFound(format!("Documento {} no encontrado", id.to_hex())))?;
        *slot = record.clone();
        Ok(())
    }
}
