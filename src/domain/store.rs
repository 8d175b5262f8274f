use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, Bson};
use serde::{de::DeserializeOwned, Serialize};

use crate::utils::errors::ApiError;

/// Fixed page size of every listing endpoint.
pub const PAGE_SIZE: u64 = 6;
/// Highest page whose offset still fits the driver's signed skip.
pub const MAX_PAGE: u64 = i64::MAX as u64 / PAGE_SIZE;

/// A document persisted in its own collection, soft-deleted through `borrado`/`borradoEn`.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    const COLLECTION: &'static str;

    fn id(&self) -> Option<ObjectId>;
    fn set_id(&mut self, id: ObjectId);

    fn is_deleted(&self) -> bool;
    fn mark_deleted(&mut self, at: DateTime<Utc>);
    fn restore(&mut self);
    fn touch(&mut self, at: DateTime<Utc>);

    /// Key that must be unique among stored records, if this record takes part in a uniqueness constraint.
    fn unique_key(&self) -> Option<String> {
        None
    }

    fn duplicate_message() -> &'static str {
        "El registro ya existe"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Case-insensitive literal substring match on a string field.
    Contains(&'static str, String),
    Equals(&'static str, Bson),
}

impl Filter {
    pub fn eq(field: &'static str, value: impl Into<Bson>) -> Self {
        Filter::Equals(field, value.into())
    }

    pub fn contains(field: &'static str, value: impl Into<String>) -> Self {
        Filter::Contains(field, value.into())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    pub page: u64,
    pub limit: u64,
}

impl ListQuery {
    pub fn new(page: u64) -> Self {
        ListQuery {
            filters: Vec::new(),
            page: page.clamp(1, MAX_PAGE),
            limit: PAGE_SIZE,
        }
    }

    pub fn deleted(self, deleted: bool) -> Self {
        self.equals("borrado", deleted)
    }

    pub fn equals(mut self, field: &'static str, value: impl Into<Bson>) -> Self {
        self.filters.push(Filter::eq(field, value));
        self
    }

    /// Adds a substring filter; blank values are ignored.
    pub fn contains(mut self, field: &'static str, value: Option<&str>) -> Self {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.filters.push(Filter::contains(field, value));
        }
        self
    }

    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub total_docs: u64,
    pub limit: u64,
    pub page: u64,
    pub total_pages: u64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
}

impl<T> Page<T> {
    pub fn new(docs: Vec<T>, total_docs: u64, query: &ListQuery) -> Self {
        let total_pages = total_docs.div_ceil(query.limit).max(1);
        Page {
            docs,
            total_docs,
            limit: query.limit,
            page: query.page,
            total_pages,
            has_prev_page: query.page > 1,
            has_next_page: query.page < total_pages,
        }
    }

    pub fn with_docs<U>(self, docs: Vec<U>) -> Page<U> {
        Page {
            docs,
            total_docs: self.total_docs,
            limit: self.limit,
            page: self.page,
            total_pages: self.total_pages,
            has_prev_page: self.has_prev_page,
            has_next_page: self.has_next_page,
        }
    }
}

#[async_trait]
pub trait Store<T: Record>: Send + Sync {
    /// Inserts the record, assigning an id when it has none.
    async fn insert(&self, record: T) -> Result<T, ApiError>;
    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<T>, ApiError>;
    async fn find_one(&self, filters: &[Filter]) -> Result<Option<T>, ApiError>;
    /// Newest first.
    async fn list(&self, query: &ListQuery) -> Result<Page<T>, ApiError>;
    async fn replace(&self, record: &T) -> Result<(), ApiError>;

    async fn save(&self, mut record: T) -> Result<T, ApiError> {
        record.touch(Utc::now());
        self.replace(&record).await?;
        Ok(record)
    }

    async fn soft_delete(&self, mut record: T) -> Result<T, ApiError> {
        let now = Utc::now();
        record.mark_deleted(now);
        record.touch(now);
        self.replace(&record).await?;
        Ok(record)
    }

    async fn restore(&self, mut record: T) -> Result<T, ApiError> {
        record.restore();
        record.touch(Utc::now());
        self.replace(&record).await?;
        Ok(record)
    }
}
