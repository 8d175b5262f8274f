use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::Collection;

use crate::domain::store::{Filter, ListQuery, Page, Record, Store};
use crate::infrastructure::database::mongo_context::MongoContext;
use crate::utils::errors::ApiError;

const DUPLICATE_KEY: i32 = 11000;

pub struct MongoStore<T: Record> {
    collection: Collection<T>
}

impl<T: Record> MongoStore<T> {
    pub fn new(context: &MongoContext) -> Self {
        Self {
            collection: context.collection(T::COLLECTION)
        }
    }
}

/// Substring filters become case-insensitive regexes over the escaped value.
pub fn filter_document(filters: &[Filter]) -> Document {
    let mut document = Document::new();
    for filter in filters {
        match filter {
            Filter::Contains(field, value) => {
                document.insert(*field, doc! { "$regex": regex::escape(value), "$options": "i" });
            }
            Filter::Equals(field, value) => {
                document.insert(*field, value.clone());
            }
        }
    }
    document
}

fn is_duplicate_key(error: &MongoError) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(failure)) if failure.code == DUPLICATE_KEY
    )
}

fn write_error<T: Record>(error: MongoError) -> ApiError {
    if is_duplicate_key(&error) {
        ApiError::BadRequest(T::duplicate_message().to_string())
    } else {
        ApiError::MongoError(error)
    }
}

#[async_trait]
impl<T: Record> Store<T> for MongoStore<T> {

    async fn insert(&self, mut record: T) -> Result<T, ApiError> {
        if record.id().is_none() {
            record.set_id(ObjectId::new());
        }
        self.collection
            .insert_one(&record)
            .await
            .map_err(write_error::<T>)?;
        Ok(record)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<T>, ApiError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find_one(&self, filters: &[Filter]) -> Result<Option<T>, ApiError> {
        Ok(self.collection.find_one(filter_document(filters)).await?)
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<T>, ApiError> {
        let filter = filter_document(&query.filters);
        let total = self.collection.count_documents(filter.clone()).await?;

        let docs: Vec<T> = self.collection
            .find(filter)
            .sort(doc! { "_id": -1 })
            .skip(query.skip())
            .limit(query.limit as i64)
            .await?
            .try_collect()
            .await?;

        Ok(Page::new(docs, total, query))
    }

    async fn replace(&self, record: &T) -> Result<(), ApiError> {
        let id = record
            .id()
            .ok_or_else(|| ApiError::InternalServerError(format!("{} record without _id", T::COLLECTION)))?;

        let result = self.collection
            .replace_one(doc! { "_id": id }, record)
            .await
            .map_err(write_error::<T>)?;

        if result.matched_count == 0 {
            return Err(ApiError::NotFound(format!("Documento {} no encontrado", id.to_hex())));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::Bson;

    #[test]
    fn test_filter_document_escapes_regex() {
        let owner = ObjectId::new();
        let document = filter_document(&[
            Filter::contains("nombre", "c++ (mini)"),
            Filter::eq("borrado", false),
            Filter::eq("usuario", owner),
        ]);

        assert_eq!(
            document.get_document("nombre").unwrap(),
            &doc! { "$regex": r"c\+\+ \(mini\)", "$options": "i" }
        );
        assert_eq!(document.get("borrado"), Some(&Bson::Boolean(false)));
        assert_eq!(document.get("usuario"), Some(&Bson::ObjectId(owner)));
    }

    #[test]
    fn test_empty_filters_match_everything() {
        assert!(filter_document(&[]).is_empty());
    }
}
