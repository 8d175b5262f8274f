use std::error::Error;
use std::sync::LazyLock;
use serde::{Deserialize, Serialize};
use mongodb::{bson::{doc, Document}, options::{ClientOptions, IndexOptions}, Client, Collection, Database, IndexModel};
use regex::Regex;

use crate::domain::{AdoptionRequest, Record, User};

static MONGO_URI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^mongodb(\+srv)?://([^/\s]+)(/.*)?$").expect("valid mongo uri regex"));

#[derive(Clone, Debug)]
pub struct MongoContext {
    db: Database
}

impl MongoContext {

    pub async fn init(uri: &str, db_name: &str) -> Result<MongoContext, Box<dyn Error>> {
        Self::validate_mongo_uri(uri)?;

        let mut client_options = ClientOptions::parse(uri)
            .await?;

        client_options.app_name = Some("PetAdoptionService".to_string());

        let client = Client::with_options(client_options)
            .map_err(|e| format!("Failed to create MongoDB client: {}", e))?;

        client.list_database_names()
            .await
            .map_err(|e| format!("Failed to connect to MongoDB: {}", e))?;

        let db = client.database(db_name);
        log::info!("Connected to MongoDB database: {}", db_name);

        Ok(MongoContext { db })
    }

    pub fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync + Unpin + for<'de> Deserialize<'de> + Serialize,
    {
        self.db.collection::<T>(name)
    }

    /// Unique email per account, and at most one live adoption request per (user, pet).
    pub async fn ensure_indexes(&self) -> Result<(), mongodb::error::Error> {
        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection::<Document>(User::COLLECTION)
            .create_index(unique_email)
            .await?;

        let live_adoption = IndexModel::builder()
            .keys(doc! { "usuario": 1, "mascota": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .partial_filter_expression(doc! { "borrado": false })
                    .build(),
            )
            .build();
        self.collection::<Document>(AdoptionRequest::COLLECTION)
            .create_index(live_adoption)
            .await?;

        log::info!("MongoDB indexes ensured");
        Ok(())
    }

    fn validate_mongo_uri(uri: &str) -> Result<(), Box<dyn Error>> {
        let trimmed_uri = uri.trim();
        if trimmed_uri.is_empty() {
            return Err("Invalid MongoDB URI: cannot be empty or whitespace".into());
        }

        let host_part = if let Some(rest) = trimmed_uri.strip_prefix("mongodb://") {
            rest
        } else if let Some(rest) = trimmed_uri.strip_prefix("mongodb+srv://") {
            rest
        } else {
            return Err(format!("Invalid MongoDB URI: must start with 'mongodb://' or 'mongodb+srv://'. Got: {}", uri).into());
        };

        if host_part.trim().is_empty() {
            return Err("Invalid MongoDB URI: missing host after protocol".into());
        }

        if uri.contains(char::is_whitespace) {
            return Err("Invalid MongoDB URI: cannot contain whitespace".into());
        }

        if !MONGO_URI_RE.is_match(trimmed_uri) {
            return Err(format!("Invalid MongoDB URI format. Expected format: mongodb://host[:port][/database] or mongodb+srv://host[/database]. Got: {}", uri).into());
        }

        Ok(())
    }

}
