use std::sync::Arc;

use crate::domain::{email::service::EmailService, AdoptionRequest, Message, Pet, Store, User};
use crate::infrastructure::{database::mongo_context::MongoContext, memory::MemoryStore, mongodb::MongoStore, uploads::UploadStore};
use crate::utils::{config::AppConfig, security::revocation::TokenBlacklist};

/// Everything a handler needs, shared across workers behind `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn Store<User>>,
    pub pets: Arc<dyn Store<Pet>>,
    pub adoptions: Arc<dyn Store<AdoptionRequest>>,
    pub messages: Arc<dyn Store<Message>>,
    pub mailer: Arc<dyn EmailService>,
    pub uploads: UploadStore,
    pub blacklist: Arc<TokenBlacklist>,
}

impl AppState {
    pub fn mongo(config: AppConfig, db: &MongoContext, mailer: Arc<dyn EmailService>) -> Self {
        AppState {
            users: Arc::new(MongoStore::<User>::new(db)),
            pets: Arc::new(MongoStore::<Pet>::new(db)),
            adoptions: Arc::new(MongoStore::<AdoptionRequest>::new(db)),
            messages: Arc::new(MongoStore::<Message>::new(db)),
            uploads: UploadStore::new(config.upload_dir.clone()),
            config: Arc::new(config),
            mailer,
            blacklist: Arc::new(TokenBlacklist::new()),
        }
    }

    /// Non-persistent backend selected by `DATABASE_URL=memory://`.
    pub fn memory(config: AppConfig, mailer: Arc<dyn EmailService>) -> Self {
        AppState {
            users: Arc::new(MemoryStore::<User>::new()),
            pets: Arc::new(MemoryStore::<Pet>::new()),
            adoptions: Arc::new(MemoryStore::<AdoptionRequest>::new()),
            messages: Arc::new(MemoryStore::<Message>::new()),
            uploads: UploadStore::new(config.upload_dir.clone()),
            config: Arc::new(config),
            mailer,
            blacklist: Arc::new(TokenBlacklist::new()),
        }
    }
}
