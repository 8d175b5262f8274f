use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use pet_adoption_service::{
    api::state::AppState,
    domain::email::service::EmailService,
    infrastructure::{database::mongo_context::MongoContext, email_service::{LogEmailService, SmtpEmailService}, uploads::PUBLIC_PREFIX},
    routes,
    utils::config::AppConfig,
};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let mailer: Arc<dyn EmailService> = match &config.smtp {
        Some(settings) => match SmtpEmailService::new(settings) {
            Ok(service) => Arc::new(service),
            Err(e) => {
                log::error!("Failed to create SMTP transport: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            log::warn!("SMTP is not configured, outgoing emails will only be logged");
            Arc::new(LogEmailService)
        }
    };

    let state = if config.uses_memory_store() {
        log::warn!("Using the in-memory store, data is lost on restart");
        AppState::memory(config, mailer)
    } else {
        let mongo_context = match MongoContext::init(&config.database_url, &config.database_name).await {
            Ok(context) => context,
            Err(e) => {
                log::error!("Failed to connect to MongoDB: {}", e);
                std::process::exit(1);
            }
        };
        if let Err(e) = mongo_context.ensure_indexes().await {
            log::error!("Failed to create MongoDB indexes: {}", e);
            std::process::exit(1);
        }
        AppState::mongo(config, &mongo_context, mailer)
    };

    state.uploads.ensure_dir().await?;

    let host = state.config.host.clone();
    let port = state.config.port;
    let frontend_url = state.config.frontend_url.clone();
    let upload_dir = state.uploads.dir().to_path_buf();
    let app_state = web::Data::new(state);

    log::info!("🚀 Server running at http://{}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_url)
            .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .configure(routes::configure)
            .service(Files::new(PUBLIC_PREFIX, upload_dir.clone()))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
