use actix_web::{get, web, Responder};

use crate::api::handlers::{adoption_handlers, auth_handlers, message_handlers, pet_handlers, user_handlers};
use crate::utils::errors::ApiError;
use crate::utils::security::jwt::JwtMiddleware;

#[get("/")]
async fn entry_point() -> impl Responder {
    "API de adopción de mascotas. Regístrate en /auth/registro para empezar."
}

/// Registers every endpoint; resource families other than public `/auth` routes sit behind [`JwtMiddleware`].
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(entry_point)
        .configure(auth_routes)
        .configure(user_routes)
        .configure(pet_routes)
        .configure(adoption_routes)
        .configure(message_routes);
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::BadRequest(format!("Cuerpo JSON inválido: {}", err)).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        ApiError::BadRequest(format!("Parámetros de consulta inválidos: {}", err)).into()
    })
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/registro", web::post().to(auth_handlers::register))
            .route("/login", web::post().to(auth_handlers::login))
            .route("/recuperar", web::post().to(auth_handlers::request_password_reset))
            .route("/restablecer/{token}", web::post().to(auth_handlers::reset_password))
            .service(
                web::resource("/logout")
                    .wrap(JwtMiddleware)
                    .route(web::post().to(auth_handlers::logout))
            )
            .service(
                web::resource("/perfil")
                    .wrap(JwtMiddleware)
                    .route(web::get().to(auth_handlers::get_profile))
                    .route(web::patch().to(auth_handlers::update_profile))
            )
    );
}

pub fn user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin/users")
            .wrap(JwtMiddleware)
            .route("", web::get().to(user_handlers::list_users))
            .route("", web::post().to(user_handlers::create_user))
            .route("/{id}", web::get().to(user_handlers::get_user))
            .route("/{id}", web::patch().to(user_handlers::update_user))
            .route("/{id}", web::delete().to(user_handlers::delete_user))
            .route("/{id}/restaurar", web::patch().to(user_handlers::restore_user))
    );
}

pub fn pet_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/mascotas")
            .wrap(JwtMiddleware)
            .route("", web::get().to(pet_handlers::list_pets))
            .route("", web::post().to(pet_handlers::create_pet))
            .route("/{id}", web::get().to(pet_handlers::get_pet))
            .route("/{id}", web::patch().to(pet_handlers::update_pet))
            .route("/{id}", web::delete().to(pet_handlers::delete_pet))
            .route("/{id}/restaurar", web::patch().to(pet_handlers::restore_pet))
    );
}

pub fn adoption_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/adopciones")
            .wrap(JwtMiddleware)
            .route("", web::get().to(adoption_handlers::list_adoptions))
            .route("", web::post().to(adoption_handlers::create_adoption))
            .route("/{id}", web::get().to(adoption_handlers::get_adoption))
            .route("/{id}", web::patch().to(adoption_handlers::update_adoption))
            .route("/{id}", web::delete().to(adoption_handlers::delete_adoption))
            .route("/{id}/restaurar", web::patch().to(adoption_handlers::restore_adoption))
    );
}

pub fn message_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/mensajes")
            .wrap(JwtMiddleware)
            .route("", web::get().to(message_handlers::list_messages))
            .route("", web::post().to(message_handlers::create_message))
            .route("/{id}", web::get().to(message_handlers::get_message))
            .route("/{id}", web::patch().to(message_handlers::update_message))
            .route("/{id}", web::delete().to(message_handlers::delete_message))
            .route("/{id}/restaurar", web::patch().to(message_handlers::restore_message))
    );
}
