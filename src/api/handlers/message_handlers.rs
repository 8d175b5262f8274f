use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::api::handlers::{find_live, find_record, message, parse_id, resolve_owner};
use crate::api::query::ListParams;
use crate::api::state::AppState;
use crate::api::views::message_view;
use crate::domain::message::model::{CreateMessage, MessageChanges};
use crate::domain::{ListQuery, Message};
use crate::utils::errors::ApiError;
use crate::utils::security::jwt::AuthUser;

const MESSAGE_NOT_FOUND: &str = "Mensaje no encontrado";

pub async fn list_messages(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<HashMap<String, String>>
) -> Result<HttpResponse, ApiError> {
    let params = ListParams::from(query.into_inner());

    let mut list = ListQuery::new(params.page())
        .deleted(params.flag("borradas"))
        .contains("asunto", params.text("asunto"))
        .contains("contenido", params.text("contenido"))
        .contains("tipo", params.text("tipo"))
        .contains("estado", params.text("estado"));

    if !auth.is_admin() {
        list = list.equals("usuario", auth.id);
    }

    let page = state.messages.list(&list).await?;
    let mut docs = Vec::with_capacity(page.docs.len());
    for msg in &page.docs {
        docs.push(message_view(&*state.users, msg).await?);
    }

    Ok(HttpResponse::Ok().json(page.with_docs(docs)))
}

pub async fn get_message(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>
) -> Result<HttpResponse, ApiError> {
    let msg = find_record(&*state.messages, &parse_id(&path)?, MESSAGE_NOT_FOUND).await?;
    auth.authorize(&msg.sender)?;

    Ok(HttpResponse::Ok().json(message_view(&*state.users, &msg).await?))
}

pub async fn create_message(
    state: web::Data<AppState>,
    auth: AuthUser,
    payload: web::Json<CreateMessage>
) -> Result<HttpResponse, ApiError> {
    let data = payload.into_inner().validate()?;
    let sender = resolve_owner(&state, &auth, data.user_email.as_deref()).await?;

    let msg = state.messages.insert(Message::new(sender, data)).await?;
    log::info!("Message \"{}\" received from {}", msg.subject, auth.user.email);

    Ok(HttpResponse::Created().json(message_view(&*state.users, &msg).await?))
}

pub async fn update_message(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    payload: web::Json<MessageChanges>
) -> Result<HttpResponse, ApiError> {
    let mut msg = find_live(&*state.messages, &parse_id(&path)?, MESSAGE_NOT_FOUND).await?;
    auth.authorize(&msg.sender)?;

    payload.into_inner().apply(&mut msg)?;
    let msg = state.messages.save(msg).await?;

    Ok(HttpResponse::Ok().json(message_view(&*state.users, &msg).await?))
}

pub async fn delete_message(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>
) -> Result<HttpResponse, ApiError> {
    let msg = find_live(&*state.messages, &parse_id(&path)?, MESSAGE_NOT_FOUND).await?;
    auth.authorize(&msg.sender)?;

    state.messages.soft_delete(msg).await?;

    Ok(HttpResponse::Ok().json(message("Mensaje eliminado correctamente")))
}

pub async fn restore_message(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>
) -> Result<HttpResponse, ApiError> {
    let msg = find_record(&*state.messages, &parse_id(&path)?, MESSAGE_NOT_FOUND).await?;
    auth.authorize(&msg.sender)?;
    if !msg.deleted {
        return Err(ApiError::BadRequest("El mensaje no está eliminado".to_string()));
    }

    let msg = state.messages.restore(msg).await?;

    Ok(HttpResponse::Ok().json(json!({
        "mensaje": "Mensaje restaurado correctamente",
        "mensajeRestaurado": message_view(&*state.users, &msg).await?
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};
    use serde_json::Value;

    use crate::domain::message::model::NewMessage;
    use crate::domain::{MessageKind, User, UserRole};
    use crate::test_support::{bearer, init_app, seed_user, send, test_context, token_for};

    async fn seed_message(state: &AppState, sender: &User, subject: &str) -> Message {
        let data = NewMessage {
            subject: subject.to_string(),
            content: "¿Cuándo puedo visitar el refugio?".to_string(),
            kind: MessageKind::Consulta,
            user_email: None,
        };
        state.messages.insert(Message::new(sender.id.unwrap(), data)).await.unwrap()
    }

    fn post(token: &str, body: Value) -> test::TestRequest {
        test::TestRequest::post().uri("/mensajes").insert_header(bearer(token)).set_json(body)
    }

    #[actix_web::test]
    async fn test_create_message_defaults() {
        let ctx = test_context();
        let ana = seed_user(&ctx.state, "ana@example.com", UserRole::User).await;
        let token = token_for(&ctx.state, &ana);
        let app = init_app!(ctx.state);

        let (status, body) = send(&app, post(&token, json!({"asunto": "Visita", "contenido": "Hola"})).to_request()).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["tipo"], "consulta");
        assert_eq!(body["estado"], "abierto");
        assert_eq!(body["usuario"]["email"], "ana@example.com");

        let (status, body) = send(&app, post(&token, json!({"contenido": "Hola"})).to_request()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["mensaje"], "El campo asunto es obligatorio");

        let (status, _) = send(&app, post(&token, json!({"asunto": "a", "contenido": "b", "tipo": "queja"})).to_request()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_list_is_scoped_and_filtered() {
        let ctx = test_context();
        let ana = seed_user(&ctx.state, "ana@example.com", UserRole::User).await;
        let luis = seed_user(&ctx.state, "luis@example.com", UserRole::User).await;
        let admin = seed_user(&ctx.state, "admin@example.com", UserRole::Admin).await;
        seed_message(&ctx.state, &ana, "Visita al refugio").await;
        seed_message(&ctx.state, &ana, "Vacunas").await;
        seed_message(&ctx.state, &luis, "Otra visita").await;
        let (ana_token, admin_token) = (token_for(&ctx.state, &ana), token_for(&ctx.state, &admin));
        let app = init_app!(ctx.state);

        let get = |uri: &str, token: &str| test::TestRequest::get().uri(uri).insert_header(bearer(token)).to_request();

        assert_eq!(send(&app, get("/mensajes", &ana_token)).await.1["totalDocs"], 2);
        assert_eq!(send(&app, get("/mensajes", &admin_token)).await.1["totalDocs"], 3);
        assert_eq!(send(&app, get("/mensajes?asunto=VISITA", &admin_token)).await.1["totalDocs"], 2);
        assert_eq!(send(&app, get("/mensajes?asunto=visita", &ana_token)).await.1["totalDocs"], 1);
        assert_eq!(send(&app, get("/mensajes?asunto=.*", &admin_token)).await.1["totalDocs"], 0);
    }

    #[actix_web::test]
    async fn test_owner_or_admin_may_change_messages() {
        let ctx = test_context();
        let ana = seed_user(&ctx.state, "ana@example.com", UserRole::User).await;
        let luis = seed_user(&ctx.state, "luis@example.com", UserRole::User).await;
        let admin = seed_user(&ctx.state, "admin@example.com", UserRole::Admin).await;
        let msg = seed_message(&ctx.state, &ana, "Visita").await;
        let (luis_token, admin_token) = (token_for(&ctx.state, &luis), token_for(&ctx.state, &admin));
        let app = init_app!(ctx.state);
        let uri = format!("/mensajes/{}", msg.id.unwrap().to_hex());

        let patch = |token: &str| {
            test::TestRequest::patch()
                .uri(&uri)
                .insert_header(bearer(token))
                .set_json(json!({"estado": "en_proceso"}))
                .to_request()
        };
        assert_eq!(send(&app, patch(&luis_token)).await.0, StatusCode::FORBIDDEN);

        let (status, body) = send(&app, patch(&admin_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["estado"], "en_proceso");

        let req = test::TestRequest::delete().uri(&uri).insert_header(bearer(&luis_token)).to_request();
        assert_eq!(send(&app, req).await.0, StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_soft_delete_and_restore() {
        let ctx = test_context();
        let ana = seed_user(&ctx.state, "ana@example.com", UserRole::User).await;
        let msg = seed_message(&ctx.state, &ana, "Visita").await;
        let token = token_for(&ctx.state, &ana);
        let app = init_app!(ctx.state);
        let uri = format!("/mensajes/{}", msg.id.unwrap().to_hex());
        let restore_uri = format!("{}/restaurar", uri);

        let req = test::TestRequest::patch().uri(&restore_uri).insert_header(bearer(&token)).to_request();
        assert_eq!(send(&app, req).await.0, StatusCode::BAD_REQUEST);

        let req = test::TestRequest::delete().uri(&uri).insert_header(bearer(&token)).to_request();
        assert_eq!(send(&app, req).await.0, StatusCode::OK);

        let stored = ctx.state.messages.find_by_id(&msg.id.unwrap()).await.unwrap().unwrap();
        assert!(stored.deleted);
        assert!(stored.deleted_at.is_some());

        let list = test::TestRequest::get().uri("/mensajes").insert_header(bearer(&token)).to_request();
        assert_eq!(send(&app, list).await.1["totalDocs"], 0);
        let list = test::TestRequest::get().uri("/mensajes?borradas=true").insert_header(bearer(&token)).to_request();
        assert_eq!(send(&app, list).await.1["totalDocs"], 1);

        let req = test::TestRequest::delete().uri(&uri).insert_header(bearer(&token)).to_request();
        assert_eq!(send(&app, req).await.0, StatusCode::NOT_FOUND);

        let req = test::TestRequest::patch().uri(&restore_uri).insert_header(bearer(&token)).to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mensajeRestaurado"]["borrado"], false);
    }
}
