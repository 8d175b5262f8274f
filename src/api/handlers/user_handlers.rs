use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::api::handlers::{find_live, find_record, find_user_by_email, hash_password, message, parse_id};
use crate::api::multipart::FormData;
use crate::api::query::ListParams;
use crate::api::state::AppState;
use crate::api::views::UserView;
use crate::domain::user::model::{NewUser, RegisterUser, UserChanges};
use crate::domain::{ListQuery, Record, User};
use crate::utils::errors::ApiError;
use crate::utils::security::jwt::AuthUser;

const USER_NOT_FOUND: &str = "Usuario no encontrado";

/// Hashes the password and stores the account; the email must be free.
pub(crate) async fn create_account(state: &AppState, data: NewUser) -> Result<User, ApiError> {
    if find_user_by_email(state, &data.email).await?.is_some() {
        return Err(ApiError::BadRequest(User::duplicate_message().to_string()));
    }

    let password = hash_password(state, &data.password).await?;
    state
        .users
        .insert(User::new(data.name, data.surname, data.email, password, data.role))
        .await
}

/// Applies a profile or admin edit form. On failure the uploaded photo is
/// discarded; on success the photo it replaces is removed.
pub(crate) async fn apply_user_form(
    state: &AppState,
    user: User,
    form: &FormData,
    admin_fields: bool,
) -> Result<User, ApiError> {
    match save_user_form(state, user, form, admin_fields).await {
        Ok((user, replaced_photo)) => {
            if let Some(old) = replaced_photo {
                state.uploads.remove(&old).await;
            }
            Ok(user)
        }
        Err(e) => {
            form.discard(&state.uploads).await;
            Err(e)
        }
    }
}

async fn save_user_form(
    state: &AppState,
    mut user: User,
    form: &FormData,
    admin_fields: bool,
) -> Result<(User, Option<String>), ApiError> {
    let changes = UserChanges::from_fields(&form.fields, admin_fields)?;

    if let Some(email) = changes.email.as_deref().filter(|email| *email != user.email) {
        if find_user_by_email(state, email).await?.is_some() {
            return Err(ApiError::BadRequest(User::duplicate_message().to_string()));
        }
    }

    changes.apply(&mut user);
    if let Some(password) = &changes.password {
        user.password = hash_password(state, password).await?;
    }

    let replaced_photo = match form.file("fotoPerfil") {
        Some(photo) => user.photo.replace(photo.clone()),
        None => None,
    };

    let user = state.users.save(user).await?;
    Ok((user, replaced_photo))
}

pub async fn list_users(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<HashMap<String, String>>
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let params = ListParams::from(query.into_inner());

    let list = ListQuery::new(params.page())
        .deleted(params.flag("inactivas"))
        .contains("nombre", params.text("nombre"))
        .contains("apellido", params.text("apellido"))
        .contains("email", params.text("email"))
        .contains("rol", params.text("rol"));

    let page = state.users.list(&list).await?;
    let docs: Vec<UserView> = page.docs.iter().map(UserView::from).collect();

    Ok(HttpResponse::Ok().json(page.with_docs(docs)))
}

pub async fn get_user(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let user = find_record(&*state.users, &parse_id(&path)?, USER_NOT_FOUND).await?;

    Ok(HttpResponse::Ok().json(UserView::from(&user)))
}

pub async fn create_user(
    state: web::Data<AppState>,
    auth: AuthUser,
    payload: web::Json<RegisterUser>
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let user = create_account(&state, payload.into_inner().validate()?).await?;
    log::info!("Admin {} created account {} ({})", auth.user.email, user.email, user.role.as_str());

    Ok(HttpResponse::Created().json(UserView::from(&user)))
}

pub async fn update_user(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    payload: Multipart
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let user = find_live(&*state.users, &parse_id(&path)?, USER_NOT_FOUND).await?;

    let form = FormData::parse(payload, &state.uploads, &[("fotoPerfil", 1)]).await?;
    let user = apply_user_form(&state, user, &form, true).await?;

    Ok(HttpResponse::Ok().json(UserView::from(&user)))
}

pub async fn delete_user(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let id = parse_id(&path)?;
    if id == auth.id {
        return Err(ApiError::BadRequest("No puedes eliminar tu propia cuenta".to_string()));
    }

    let user = find_live(&*state.users, &id, USER_NOT_FOUND).await?;
    let user = state.users.soft_delete(user).await?;
    log::info!("Admin {} deactivated account {}", auth.user.email, user.email);

    Ok(HttpResponse::Ok().json(message("Usuario eliminado correctamente")))
}

pub async fn restore_user(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let user = find_record(&*state.users, &parse_id(&path)?, USER_NOT_FOUND).await?;
    if !user.deleted {
        return Err(ApiError::BadRequest("El usuario no está eliminado".to_string()));
    }

    let user = state.users.restore(user).await?;
    log::info!("Admin {} restored account {}", auth.user.email, user.email);

    Ok(HttpResponse::Ok().json(json!({
        "mensaje": "Usuario restaurado correctamente",
        "usuario": UserView::from(&user)
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};

    use crate::domain::UserRole;
    use crate::test_support::{bearer, init_app, multipart_body, seed_user, send, test_context, token_for};

    #[actix_web::test]
    async fn test_admin_routes_are_forbidden_to_users() {
        let ctx = test_context();
        let ana = seed_user(&ctx.state, "ana@example.com", UserRole::User).await;
        let token = token_for(&ctx.state, &ana);
        let app = init_app!(ctx.state);

        let req = test::TestRequest::get().uri("/admin/users").insert_header(bearer(&token)).to_request();
        assert_eq!(send(&app, req).await.0, StatusCode::FORBIDDEN);

        let anonymous = test::TestRequest::get().uri("/admin/users").to_request();
        assert_eq!(send(&app, anonymous).await.0, StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_list_filters_and_inactive_accounts() {
        let ctx = test_context();
        let admin = seed_user(&ctx.state, "admin@example.com", UserRole::Admin).await;
        seed_user(&ctx.state, "ana@example.com", UserRole::User).await;
        let luis = seed_user(&ctx.state, "luis@example.com", UserRole::User).await;
        ctx.state.users.soft_delete(luis).await.unwrap();
        let token = token_for(&ctx.state, &admin);
        let app = init_app!(ctx.state);

        let req = test::TestRequest::get().uri("/admin/users").insert_header(bearer(&token)).to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalDocs"], 2);
        assert_eq!(body["limit"], 6);

        let req = test::TestRequest::get().uri("/admin/users?email=ANA").insert_header(bearer(&token)).to_request();
        let (_, body) = send(&app, req).await;
        assert_eq!(body["totalDocs"], 1);
        assert_eq!(body["docs"][0]["email"], "ana@example.com");

        let req = test::TestRequest::get().uri("/admin/users?inactivas=true").insert_header(bearer(&token)).to_request();
        let (_, body) = send(&app, req).await;
        assert_eq!(body["totalDocs"], 1);
        assert_eq!(body["docs"][0]["activo"], false);
    }

    #[actix_web::test]
    async fn test_admin_creates_and_edits_accounts() {
        let ctx = test_context();
        let admin = seed_user(&ctx.state, "admin@example.com", UserRole::Admin).await;
        let token = token_for(&ctx.state, &admin);
        let app = init_app!(ctx.state);

        let req = test::TestRequest::post()
            .uri("/admin/users")
            .insert_header(bearer(&token))
            .set_json(json!({"nombre": "Eva", "apellido": "Ruiz", "email": "eva@example.com", "password": "secreto1", "rol": "admin"}))
            .to_request();
        let (status, created) = send(&app, req).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["rol"], "admin");

        let (content_type, body) = multipart_body(&[("rol", "usuario"), ("activo", "false"), ("apellido", "Ruiz Gil")], &[]);
        let req = test::TestRequest::patch()
            .uri(&format!("/admin/users/{}", created["_id"].as_str().unwrap()))
            .insert_header(bearer(&token))
            .insert_header(content_type)
            .set_payload(body)
            .to_request();
        let (status, updated) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["rol"], "usuario");
        assert_eq!(updated["activo"], false);
        assert_eq!(updated["apellido"], "Ruiz Gil");
    }

    #[actix_web::test]
    async fn test_email_change_cannot_take_an_existing_address() {
        let ctx = test_context();
        let admin = seed_user(&ctx.state, "admin@example.com", UserRole::Admin).await;
        let ana = seed_user(&ctx.state, "ana@example.com", UserRole::User).await;
        let token = token_for(&ctx.state, &admin);
        let app = init_app!(ctx.state);

        let (content_type, body) = multipart_body(&[("email", "admin@example.com")], &[]);
        let req = test::TestRequest::patch()
            .uri(&format!("/admin/users/{}", ana.id.unwrap().to_hex()))
            .insert_header(bearer(&token))
            .insert_header(content_type)
            .set_payload(body)
            .to_request();
        assert_eq!(send(&app, req).await.0, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_delete_and_restore_account() {
        let ctx = test_context();
        let admin = seed_user(&ctx.state, "admin@example.com", UserRole::Admin).await;
        let ana = seed_user(&ctx.state, "ana@example.com", UserRole::User).await;
        let token = token_for(&ctx.state, &admin);
        let ana_id = ana.id.unwrap();
        let app = init_app!(ctx.state);

        let own = test::TestRequest::delete()
            .uri(&format!("/admin/users/{}", admin.id.unwrap().to_hex()))
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(send(&app, own).await.0, StatusCode::BAD_REQUEST);

        let delete = test::TestRequest::delete()
            .uri(&format!("/admin/users/{}", ana_id.to_hex()))
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(send(&app, delete).await.0, StatusCode::OK);

        let stored = ctx.state.users.find_by_id(&ana_id).await.unwrap().unwrap();
        assert!(stored.deleted && !stored.active && stored.deleted_at.is_some());

        let restore = test::TestRequest::patch()
            .uri(&format!("/admin/users/{}/restaurar", ana_id.to_hex()))
            .insert_header(bearer(&token))
            .to_request();
        let (status, body) = send(&app, restore).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["usuario"]["activo"], true);
        assert_eq!(body["usuario"]["borrado"], false);
    }

    #[actix_web::test]
    async fn test_unknown_and_malformed_ids() {
        let ctx = test_context();
        let admin = seed_user(&ctx.state, "admin@example.com", UserRole::Admin).await;
        let token = token_for(&ctx.state, &admin);
        let app = init_app!(ctx.state);

        let req = test::TestRequest::get().uri("/admin/users/no-es-un-id").insert_header(bearer(&token)).to_request();
        assert_eq!(send(&app, req).await.0, StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/admin/users/65f1c0ffee00000000000001")
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(send(&app, req).await.0, StatusCode::NOT_FOUND);
    }
}
