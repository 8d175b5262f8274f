use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::{Duration, Utc};
use serde_json::json;

use crate::api::handlers::user_handlers::{apply_user_form, create_account};
use crate::api::handlers::{find_user_by_email, hash_password, message, verify_password};
use crate::api::multipart::FormData;
use crate::api::state::AppState;
use crate::api::views::UserView;
use crate::domain::user::model::{PasswordRecoveryRequest, PasswordResetRequest, RegisterUser, UserLoginReceive};
use crate::domain::{validation, Filter, User};
use crate::utils::errors::ApiError;
use crate::utils::security::{auth::AuthUtils, jwt::AuthUser};

const RESET_TOKEN_HOURS: i64 = 1;
const RESET_REQUESTED: &str = "Si el email está registrado, recibirás un enlace para restablecer tu contraseña";

fn invalid_credentials() -> ApiError {
    ApiError::BadRequest("Credenciales inválidas".to_string())
}

pub async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterUser>
) -> Result<HttpResponse, ApiError> {
    let mut payload = payload.into_inner();
    payload.role = None;

    let user = create_account(&state, payload.validate()?).await?;
    log::info!("New account registered: {}", user.email);

    Ok(HttpResponse::Created().json(json!({
        "mensaje": "Usuario registrado correctamente",
        "usuario": UserView::from(&user)
    })))
}

pub async fn login(
    state: web::Data<AppState>,
    credentials: web::Json<UserLoginReceive>
) -> Result<HttpResponse, ApiError> {
    let credentials = credentials.into_inner();
    let email = credentials.email.trim().to_lowercase();

    if email.is_empty() || credentials.password.is_empty() {
        return Err(ApiError::BadRequest("Email y contraseña son obligatorios".to_string()));
    }

    let user = find_user_by_email(&state, &email)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&credentials.password, &user.password).await? {
        return Err(invalid_credentials());
    }

    if !user.can_log_in() {
        return Err(ApiError::Forbidden("Cuenta desactivada. Contacta con un administrador".to_string()));
    }

    let token = AuthUtils::generate_access_token(&user, &state.config.secret_key, state.config.jwt_expiration_minutes)?;
    log::info!("User {} logged in", user.email);

    Ok(HttpResponse::Ok().json(json!({
        "token": token,
        "usuario": UserView::from(&user)
    })))
}

pub async fn logout(
    state: web::Data<AppState>,
    auth: AuthUser
) -> Result<HttpResponse, ApiError> {
    state.blacklist.revoke(&auth.token, auth.expires_at);
    log::info!("User {} logged out", auth.user.email);

    Ok(HttpResponse::Ok().json(message("Sesión cerrada correctamente")))
}

pub async fn get_profile(auth: AuthUser) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(UserView::from(&auth.user)))
}

pub async fn update_profile(
    state: web::Data<AppState>,
    auth: AuthUser,
    payload: Multipart
) -> Result<HttpResponse, ApiError> {
    let form = FormData::parse(payload, &state.uploads, &[("fotoPerfil", 1)]).await?;
    let user = apply_user_form(&state, auth.user, &form, false).await?;

    Ok(HttpResponse::Ok().json(json!({
        "mensaje": "Perfil actualizado correctamente",
        "usuario": UserView::from(&user)
    })))
}

/// Always answers the same way so that registered addresses cannot be probed.
pub async fn request_password_reset(
    state: web::Data<AppState>,
    payload: web::Json<PasswordRecoveryRequest>
) -> Result<HttpResponse, ApiError> {
    let email = validation::email(Some(&payload.email))?;

    if let Some(mut user) = find_user_by_email(&state, &email).await?.filter(User::can_log_in) {
        let token = AuthUtils::generate_reset_token();
        user.reset_token = Some(AuthUtils::hash(&token));
        user.reset_token_expires = Some(Utc::now() + Duration::hours(RESET_TOKEN_HOURS));
        let user = state.users.save(user).await?;

        let link = format!("{}/restablecer/{}", state.config.frontend_url, token);
        match state.mailer.send_password_reset_email(&user.email, &link).await {
            Ok(()) => log::info!("Password reset email sent to {}", user.email),
            Err(e) => log::error!("Could not send password reset email to {}: {}", user.email, e),
        }
    }

    Ok(HttpResponse::Ok().json(message(RESET_REQUESTED)))
}

pub async fn reset_password(
    state: web::Data<AppState>,
    token: web::Path<String>,
    payload: web::Json<PasswordResetRequest>
) -> Result<HttpResponse, ApiError> {
    let password = validation::password(payload.password.as_deref())?;

    let mut user = state
        .users
        .find_one(&[Filter::eq("resetToken", AuthUtils::hash(&token))])
        .await?
        .filter(|user| user.reset_token_expires.is_some_and(|expires| expires > Utc::now()))
        .ok_or_else(|| ApiError::BadRequest("El enlace de recuperación no es válido o ha expirado".to_string()))?;

    user.password = hash_password(&state, &password).await?;
    user.reset_token = None;
    user.reset_token_expires = None;
    let user = state.users.save(user).await?;
    log::info!("Password reset for {}", user.email);

    Ok(HttpResponse::Ok().json(message("Contraseña actualizada correctamente")))
}
