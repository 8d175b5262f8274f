use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use mongodb::bson::oid::ObjectId;
use serde_json::json;

use crate::api::handlers::{find_live, find_record, message, parse_id, resolve_owner};
use crate::api::query::ListParams;
use crate::api::state::AppState;
use crate::api::views::adoption_view;
use crate::domain::adoption::model::{AdoptionChanges, CreateAdoption};
use crate::domain::{AdoptionRequest, Filter, ListQuery, Record};
use crate::utils::errors::ApiError;
use crate::utils::security::jwt::AuthUser;

const ADOPTION_NOT_FOUND: &str = "Solicitud de adopción no encontrada";

async fn live_request_exists(state: &AppState, user: ObjectId, pet: ObjectId) -> Result<bool, ApiError> {
    let existing = state
        .adoptions
        .find_one(&[
            Filter::eq("usuario", user),
            Filter::eq("mascota", pet),
            Filter::eq("borrado", false),
        ])
        .await?;
    Ok(existing.is_some())
}

fn duplicate() -> ApiError {
    ApiError::BadRequest(AdoptionRequest::duplicate_message().to_string())
}

pub async fn list_adoptions(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<HashMap<String, String>>
) -> Result<HttpResponse, ApiError> {
    let params = ListParams::from(query.into_inner());

    let mut list = ListQuery::new(params.page())
        .deleted(params.flag("borradas"))
        .contains("estado", params.text("estado"))
        .contains("mensaje", params.text("mensaje"));

    if let Some(pet) = params.object_id("mascota")? {
        list = list.equals("mascota", pet);
    }

    if auth.is_admin() {
        if let Some(user) = params.object_id("usuario")? {
            list = list.equals("usuario", user);
        }
    } else {
        list = list.equals("usuario", auth.id);
    }

    let page = state.adoptions.list(&list).await?;
    let mut docs = Vec::with_capacity(page.docs.len());
    for adoption in &page.docs {
        docs.push(adoption_view(&*state.users, &*state.pets, adoption).await?);
    }

    Ok(HttpResponse::Ok().json(page.with_docs(docs)))
}

pub async fn get_adoption(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>
) -> Result<HttpResponse, ApiError> {
    let adoption = find_record(&*state.adoptions, &parse_id(&path)?, ADOPTION_NOT_FOUND).await?;
    auth.authorize(&adoption.user)?;

    Ok(HttpResponse::Ok().json(adoption_view(&*state.users, &*state.pets, &adoption).await?))
}

pub async fn create_adoption(
    state: web::Data<AppState>,
    auth: AuthUser,
    payload: web::Json<CreateAdoption>
) -> Result<HttpResponse, ApiError> {
    let data = payload.into_inner().validate()?;
    let user = resolve_owner(&state, &auth, data.user_email.as_deref()).await?;

    let pet = find_live(&*state.pets, &data.pet, "Mascota no encontrada").await?;
    if !pet.available {
        return Err(ApiError::BadRequest("La mascota no está disponible para adopción".to_string()));
    }

    if live_request_exists(&state, user, data.pet).await? {
        return Err(duplicate());
    }

    let adoption = state
        .adoptions
        .insert(AdoptionRequest::new(user, data.pet, data.message))
        .await?;
    log::info!("Adoption request for pet {} created by {}", pet.name, auth.user.email);

    Ok(HttpResponse::Created().json(adoption_view(&*state.users, &*state.pets, &adoption).await?))
}

pub async fn update_adoption(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    payload: web::Json<AdoptionChanges>
) -> Result<HttpResponse, ApiError> {
    let mut adoption = find_live(&*state.adoptions, &parse_id(&path)?, ADOPTION_NOT_FOUND).await?;
    auth.authorize(&adoption.user)?;

    payload.into_inner().apply(&mut adoption)?;
    let adoption = state.adoptions.save(adoption).await?;

    Ok(HttpResponse::Ok().json(adoption_view(&*state.users, &*state.pets, &adoption).await?))
}

pub async fn delete_adoption(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>
) -> Result<HttpResponse, ApiError> {
    let adoption = find_live(&*state.adoptions, &parse_id(&path)?, ADOPTION_NOT_FOUND).await?;
    auth.authorize(&adoption.user)?;

    state.adoptions.soft_delete(adoption).await?;

    Ok(HttpResponse::Ok().json(message("Solicitud de adopción eliminada correctamente")))
}

/// Refused while another live request exists for the same user and pet.
pub async fn restore_adoption(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>
) -> Result<HttpResponse, ApiError> {
    let adoption = find_record(&*state.adoptions, &parse_id(&path)?, ADOPTION_NOT_FOUND).await?;
    auth.authorize(&adoption.user)?;
    if !adoption.deleted {
        return Err(ApiError::BadRequest("La solicitud no está eliminada".to_string()));
    }
    if live_request_exists(&state, adoption.user, adoption.pet).await? {
        return Err(duplicate());
    }

    let adoption = state.adoptions.restore(adoption).await?;

    Ok(HttpResponse::Ok().json(json!({
        "mensaje": "Solicitud de adopción restaurada correctamente",
        "adopcion": adoption_view(&*state.users, &*state.pets, &adoption).await?
    })))
}
