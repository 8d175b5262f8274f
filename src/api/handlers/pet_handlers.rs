use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::api::handlers::{find_live, find_record, message, parse_id, resolve_owner};
use crate::api::multipart::FormData;
use crate::api::query::ListParams;
use crate::api::state::AppState;
use crate::api::views::{pet_view, PetView};
use crate::domain::pet::model::{NewPet, PetChanges, MAX_PHOTOS};
use crate::domain::{ListQuery, Page, Pet};
use crate::utils::errors::ApiError;
use crate::utils::security::jwt::AuthUser;

const PET_NOT_FOUND: &str = "Mascota no encontrada";

pub async fn list_pets(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<HashMap<String, String>>
) -> Result<HttpResponse, ApiError> {
    let params = ListParams::from(query.into_inner());
    let deleted = params.flag("borradas");

    let mut list = ListQuery::new(params.page())
        .deleted(deleted)
        .contains("nombre", params.text("nombre"))
        .contains("especie", params.text("especie"))
        .contains("raza", params.text("raza"))
        .contains("genero", params.text("genero"))
        .contains("tamano", params.text("tamano"))
        .contains("ubicacion", params.text("ubicacion"));

    if let Some(available) = params.bool("estado")? {
        list = list.equals("estado", available);
    }

    // Non-admins only ever see their own deleted listings.
    let mut owner = params.object_id("usuario")?;
    if deleted && !auth.is_admin() {
        if owner.is_some_and(|requested| requested != auth.id) {
            return Ok(HttpResponse::Ok().json(Page::new(Vec::<PetView>::new(), 0, &list)));
        }
        owner = Some(auth.id);
    }
    if let Some(owner) = owner {
        list = list.equals("usuario", owner);
    }

    let page = state.pets.list(&list).await?;
    let mut docs = Vec::with_capacity(page.docs.len());
    for pet in &page.docs {
        docs.push(pet_view(&*state.users, pet).await?);
    }

    Ok(HttpResponse::Ok().json(page.with_docs(docs)))
}

pub async fn get_pet(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>
) -> Result<HttpResponse, ApiError> {
    let pet = find_record(&*state.pets, &parse_id(&path)?, PET_NOT_FOUND).await?;

    if pet.deleted && auth.authorize(&pet.owner).is_err() {
        return Err(ApiError::NotFound(PET_NOT_FOUND.to_string()));
    }

    Ok(HttpResponse::Ok().json(pet_view(&*state.users, &pet).await?))
}

pub async fn create_pet(
    state: web::Data<AppState>,
    auth: AuthUser,
    payload: Multipart
) -> Result<HttpResponse, ApiError> {
    let form = FormData::parse(payload, &state.uploads, &[("fotos", MAX_PHOTOS)]).await?;

    let stored: Result<Pet, ApiError> = async {
        let data = NewPet::from_fields(&form.fields)?;
        let owner = resolve_owner(&state, &auth, data.owner_email.as_deref()).await?;
        state.pets.insert(Pet::new(data, form.files("fotos").to_vec(), owner)).await
    }
    .await;

    let pet = match stored {
        Ok(pet) => pet,
        Err(e) => {
            form.discard(&state.uploads).await;
            return Err(e);
        }
    };
    log::info!("Pet {} listed by {}", pet.name, auth.user.email);

    Ok(HttpResponse::Created().json(pet_view(&*state.users, &pet).await?))
}

/// New `fotos` replace the whole photo list.
pub async fn update_pet(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    payload: Multipart
) -> Result<HttpResponse, ApiError> {
    let mut pet = find_live(&*state.pets, &parse_id(&path)?, PET_NOT_FOUND).await?;
    auth.authorize(&pet.owner)?;

    let form = FormData::parse(payload, &state.uploads, &[("fotos", MAX_PHOTOS)]).await?;

    let stored: Result<(Pet, Vec<String>), ApiError> = async {
        PetChanges::from_fields(&form.fields)?.apply(&mut pet);

        let new_photos = form.files("fotos");
        let replaced = if new_photos.is_empty() {
            Vec::new()
        } else {
            std::mem::replace(&mut pet.photos, new_photos.to_vec())
        };

        Ok((state.pets.save(pet).await?, replaced))
    }
    .await;

    let (pet, replaced) = match stored {
        Ok(stored) => stored,
        Err(e) => {
            form.discard(&state.uploads).await;
            return Err(e);
        }
    };
    for photo in &replaced {
        state.uploads.remove(photo).await;
    }

    Ok(HttpResponse::Ok().json(pet_view(&*state.users, &pet).await?))
}

pub async fn delete_pet(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>
) -> Result<HttpResponse, ApiError> {
    let pet = find_live(&*state.pets, &parse_id(&path)?, PET_NOT_FOUND).await?;
    auth.authorize(&pet.owner)?;

    let pet = state.pets.soft_delete(pet).await?;
    log::info!("Pet {} deleted by {}", pet.name, auth.user.email);

    Ok(HttpResponse::Ok().json(message("Mascota eliminada correctamente")))
}

pub async fn restore_pet(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>
) -> Result<HttpResponse, ApiError> {
    let pet = find_record(&*state.pets, &parse_id(&path)?, PET_NOT_FOUND).await?;
    auth.authorize(&pet.owner)?;
    if !pet.deleted {
        return Err(ApiError::BadRequest("La mascota no está eliminada".to_string()));
    }

    let pet = state.pets.restore(pet).await?;

    Ok(HttpResponse::Ok().json(json!({
        "mensaje": "Mascota restaurada correctamente",
        "mascota": pet_view(&*state.users, &pet).await?
    })))
}
