use actix_web::{dev::{Payload, ServiceRequest, ServiceResponse}, web, FromRequest, HttpMessage, HttpRequest};
use std::{rc::Rc, task::{Context, Poll}};
use actix_web::Error;
use actix_service::{Service, Transform};
use futures::future::{ok, ready, LocalBoxFuture, Ready};
use jsonwebtoken::errors::ErrorKind;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::domain::{User, UserRole};
use crate::utils::errors::ApiError;
use crate::utils::security::auth::{can_access, AuthUtils};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims<T> {
    pub sub: String,
    pub exp: u64,
    pub iat: u64,
    pub data: T
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessData {
    pub id: String,
    pub rol: UserRole,
    pub nombre: String,
}

/// The caller of a protected route, inserted into the request extensions by [`JwtMiddleware`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: ObjectId,
    pub user: User,
    pub token: String,
    pub expires_at: u64,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Acceso restringido a administradores".to_string()))
        }
    }

    /// Owner-or-admin check against the owning user's id.
    pub fn authorize(&self, owner: &ObjectId) -> Result<(), ApiError> {
        if can_access(self.user.role, &self.id, owner) {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| ApiError::Unauthorized("No autenticado".to_string())),
        )
    }
}

/// Requires a valid, non-revoked bearer token belonging to a usable account.
pub struct JwtMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        let token = match bearer_token(&req) {
            Ok(token) => token,
            Err(e) => return Box::pin(async move { Err(e.into()) }),
        };

        let state = match req.app_data::<web::Data<AppState>>() {
            Some(state) => state.clone(),
            None => {
                return Box::pin(async {
                    Err(ApiError::InternalServerError("Application state is not registered".to_string()).into())
                })
            }
        };

        Box::pin(async move {
            let auth = authenticate(&state, token).await?;
            req.extensions_mut().insert(auth);
            service.call(req).await
        })
    }
}

fn bearer_token(req: &ServiceRequest) -> Result<String, ApiError> {
    let header = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| ApiError::Unauthorized("Token no proporcionado".to_string()))?;

    let value = header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Cabecera Authorization inválida".to_string()))?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("La cabecera Authorization debe empezar por 'Bearer '".to_string()))?;

    if token.is_empty() {
        return Err(ApiError::Unauthorized("Token vacío".to_string()));
    }
    Ok(token.to_string())
}

async fn authenticate(state: &AppState, token: String) -> Result<AuthUser, ApiError> {
    if state.blacklist.is_revoked(&token) {
        return Err(ApiError::Unauthorized("Token revocado".to_string()));
    }

    let claims = AuthUtils::decode_access_token(&token, &state.config.secret_key).map_err(|err| {
        let message = match err.kind() {
            ErrorKind::ExpiredSignature => "Token expirado",
            ErrorKind::InvalidSignature => "Firma del token inválida",
            ErrorKind::ImmatureSignature => "El token aún no es válido",
            _ => "Token inválido",
        };
        ApiError::Unauthorized(message.to_string())
    })?;

    let id = ObjectId::parse_str(&claims.sub)
        .map_err(|_| ApiError::Unauthorized("Token inválido".to_string()))?;

    let user = state
        .users
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Usuario no encontrado".to_string()))?;

    if !user.can_log_in() && !user.is_admin() {
        return Err(ApiError::Forbidden("Cuenta desactivada".to_string()));
    }

    Ok(AuthUser {
        id,
        user,
        token,
        expires_at: claims.exp,
    })
}

// TESTING
