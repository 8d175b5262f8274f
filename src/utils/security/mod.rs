pub mod auth;
pub mod jwt;
pub mod revocation;

pub use auth::{can_access, AuthUtils};
pub use jwt::{AuthUser, JwtMiddleware};
pub use revocation::TokenBlacklist;
