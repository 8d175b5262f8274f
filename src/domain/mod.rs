pub mod adoption;
pub mod email;
pub mod message;
pub mod pet;
pub mod store;
pub mod user;
pub mod validation;

pub use adoption::model::{AdoptionRequest, AdoptionStatus};
pub use message::model::{Message, MessageKind, MessageStatus};
pub use pet::model::Pet;
pub use store::{Filter, ListQuery, Page, Record, Store, MAX_PAGE, PAGE_SIZE};
pub use user::model::{User, UserRole};
