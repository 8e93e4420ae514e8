pub mod auth;
pub mod client;
pub mod error;
pub mod resources;

pub use client::CrmClient;
pub use error::{message_from_payload, ApiError};
pub use resources::{Resource, ResourceApi};
