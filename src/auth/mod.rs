//! Client auth gate: credential decoding, session context, route guard.

pub mod backend;
pub mod controller;
pub mod decoder;
pub mod guard;
pub mod identity;
pub mod navigation;
pub mod role;
pub mod session;
pub mod store;

pub use backend::AuthBackend;
pub use controller::SessionController;
pub use guard::{GuardState, ProfileRefresher, Rendered, RouteGuard};
pub use identity::{Identity, UserProfile};
pub use navigation::{HistoryNavigator, Navigator, Route};
pub use role::Role;
pub use session::{Session, SessionSnapshot};
pub use store::{CredentialStore, FileStore, MemoryStore, TOKEN_KEY};
