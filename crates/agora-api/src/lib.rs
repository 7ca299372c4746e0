pub mod auth;
pub mod error;
pub mod feedback;
pub mod messages;
pub mod middleware;
pub mod posts;
pub mod token;
pub mod users;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
