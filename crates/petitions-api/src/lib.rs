pub mod auth;
pub mod drafts;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod petitions;
pub mod routes;
pub mod storage;
pub mod uploads;
pub mod users;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use routes::router;
