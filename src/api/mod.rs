pub mod auth;
pub mod extract;
pub mod health;
pub mod notes;
pub mod response;
pub mod routes;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

pub use routes::{create_router, AppState};
