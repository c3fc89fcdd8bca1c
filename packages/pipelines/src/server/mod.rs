// HTTP host adapter (Axum)
pub mod app;
pub mod routes;

pub use app::*;
