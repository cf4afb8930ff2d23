pub mod handlers;
pub mod routes;
pub mod session;

pub use routes::{api_routes, ws_routes};
