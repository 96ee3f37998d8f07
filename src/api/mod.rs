// VoxPopuli HTTP API
// Page routes, JSON routes and the server lifecycle

pub mod error;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::app_router;
pub use server::{serve, start_server_on, RunningServer};
