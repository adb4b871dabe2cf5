pub mod error;
pub mod gate;
pub mod handlers;
pub mod request_log;
pub mod server;

pub use server::{build_router, start, AppState, ServerConfig, ServerHandle};
