pub mod config;
pub mod handlers;
pub mod http;
pub mod response;

pub use config::{CliArgs, ServerConfig};
pub use handlers::AppState;
pub use http::{VidpromptServer, router};
