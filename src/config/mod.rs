mod server;

pub use server::{AuthConfig, DEFAULT_SESSION_HOURS, SECRET_FILE_NAME, ServerConfig};
