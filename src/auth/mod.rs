mod helpers;
mod identity;
mod middleware;
mod token;

pub use helpers::{SESSION_COOKIE, TokenExtractionError, extract_token, session_cookie};
pub use identity::{IdentityProvider, LoginAssertion};
pub use middleware::{AuthError, RequireUser};
pub use token::{TokenCodec, TokenError};
