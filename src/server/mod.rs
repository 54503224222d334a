mod commit;
pub mod dto;
mod images;
mod login;
pub mod response;
mod router;
mod themes;

pub use router::{AppState, create_router};
