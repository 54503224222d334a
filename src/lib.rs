//! # Themeshelf
//!
//! A hosting server for versioned user stylesheets ("themes"), usable both
//! as a standalone binary and as a library.
//!
//! Every theme has a linear, gap-free commit history and up to eight preview
//! images. Publishing goes through [`themes::submit_commit`], which checks the
//! submission and applies it as one transaction with optimistic version
//! checks.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! themeshelf = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use themeshelf::config::AuthConfig;
//! use themeshelf::server::{AppState, create_router};
//! use themeshelf::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/themeshelf.db").unwrap();
//! store.initialize().unwrap();
//!
//! let auth = AuthConfig::new(std::env::var("TOKEN_SECRET").unwrap());
//! let state = AppState::new(Arc::new(store), &auth)
//!     .unwrap()
//!     .with_identity_provider(Arc::new(MyProvider));
//! let router = create_router(Arc::new(state));
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the operator CLI module. Disable with `default-features = false`.

pub mod auth;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod themes;
pub mod types;
