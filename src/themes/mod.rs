//! Theme publishing rules: input validation, preview inspection and the
//! commit transaction that ties them to the store.

pub mod admins;
mod commit;
pub mod preview;
pub mod validation;

pub use commit::{CommitSubmission, submit_commit};
