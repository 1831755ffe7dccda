//! Pieces shared by every crate in the workspace: response types that are not
//! tied to a domain, and tracing-subscriber setup.

pub mod types;
pub mod utils;
