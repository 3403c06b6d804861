//! Static file subsystem.
//!
//! # Data Flow
//! ```text
//! Request path
//!     → provider.rs (clean path, open resource, read metadata)
//!     → [StaticFiles middleware: directory redirect / index lookup]
//!     → serve.rs (content type, validators, conditional + range handling)
//!     → ResponseWriter
//! ```
//!
//! # Design Decisions
//! - The provider is a trait so tests and embedders can serve from memory
//! - Lookup failures are never fatal; the middleware falls through

pub mod provider;
pub mod serve;

pub use provider::{clean_path, join_path, Content, DirProvider, FileMeta, FileProvider, OpenFile};
pub use serve::serve_content;
