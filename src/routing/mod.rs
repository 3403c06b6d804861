//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     register(method, pattern, handler)
//!     → pattern.rs (compile segments, reject unnamed params)
//!     → table.rs (store under method → pattern)
//!
//! Per request (method, path):
//!     → table.rs (walk patterns registered for the method)
//!     → pattern.rs (segment-wise match, bind :params)
//!     → Return: (handler, params) or no match
//! ```
//!
//! # Design Decisions
//! - Single-segment named parameters only, no wildcards or regex
//! - First matching pattern wins; overlapping patterns are a caller error
//! - Table is immutable while serving; replacement is a whole snapshot swap

pub mod pattern;
pub mod table;

pub use pattern::{match_path, Params, Pattern};
pub use table::RouteTable;
