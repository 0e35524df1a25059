//! Request extractors.

mod context;
pub use context::{Identity, RequestContext};
