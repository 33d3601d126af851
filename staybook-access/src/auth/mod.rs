//! Authentication context
//!
//! Who is asking: an optional principal and the roles it holds.

pub mod context;
pub mod identity;

pub use context::{AccessContext, REQUEST_ID_KEY};
pub use identity::Principal;
