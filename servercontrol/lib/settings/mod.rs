//! Per-instance settings and their persistence.

mod store;
mod types;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use store::*;
pub use types::*;
