//! Sandbox runtimes: the container engine servercontrol drives.

mod implementations;
mod traits;
mod types;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use implementations::*;
pub use traits::*;
pub use types::*;
