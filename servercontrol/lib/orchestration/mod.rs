//! Instance lifecycle orchestration: provisioning, start, stop, delete, logs and listing.

mod address;
mod directory;
mod lifecycle;
mod naming;
mod orchestrator;
mod ports;
mod provision;
mod status;
mod storage;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use address::*;
pub use directory::*;
pub use naming::*;
pub use orchestrator::*;
pub use ports::*;
pub use provision::*;
pub use status::*;
pub use storage::*;
