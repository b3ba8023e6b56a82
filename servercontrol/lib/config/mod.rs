//! Configuration types and helpers.

mod defaults;
mod env_pair;
mod path_pair;
mod port_pair;
mod servercontrol;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use defaults::*;
pub use env_pair::*;
pub use path_pair::*;
pub use port_pair::*;
pub use servercontrol::*;
