pub mod kernel;
pub mod memory;
pub mod outputs;
pub mod services;

pub use kernel::reactor::{Turn, TurnError, TurnReactor, TurnResponse};
