// Encoding engine - independent of the front end

pub mod core;
pub mod probe;
pub mod validate;
pub mod worker;

pub use core::*;
