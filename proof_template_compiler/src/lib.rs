#[macro_use]
extern crate log;

#[macro_use]
extern crate serde;

pub mod compiler;
pub mod errors;
pub mod resolver;
