#[macro_use]
extern crate serde;

#[cfg(test)]
#[macro_use]
extern crate serde_json;

pub mod error;
pub mod utils;

pub mod data_types;
