#![doc = include_str!("../README.md")]

mod common;
pub use common::*;
// Public re-export so downstream crates reach the driver's BSON types through
// `bookstore_tonic_core::bson`
pub use mongodb::bson;
