pub mod error;
pub mod proto;
pub mod record;

pub use error::{Error, Result};
