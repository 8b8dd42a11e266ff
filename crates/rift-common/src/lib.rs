pub mod domain;
pub mod error;

pub use domain::{Lane, Team};
pub use error::{Error, Result};
