mod base;
mod dense;
mod sym;
mod triang;
mod matrix;

pub use base::*;
pub use dense::*;
pub use sym::*;
pub use triang::*;
pub use matrix::*;

pub mod config;
pub mod error;
pub mod index;
pub mod provider;
pub mod ops;
pub mod norm;

pub use error::MatError;
pub use ops::{MatOps, Router};
