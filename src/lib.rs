pub mod actions;
pub mod error;
pub mod palette;
pub mod tail;

pub use error::{Result, TailError};
