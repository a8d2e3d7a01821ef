pub mod error;
pub mod event;
pub mod geometry;

pub use error::{GuardError, Result};
pub use geometry::{Point, Rect};
