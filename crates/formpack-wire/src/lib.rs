#![warn(clippy::pedantic)]

pub mod body;
pub mod boundary;
pub mod error;
pub mod part;

pub use body::{read_parts, write_closing};
pub use boundary::Boundary;
pub use error::WireError;
pub use part::{Part, PartHeader};
