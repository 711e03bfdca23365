//! Meshpack Format - Scene flattening and the packed binary mesh format
//!
//! A scene is flattened into one mesh table, one global vertex table and
//! one global triangle index table, then written as three count-prefixed
//! little-endian sections (see [`layout`]).

mod error;
mod flatten;
pub mod layout;
mod reader;
mod writer;

pub use error::{FormatError, Section};
pub use flatten::{flatten, FlatScene, IndexRebase};
pub use layout::{Decode, Encode};
pub use reader::{read_file, read_from};
pub use writer::{write_file, write_to};
