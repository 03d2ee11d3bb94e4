//! Data models shared between the record store and the HTTP layer.

mod video;

pub use video::*;
