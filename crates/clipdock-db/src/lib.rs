//! Clipdock record store
//!
//! Postgres persistence for video records behind the `VideoRepository` trait.

mod location;
mod video;

pub use location::{decode_location, encode_location};
pub use video::{PgVideoRepository, VideoRepository};

