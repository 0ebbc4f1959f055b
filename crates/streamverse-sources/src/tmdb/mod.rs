pub mod api;
pub mod client;
pub mod genres;

pub use api::HomeRow;
pub use client::{HomeRows, TmdbProvider};
