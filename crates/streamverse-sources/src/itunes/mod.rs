pub mod api;
pub mod client;
pub mod sections;

pub use client::{ItunesProvider, MusicSection};
