pub mod api;
pub mod client;
pub mod video;

pub use client::SportsDbProvider;
