pub mod auth;
pub mod browse;
pub mod config;
pub mod context;
pub mod engage;
pub mod home;
pub mod play;
pub mod profile;
pub mod prompts;
pub mod ui;
