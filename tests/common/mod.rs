pub mod app;
pub mod auth;
pub mod fixtures;
pub mod http;
