pub mod actors;
pub mod api;
pub mod collector;
pub mod config;
pub mod health;
pub mod metrics;
pub mod upstream;
pub mod util;
