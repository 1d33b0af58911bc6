pub mod app;
pub mod config;
pub mod errors;
pub mod managers;
pub mod rpc;
pub mod services;
pub mod utils;
