pub mod envelope;
pub mod protocol;
pub mod server;
