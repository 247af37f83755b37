pub mod handlers;
pub mod server;
pub mod views;
