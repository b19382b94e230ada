pub mod events;
pub mod fanout;
pub mod handler;
pub mod http_push;
pub mod registry;
pub mod server;
pub mod session;
pub mod transport;
