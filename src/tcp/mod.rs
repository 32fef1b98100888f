pub mod connection;
pub mod errors;
pub mod state;
pub mod tcp_flags;
pub mod tcp_header;
pub mod wrap32;

pub use connection::{Connection, ConnectionKey};
pub use errors::TcpError;
pub use state::{TCPEvent, TCPState};
pub use tcp_flags::TCPFlags;
pub use tcp_header::TCPHeader;
pub use wrap32::Wrap32;

// Unit test helpers
