//! A userspace TCP/IP handshake core: Ethernet, IPv4, and TCP header codecs,
//! the internet checksum, and the passive-open half of the TCP state machine.

pub mod config;
pub mod ethernet;
pub mod ip;
pub mod listener;
pub mod packet;
pub mod tcp;

// -- Re-export structs for more concise usage

pub use config::Config;
pub use listener::Listener;
pub use packet::LinkType;
