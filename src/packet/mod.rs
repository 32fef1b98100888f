pub mod checksum;
pub mod errors;
pub mod frame;

// -- Re-export for more concise usage

pub use frame::{pack, unpack, Inbound, LinkType, Outbound};

// Unit test helpers
