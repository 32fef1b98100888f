pub mod ip_flags;
pub mod ip_header;

pub use ip_flags::IPFlags;
pub use ip_header::{IPHeader, IpProtocol, IP_HEADER_LEN};
