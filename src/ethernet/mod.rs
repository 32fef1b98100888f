pub mod frame;

pub use frame::{EtherType, EthernetFrame, MacAddr, ETH_HEADER_LEN};
