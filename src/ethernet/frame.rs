use std::fmt;
use crate::packet::errors::HeaderError;

/// Ethernet header size in bytes.
pub const ETH_HEADER_LEN: usize = 14;

/// EtherType values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    Ipv4,
    Arp,
    Ipv6,
    Unknown(u16),
}

impl From<u16> for EtherType {
    fn from(raw: u16) -> Self {
        match raw {
            0x0800 => Self::Ipv4,
            0x0806 => Self::Arp,
            0x86dd => Self::Ipv6,
            other => Self::Unknown(other),
        }
    }
}

impl From<EtherType> for u16 {
    fn from(ether_type: EtherType) -> Self {
        match ether_type {
            EtherType::Ipv4 => 0x0800,
            EtherType::Arp => 0x0806,
            EtherType::Ipv6 => 0x86dd,
            EtherType::Unknown(raw) => raw,
        }
    }
}

/// A 6-byte hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MacAddr(pub [u8; 6]);

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// The 14-byte Ethernet II header. The payload stays in the caller's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetFrame {
    pub dst_mac: MacAddr,
    pub src_mac: MacAddr,
    pub ether_type: EtherType,
}

impl EthernetFrame {
    /// Parse the Ethernet header at the start of `buf`.
    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        if buf.len() < ETH_HEADER_LEN {
            return Err(HeaderError::BufferTooSmall { expected: ETH_HEADER_LEN, found: buf.len() });
        }

        let mut dst_mac = [0u8; 6];
        let mut src_mac = [0u8; 6];
        dst_mac.copy_from_slice(&buf[0..6]);
        src_mac.copy_from_slice(&buf[6..12]);
        let ether_type = u16::from_be_bytes([buf[12], buf[13]]);

        Ok(EthernetFrame {
            dst_mac: MacAddr(dst_mac),
            src_mac: MacAddr(src_mac),
            ether_type: ether_type.into(),
        })
    }

    /// Serialize into exactly 14 bytes.
    pub fn to_bytes(&self) -> [u8; ETH_HEADER_LEN] {
        let mut buf = [0u8; ETH_HEADER_LEN];
        buf[0..6].copy_from_slice(&self.dst_mac.0);
        buf[6..12].copy_from_slice(&self.src_mac.0);
        buf[12..14].copy_from_slice(&u16::from(self.ether_type).to_be_bytes());
        buf
    }

    /// The header for an IPv4 reply to this frame, with the addresses swapped.
    pub fn reply_to(&self) -> Self {
        EthernetFrame {
            dst_mac: self.src_mac,
            src_mac: self.dst_mac,
            ether_type: EtherType::Ipv4,
        }
    }
}

// -- Unit tests --
