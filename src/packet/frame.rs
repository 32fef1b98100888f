use std::fmt;
use std::str::FromStr;
use crate::ethernet::frame::{EtherType, EthernetFrame, ETH_HEADER_LEN};
use crate::ip::ip_header::{IPHeader, IpProtocol, IP_HEADER_LEN};
use crate::packet::checksum;
use crate::packet::errors::HeaderError;
use crate::tcp::tcp_header::{TCPHeader, TCP_HEADER_LEN};

/// BSD null/loopback header: the address family as a host-order u32.
const LOOPBACK_HEADER_LEN: usize = 4;
const AF_INET: u32 = 2;

/// Link-layer framing of the capture interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    Ethernet,
    Loopback,
}

impl LinkType {
    pub fn header_len(self) -> usize {
        match self {
            LinkType::Ethernet => ETH_HEADER_LEN,
            LinkType::Loopback => LOOPBACK_HEADER_LEN,
        }
    }
}

impl FromStr for LinkType {
    type Err = HeaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ethernet" | "en10mb" => Ok(LinkType::Ethernet),
            "loopback" | "null" | "loop" => Ok(LinkType::Loopback),
            other => Err(HeaderError::Unsupported(format!("link type {other}"))),
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkType::Ethernet => f.write_str("ethernet"),
            LinkType::Loopback => f.write_str("loopback"),
        }
    }
}

/// The link header of a frame: a full Ethernet header or the 4-byte loopback one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkHeader {
    Ethernet(EthernetFrame),
    Loopback,
}

impl LinkHeader {
    /// The link header for a reply to a frame that arrived with this one.
    pub fn reply_to(&self) -> Self {
        match self {
            LinkHeader::Ethernet(eth) => LinkHeader::Ethernet(eth.reply_to()),
            LinkHeader::Loopback => LinkHeader::Loopback,
        }
    }

    fn write_to(&self, packet: &mut Vec<u8>) {
        match self {
            LinkHeader::Ethernet(eth) => packet.extend_from_slice(&eth.to_bytes()),
            LinkHeader::Loopback => packet.extend_from_slice(&AF_INET.to_le_bytes()),
        }
    }
}

/// The decoded headers of one captured TCP/IPv4 frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    pub link: LinkHeader,
    pub iph: IPHeader,
    pub tcph: TCPHeader,
}

/// A reply ready to be framed.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub link: LinkHeader,
    pub iph: IPHeader, // Total length and checksum are filled in by `pack`
    pub tcph: TCPHeader,
}

/// Unpack one captured frame into its link, IP, and TCP headers.
/// The TCP header is located with the received IHL; checksums are not verified.
pub fn unpack(frame: &[u8], link_type: LinkType) -> Result<Inbound, HeaderError> {
    let link = match link_type {
        LinkType::Ethernet => {
            let eth = EthernetFrame::parse(frame)?;
            if eth.ether_type != EtherType::Ipv4 {
                return Err(HeaderError::Unsupported(format!("EtherType {:#06x}", u16::from(eth.ether_type))));
            }
            LinkHeader::Ethernet(eth)
        }
        LinkType::Loopback => {
            if frame.len() < LOOPBACK_HEADER_LEN {
                return Err(HeaderError::BufferTooSmall { expected: LOOPBACK_HEADER_LEN, found: frame.len() });
            }
            let family = [frame[0], frame[1], frame[2], frame[3]];
            if u32::from_le_bytes(family) != AF_INET && u32::from_be_bytes(family) != AF_INET {
                return Err(HeaderError::Unsupported(format!("address family {}", u32::from_le_bytes(family))));
            }
            LinkHeader::Loopback
        }
    };

    let ip_bytes = &frame[link_type.header_len()..];
    let iph = IPHeader::parse(ip_bytes)?;
    if iph.version != 4 || iph.ihl < 5 {
        return Err(HeaderError::Unsupported(format!("IP version {} with IHL {}", iph.version, iph.ihl)));
    }
    if iph.protocol != IpProtocol::Tcp {
        return Err(HeaderError::Unsupported(format!("IP protocol {}", u8::from(iph.protocol))));
    }

    // Skip any IP options
    let tcp_bytes = ip_bytes.get(iph.header_len()..).ok_or(HeaderError::BufferTooSmall {
        expected: iph.header_len() + TCP_HEADER_LEN,
        found: ip_bytes.len(),
    })?;
    let tcph = TCPHeader::parse(tcp_bytes)?;

    Ok(Inbound { link, iph, tcph })
}

/// Pack a reply into a complete frame with both checksums patched in.
pub fn pack(reply: &Outbound) -> Vec<u8> {
    // TCP first: the pseudo-header only needs the addresses
    let mut tcp_bytes = reply.tcph.to_bytes();
    checksum::patch_tcp_checksum(&mut tcp_bytes, reply.iph.src_ip, reply.iph.dst_ip);

    let iph = IPHeader {
        ihl: 5,
        total_len: (IP_HEADER_LEN + tcp_bytes.len()) as u16,
        checksum: 0,
        ..reply.iph.clone()
    };
    let mut ip_bytes = iph.to_bytes();
    let ip_checksum = IPHeader::checksum(&ip_bytes);
    ip_bytes[10..12].copy_from_slice(&ip_checksum.to_be_bytes());

    let mut packet = Vec::with_capacity(ETH_HEADER_LEN + IP_HEADER_LEN + tcp_bytes.len());
    reply.link.write_to(&mut packet);
    packet.extend_from_slice(&ip_bytes);
    packet.extend_from_slice(&tcp_bytes);
    packet
}

// -- Unit tests --
