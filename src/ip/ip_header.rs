use crate::ip::ip_flags::IPFlags;
use crate::packet::checksum;
use crate::packet::errors::HeaderError;
use std::net::Ipv4Addr;

/// Fixed IPv4 header size; options are never emitted.
pub const IP_HEADER_LEN: usize = 20;

/// The protocol number carried in byte 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProtocol {
    Icmp,
    Tcp,
    Udp,
    Other(u8),
}

impl From<u8> for IpProtocol {
    fn from(value: u8) -> Self {
        match value {
            1 => IpProtocol::Icmp,
            6 => IpProtocol::Tcp,
            17 => IpProtocol::Udp,
            other => IpProtocol::Other(other),
        }
    }
}

impl From<IpProtocol> for u8 {
    fn from(protocol: IpProtocol) -> Self {
        match protocol {
            IpProtocol::Icmp => 1,
            IpProtocol::Tcp => 6,
            IpProtocol::Udp => 17,
            IpProtocol::Other(value) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IPHeader {
    pub version: u8,      // 4 for IPv4
    pub ihl: u8,          // Header length in 32-bit words, 5 without options
    pub tos: u8,
    pub total_len: u16,
    pub id: u16,
    pub flags: IPFlags,   // 3 bits, part of u16
    pub frag_offset: u16, // 13 bits, part of u16
    pub ttl: u8,
    pub protocol: IpProtocol,
    pub checksum: u16,
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
}

impl IPHeader {
    /// Parse the first 20 bytes of `buf` into an `IPHeader`.
    /// The checksum is not verified and options are left for the caller to skip.
    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        if buf.len() < IP_HEADER_LEN {
            return Err(HeaderError::BufferTooSmall { expected: IP_HEADER_LEN, found: buf.len() })
        }

        let (version, ihl) = unpack_nibbles(buf[0]);
        let tos = buf[1];
        let total_len = u16::from_be_bytes([buf[2], buf[3]]);
        let id = u16::from_be_bytes([buf[4], buf[5]]);
        let (flags, frag_offset) = IPFlags::unpack([buf[6], buf[7]]);
        let ttl = buf[8];
        let protocol = IpProtocol::from(buf[9]);
        let checksum = u16::from_be_bytes([buf[10], buf[11]]);
        let src_ip = Ipv4Addr::new(buf[12], buf[13], buf[14], buf[15]);
        let dst_ip = Ipv4Addr::new(buf[16], buf[17], buf[18], buf[19]);

        Ok(IPHeader {
            version,
            ihl,
            tos,
            total_len,
            id,
            flags,
            frag_offset,
            ttl,
            protocol,
            checksum,
            src_ip,
            dst_ip,
        })
    }

    /// Serialize into exactly 20 bytes. The checksum field is written as is.
    pub fn to_bytes(&self) -> [u8; IP_HEADER_LEN] {
        let mut buf = [0u8; IP_HEADER_LEN];
        buf[0] = pack_nibbles(self.version, self.ihl);
        buf[1] = self.tos;
        buf[2..4].copy_from_slice(&self.total_len.to_be_bytes());
        buf[4..6].copy_from_slice(&self.id.to_be_bytes());
        buf[6..8].copy_from_slice(&self.flags.pack(self.frag_offset));
        buf[8] = self.ttl;
        buf[9] = self.protocol.into();
        buf[10..12].copy_from_slice(&self.checksum.to_be_bytes());
        buf[12..16].copy_from_slice(&self.src_ip.octets());
        buf[16..20].copy_from_slice(&self.dst_ip.octets());
        buf
    }

    /// Byte offset of the next header, honouring whatever IHL was received.
    pub fn header_len(&self) -> usize {
        self.ihl as usize * 4
    }

    /// Compute the checksum for an `IPHeader`.
    /// Wiki: https://en.wikipedia.org/wiki/IPv4_header_checksum.
    pub fn checksum(data: &[u8]) -> u16 {
        checksum::checksum(data)
    }
}

impl Default for IPHeader {
    fn default() -> Self {
        IPHeader {
            version: 4,
            ihl: 5,
            tos: 0,
            total_len: 0,
            id: 0,
            flags: IPFlags::DF,
            frag_offset: 0,
            ttl: 64,
            protocol: IpProtocol::Tcp,
            checksum: 0,
            src_ip: Ipv4Addr::UNSPECIFIED,
            dst_ip: Ipv4Addr::UNSPECIFIED,
        }
    }
}

/// Split a byte into its (high, low) nibbles.
pub(crate) fn unpack_nibbles(byte: u8) -> (u8, u8) {
    (byte >> 4, byte & 0x0f)
}

/// Join two nibbles into a byte. Bits above the low nibble of each are dropped.
pub(crate) fn pack_nibbles(high: u8, low: u8) -> u8 {
    ((high & 0x0f) << 4) | (low & 0x0f)
}

// -- Unit tests --
