use std::net::Ipv4Addr;
use crate::packet::checksum;
use crate::packet::errors::HeaderError;
use crate::tcp::tcp_flags::TCPFlags;
use crate::tcp::wrap32::Wrap32;

/// Fixed TCP header size; options are never emitted.
pub const TCP_HEADER_LEN: usize = 20;

/// Data offset of every header built here (20 bytes, no options).
pub const DATA_OFFSET: u8 = 5;

/// The fixed part of a TCP header. Checksum and urgent pointer are not
/// modeled; the checksum is patched into the encoded bytes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TCPHeader {
    pub src_port: u16,
    pub dst_port: u16,
    pub seq_no: Wrap32,
    pub ack_no: Wrap32,
    pub data_offset: u8, // Upper 4 bits of byte 12
    pub flags: TCPFlags, // NS from byte 12, the rest from byte 13
    pub window: u16,
}

impl Default for TCPHeader {
    fn default() -> Self {
        TCPHeader {
            src_port: 0,
            dst_port: 0,
            seq_no: Wrap32::new(0),
            ack_no: Wrap32::new(0),
            data_offset: DATA_OFFSET,
            flags: TCPFlags::empty(),
            window: 0,
        }
    }
}

impl TCPHeader {
    /// Convert the first 20 bytes of `buf` into a `TCPHeader`.
    pub fn parse(buf: &[u8]) -> Result<Self, HeaderError> {
        if buf.len() < TCP_HEADER_LEN {
            return Err(HeaderError::BufferTooSmall { expected: TCP_HEADER_LEN, found: buf.len() })
        }

        let src_port = u16::from_be_bytes([buf[0], buf[1]]);
        let dst_port = u16::from_be_bytes([buf[2], buf[3]]);
        let seq_no = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let ack_no = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);
        let (data_offset, flags) = unpack_offset_flags(buf[12], buf[13]);
        let window = u16::from_be_bytes([buf[14], buf[15]]);

        Ok(TCPHeader {
            src_port,
            dst_port,
            seq_no: Wrap32::new(seq_no),
            ack_no: Wrap32::new(ack_no),
            data_offset,
            flags,
            window,
        })
    }

    /// Convert a `TCPHeader` into exactly 20 bytes with checksum and urgent pointer zeroed.
    pub fn to_bytes(&self) -> [u8; TCP_HEADER_LEN] {
        let mut buf = [0u8; TCP_HEADER_LEN];
        buf[0..2].copy_from_slice(&self.src_port.to_be_bytes());
        buf[2..4].copy_from_slice(&self.dst_port.to_be_bytes());
        buf[4..8].copy_from_slice(&self.seq_no.value().to_be_bytes());
        buf[8..12].copy_from_slice(&self.ack_no.value().to_be_bytes());
        let (byte12, byte13) = pack_offset_flags(self.data_offset, self.flags);
        buf[12] = byte12;
        buf[13] = byte13;
        buf[14..16].copy_from_slice(&self.window.to_be_bytes());
        buf
    }

    /// Compute the checksum for an encoded segment between `src_ip` and `dst_ip`.
    pub fn checksum(data: &[u8], src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> u16 {
        checksum::tcp_checksum(src_ip, dst_ip, data)
    }
}

/// Byte 12 carries the data offset in the high nibble and NS in bit 0; byte 13 the other flags.
fn unpack_offset_flags(byte12: u8, byte13: u8) -> (u8, TCPFlags) {
    (byte12 >> 4, TCPFlags::unpack(byte12, byte13))
}

fn pack_offset_flags(data_offset: u8, flags: TCPFlags) -> (u8, u8) {
    let (ns, low) = flags.pack();
    ((data_offset & 0x0f) << 4 | ns, low)
}

// -- Unit tests --
