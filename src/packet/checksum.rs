use std::net::Ipv4Addr;
use crate::ip::ip_header::IpProtocol;

/// Compute the internet checksum (RFC 1071) of `data`.
/// An odd trailing byte is padded with a zero byte.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;

    for chunk in data.chunks(2) {
        let hi = chunk[0];
        let lo = chunk.get(1).copied().unwrap_or(0); // Pad odd length
        sum = fold(sum + u16::from_be_bytes([hi, lo]) as u32);
    }

    !(fold(sum) as u16)
}

/// Compute the TCP checksum of `segment` (header + payload) over the IPv4 pseudo-header.
/// The checksum field of `segment` must already be zero.
pub fn tcp_checksum(src_ip: Ipv4Addr, dst_ip: Ipv4Addr, segment: &[u8]) -> u16 {
    let mut data = Vec::with_capacity(12 + segment.len());

    // Pseudo-header
    data.extend_from_slice(&src_ip.octets());
    data.extend_from_slice(&dst_ip.octets());
    data.push(0); // Reserved
    data.push(IpProtocol::Tcp.into());
    data.extend_from_slice(&(segment.len() as u16).to_be_bytes());

    data.extend_from_slice(segment);
    checksum(&data)
}

/// Zero the checksum field of a built TCP segment, then write the real checksum into bytes 16..18.
pub fn patch_tcp_checksum(segment: &mut [u8], src_ip: Ipv4Addr, dst_ip: Ipv4Addr) {
    segment[16..18].fill(0);
    let checksum = tcp_checksum(src_ip, dst_ip, segment);
    segment[16..18].copy_from_slice(&checksum.to_be_bytes());
}

/// Fold the carry bits back into the low 16 bits.
fn fold(sum: u32) -> u32 {
    (sum & 0xffff) + (sum >> 16)
}

// -- Unit tests --
