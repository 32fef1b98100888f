use bitflags::bitflags;

bitflags! {
    // Bit positions [ NS | CWR, ECE, URG, ACK, PSH, RST, SYN, FIN ]
    // NS lives in the low bit of header byte 12, the rest in byte 13.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TCPFlags: u16 {
        const NS  = 1 << 8;
        const CWR = 1 << 7;
        const ECE = 1 << 6;
        const URG = 1 << 5;
        const ACK = 1 << 4;
        const PSH = 1 << 3;
        const RST = 1 << 2;
        const SYN = 1 << 1;
        const FIN = 1 << 0;
    }
}

impl TCPFlags {
    /// Rebuild the 9-bit flag field from the NS bit of byte 12 and all of byte 13
    pub fn unpack(byte12: u8, byte13: u8) -> Self {
        Self::from_bits_truncate(((byte12 & 0x01) as u16) << 8 | byte13 as u16)
    }

    /// Split into (NS bit for byte 12, byte 13)
    pub fn pack(self) -> (u8, u8) {
        let bits = self.bits();
        (((bits >> 8) & 0x01) as u8, (bits & 0xff) as u8)
    }
}

// -- Unit tests --
