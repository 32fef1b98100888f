use bitflags::bitflags;

bitflags! {
    // Bit positions [ RF, DF, MF, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0 ]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IPFlags: u16 {
        const RF = 1 << 15; // Reserved Flag
        const DF = 1 << 14; // Don't Fragment
        const MF = 1 << 13; // More Fragments
    }
}

impl IPFlags {
    /// Pack the flags and the 13-bit fragment offset into bytes 6-7 of the header
    pub fn pack(self, frag_offset: u16) -> [u8; 2] {
        (self.bits() | (frag_offset & 0x1fff)).to_be_bytes()
    }

    /// Unpack the flags and the 13-bit fragment offset from bytes 6-7 of the header
    pub fn unpack(bytes: [u8; 2]) -> (Self, u16) {
        let word = u16::from_be_bytes(bytes);
        let top3 = Self::from_bits_truncate(word & 0xe000);
        let bottom13 = word & 0x1fff;
        (top3, bottom13)
    }
}

// -- Unit tests --
