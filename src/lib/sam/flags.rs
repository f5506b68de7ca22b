//! SAM FLAG bits used by sharding and duplicate marking.

/// Template has multiple segments (paired)
pub const PAIRED: u16 = 0x1;
/// Segment unmapped
pub const UNMAPPED: u16 = 0x4;
/// SEQ is reverse complemented
pub const REVERSE: u16 = 0x10;
/// SEQ of the next segment is reverse complemented
pub const MATE_REVERSE: u16 = 0x20;
/// Secondary alignment
pub const SECONDARY: u16 = 0x100;
/// PCR or optical duplicate
pub const DUPLICATE: u16 = 0x400;
/// Supplementary alignment
pub const SUPPLEMENTARY: u16 = 0x800;

/// Records carrying any of these bits never take part in duplicate grouping.
pub const EXCLUDED_FROM_DEDUP: u16 = UNMAPPED | SECONDARY | SUPPLEMENTARY;

/// Strand orientation of a read and its mate, two bits.
///
/// Bit 0 is the read's own reverse flag and bit 1 the mate's. Unpaired reads are always 0.
#[must_use]
pub fn orientation(flag: u16) -> u8 {
    if flag & PAIRED == 0 {
        return 0;
    }
    u8::from(flag & REVERSE != 0) | (u8::from(flag & MATE_REVERSE != 0) << 1)
}
