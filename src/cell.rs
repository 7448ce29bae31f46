//! The cell header: the fixed-layout prefix of every used or free cell.
//!
//! A cell's on-device footprint is `CellHeader::SIZE + capa` bytes: the header, then
//! `keysize` bytes of key, then `valsize` bytes of value. `capa` is fixed at creation and
//! is never shrunk by a later, smaller write — see the store's in-place update policy.

use crate::offset::Offset;

/// The header every cell (used or free) is prefixed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CellHeader {
    pub keysize: u32,
    pub valsize: u32,
    /// Total payload capacity reserved for this cell. Set once at creation, preserved
    /// across every free/reuse cycle.
    pub capa: u32,
    /// Next cell in whichever chain (used or free) this cell currently belongs to.
    pub next: Offset,
}

impl CellHeader {
    /// On-device size of an encoded header: four packed `u32` fields, no padding.
    pub const SIZE: usize = 4 * core::mem::size_of::<u32>();

    pub(crate) fn new(keysize: u32, valsize: u32) -> Self {
        CellHeader {
            keysize,
            valsize,
            capa: keysize + valsize,
            next: Offset::NULL,
        }
    }

    /// Required on-device footprint for a cell with this header: header plus capacity.
    pub(crate) fn footprint(&self) -> u32 {
        CellHeader::SIZE as u32 + self.capa
    }

    /// Bytes of live payload (`keysize + valsize`), which may be less than `capa` for a
    /// reused cell.
    pub(crate) fn datasize(&self) -> u32 {
        self.keysize + self.valsize
    }

    pub(crate) fn encode(&self) -> [u8; CellHeader::SIZE] {
        let mut buf = [0u8; CellHeader::SIZE];
        buf[0..4].copy_from_slice(&self.keysize.to_ne_bytes());
        buf[4..8].copy_from_slice(&self.valsize.to_ne_bytes());
        buf[8..12].copy_from_slice(&self.capa.to_ne_bytes());
        buf[12..16].copy_from_slice(&self.next.get().to_ne_bytes());
        buf
    }

    pub(crate) fn decode(buf: &[u8]) -> Self {
        debug_assert!(buf.len() >= CellHeader::SIZE);
        CellHeader {
            keysize: u32::from_ne_bytes(buf[0..4].try_into().unwrap()),
            valsize: u32::from_ne_bytes(buf[4..8].try_into().unwrap()),
            capa: u32::from_ne_bytes(buf[8..12].try_into().unwrap()),
            next: Offset(u32::from_ne_bytes(buf[12..16].try_into().unwrap())),
        }
    }
}
