//! The superblock: the store's root record, always at device offset 0.
//!
//! Compare to the teacher's own recovery record ([`RingBuffer`]'s `header` field): a
//! magic word that says "this device holds a store I wrote", followed by the state
//! needed to resume walking the chains. Unlike the original C representation — which
//! unions the magic word with an in-memory-only device pointer — the in-memory
//! [`Superblock`] here holds only what is actually persisted. The engine that owns it
//! is a separate type (see [`crate::store::Store`]), so there is no aliasing hazard and
//! no dependence on pointer width.
//!
//! [`RingBuffer`]: https://docs.rs/defmt-persist

use crate::offset::Offset;

/// Value stamped into [`Superblock::magic`] on every write. Its presence on a device
/// distinguishes "a store was written here" from "this device has never been touched".
pub const MAGIC: u32 = 0xABBA_ABBA;

/// The on-device root record, always at offset 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Superblock {
    pub(crate) magic: u32,
    pub(crate) size: u32,
    pub(crate) head: Offset,
    pub(crate) tail: Offset,
    pub(crate) freehead: Offset,
}

impl Superblock {
    /// On-device size of an encoded superblock: five packed `u32` fields, no padding.
    pub const SIZE: usize = 5 * core::mem::size_of::<u32>();

    /// The in-memory state of a store that has never been written: no magic, no chains.
    pub(crate) fn fresh(size: u32) -> Self {
        Superblock {
            magic: 0,
            size,
            head: Offset::NULL,
            tail: Offset::NULL,
            freehead: Offset::NULL,
        }
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }

    pub(crate) fn encode(&self) -> [u8; Superblock::SIZE] {
        let mut buf = [0u8; Superblock::SIZE];
        buf[0..4].copy_from_slice(&MAGIC.to_ne_bytes());
        buf[4..8].copy_from_slice(&self.size.to_ne_bytes());
        buf[8..12].copy_from_slice(&self.head.get().to_ne_bytes());
        buf[12..16].copy_from_slice(&self.tail.get().to_ne_bytes());
        buf[16..20].copy_from_slice(&self.freehead.get().to_ne_bytes());
        buf
    }

    pub(crate) fn decode(buf: &[u8]) -> Self {
        debug_assert!(buf.len() >= Superblock::SIZE);
        Superblock {
            magic: u32::from_ne_bytes(buf[0..4].try_into().unwrap()),
            size: u32::from_ne_bytes(buf[4..8].try_into().unwrap()),
            head: Offset(u32::from_ne_bytes(buf[8..12].try_into().unwrap())),
            tail: Offset(u32::from_ne_bytes(buf[12..16].try_into().unwrap())),
            freehead: Offset(u32::from_ne_bytes(buf[16..20].try_into().unwrap())),
        }
    }
}

/// Offset of the first cell in a freshly initialized store: right after the superblock.
pub const FIRST_CELL_OFFSET: Offset = Offset(Superblock::SIZE as u32);
