//! Device-byte offsets.
//!
//! Every cell and the superblock live at a [`Offset`] into the device's address space.
//! `0` is reserved: the superblock itself occupies it, so it doubles as the "no cell"
//! sentinel used by every `next`/`head`/`tail`/`freehead` field.

/// A byte position within a [`crate::Device`](crate::device::Device)'s address space.
///
/// `Offset::NULL` (value `0`) never addresses a real cell, because the superblock
/// occupies offset `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Offset(pub u32);

impl Offset {
    /// The null sentinel: "no cell".
    pub const NULL: Offset = Offset(0);

    /// Is this the null sentinel?
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub(crate) const fn get(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn checked_add(self, n: u32) -> Option<Offset> {
        self.0.checked_add(n).map(Offset)
    }
}

impl From<u32> for Offset {
    fn from(raw: u32) -> Self {
        Offset(raw)
    }
}

impl From<Offset> for u32 {
    fn from(offset: Offset) -> Self {
        offset.0
    }
}
