//! Failure modes surfaced by the store.
//!
//! A miss on `get`/`del` is not a failure — those return `Ok(None)`. [`Error`] is reserved
//! for the two ways a mutation can genuinely fail: the device ran out of room, or the
//! device itself rejected a write.

/// Something went wrong performing a store operation.
///
/// `E` is the [`Device::Error`](crate::device::Device::Error) of whatever device this
/// store is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Neither free-list reuse nor a tail-bump could fit the new key/value.
    OutOfSpace,
    /// The underlying device rejected a read or write.
    ///
    /// The engine does not retry. Per the store's durability discipline, the in-memory
    /// superblock may now be ahead of what is actually on the device.
    Device(E),
}

impl<E: core::fmt::Display> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::OutOfSpace => write!(f, "store out of space"),
            Error::Device(e) => write!(f, "device error: {e}"),
        }
    }
}
