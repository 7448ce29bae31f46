//! The block-device capability the store is built on.
//!
//! A [`Device`] is nothing but a fixed-size, zero-initialized byte address space reachable
//! through two copying operations. It deliberately does not expose a memory map: every
//! read and write goes through `read`/`write`, the same way the engine would talk to a
//! real disk, flash chip, or the latency-simulated device this crate was written against.
//! Whatever blocking/latency behavior a concrete implementation wants to model (a real
//! `usleep`-proportional-to-size device, for instance) lives entirely in that
//! implementation — the store only ever sees the logical contract below.

use crate::offset::Offset;

/// A fixed-size, byte-addressable storage capability.
///
/// Implementations are free to add latency, persist to real hardware, or (as with
/// [`crate::mem::MemoryDevice`]) simply wrap a `Vec<u8>`. The store never assumes anything
/// beyond this contract.
pub trait Device {
    /// The error a failed [`Device::write`] reports.
    type Error;

    /// The fixed size of this device's address space, in bytes.
    fn size(&self) -> u32;

    /// Copies `min(buf.len(), size() - pos)` bytes starting at `pos` into `buf`, returning
    /// the number of bytes actually copied.
    ///
    /// Reading at or beyond `size()` copies zero bytes.
    fn read(&mut self, pos: Offset, buf: &mut [u8]) -> u32;

    /// Copies all of `buf` to `pos`.
    ///
    /// Fails without copying anything if `pos + buf.len() > size()`.
    fn write(&mut self, pos: Offset, buf: &[u8]) -> Result<(), Self::Error>;
}
