//! A persistent key/value store over a byte-addressable block device.
//!
//! The store keeps two intrusive, singly-linked chains embedded directly in the device's
//! bytes — a "used chain" of live cells and a "free chain" of cells available for reuse —
//! rooted in a superblock record at device offset `0`. There is no separate index: finding a
//! key means walking the used chain, and there is no compaction or coalescing of freed
//! cells, so fragmentation is accepted rather than fought. See [`Store`] for the engine,
//! [`Device`] for what it needs from its backing storage, and [`mem::MemoryDevice`] for a
//! ready-made device to attach one to.
//!
//! ```
//! use hwstore::{mem::MemoryDevice, Store};
//!
//! let device = MemoryDevice::new(4096);
//! let mut store = Store::attach(device);
//!
//! store.set(b"name", b"widget").unwrap();
//! assert_eq!(store.get(b"name").unwrap().1, b"widget");
//!
//! store.del(b"name").unwrap();
//! assert!(store.get(b"name").is_none());
//! ```
#![no_std]

extern crate alloc;

mod cell;
mod device;
mod error;
mod offset;
mod superblock;
mod store;

pub mod mem;

pub use device::Device;
pub use error::Error;
pub use offset::Offset;
pub use store::Store;
