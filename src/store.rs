//! The store engine: superblock, allocator, lookup, and mutation.
//!
//! Every public method here is a synchronous call that returns only once every device
//! write it triggered has completed — there is no buffered, dirty, in-memory state beyond
//! the single [`Superblock`] snapshot, and that snapshot is rewritten to the device before
//! any method returns. A caller who reads the device directly after a call returns sees
//! exactly what [`Store`] sees.

use core::fmt::Write as _;

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::cell::CellHeader;
use crate::device::Device;
use crate::error::Error;
use crate::offset::Offset;
use crate::superblock::{Superblock, FIRST_CELL_OFFSET};

/// A key/value store backed by a [`Device`].
///
/// `Store` holds no state beyond a single in-memory copy of the on-device [`Superblock`];
/// every mutating call ends by rewriting it, so the in-memory copy and the on-device
/// record agree by the time any call returns (testable property 5 in the store's spec).
pub struct Store<D: Device> {
    device: D,
    sb: Superblock,
}

impl<D: Device> Store<D> {
    /// Attaches to a device, recovering a previously written store if the magic word is
    /// present, or starting fresh (no chains, nothing persisted yet) otherwise.
    pub fn attach(mut device: D) -> Self {
        let size = device.size();
        let mut buf = [0u8; Superblock::SIZE];
        device.read(Offset(0), &mut buf);
        let sb = Superblock::decode(&buf);
        let sb = if sb.is_valid() { sb } else { Superblock::fresh(size) };
        Store { device, sb }
    }

    /// Releases the device back to the caller.
    pub fn into_device(self) -> D {
        self.device
    }

    /// Borrows the underlying device, e.g. to inspect raw bytes in tests.
    pub fn device(&self) -> &D {
        &self.device
    }

    // -- on-device codec (§4.1) -------------------------------------------------------

    fn write_superblock(&mut self) -> Result<(), Error<D::Error>> {
        self.sb.magic = crate::superblock::MAGIC;
        let buf = self.sb.encode();
        self.device.write(Offset(0), &buf).map_err(Error::Device)
    }

    fn read_header(&mut self, at: Offset) -> CellHeader {
        let mut buf = [0u8; CellHeader::SIZE];
        self.device.read(at, &mut buf);
        CellHeader::decode(&buf)
    }

    fn write_header(&mut self, at: Offset, header: &CellHeader) -> Result<(), Error<D::Error>> {
        self.device.write(at, &header.encode()).map_err(Error::Device)
    }

    fn write_cell(
        &mut self,
        at: Offset,
        header: &CellHeader,
        key: &[u8],
        val: &[u8],
    ) -> Result<(), Error<D::Error>> {
        debug_assert_eq!(header.datasize(), key.len() as u32 + val.len() as u32);
        self.write_header(at, header)?;
        let key_off = at.checked_add(CellHeader::SIZE as u32).expect("offset overflow");
        self.device.write(key_off, key).map_err(Error::Device)?;
        let val_off = key_off.checked_add(header.keysize).expect("offset overflow");
        self.device.write(val_off, val).map_err(Error::Device)
    }

    fn read_key(&mut self, at: Offset, header: &CellHeader) -> Vec<u8> {
        let key_off = at.checked_add(CellHeader::SIZE as u32).expect("offset overflow");
        let mut buf = vec![0u8; header.keysize as usize];
        self.device.read(key_off, &mut buf);
        buf
    }

    fn read_value(&mut self, at: Offset, header: &CellHeader) -> Vec<u8> {
        let val_off = at
            .checked_add(CellHeader::SIZE as u32)
            .and_then(|o| o.checked_add(header.keysize))
            .expect("offset overflow");
        let mut buf = vec![0u8; header.valsize as usize];
        self.device.read(val_off, &mut buf);
        buf
    }

    // -- lookup (§4.4) ------------------------------------------------------------------

    /// Scans the used chain for a cell whose key bytes equal `key`.
    fn find(&mut self, key: &[u8]) -> Option<(Offset, CellHeader)> {
        let mut cur = self.sb.head;
        while !cur.is_null() {
            let header = self.read_header(cur);
            if header.keysize as usize == key.len() {
                let found = self.read_key(cur, &header);
                if found == key {
                    return Some((cur, header));
                }
            }
            cur = header.next;
        }
        None
    }

    // -- allocator (§4.2) -----------------------------------------------------------------

    /// Path 1: only entered on a device that has never held a cell.
    ///
    /// `tail` is never reset to null once set (see [`Self::free`]), so `head.is_null() &&
    /// tail.is_null()` is the one condition that actually means "nothing has ever been
    /// written here" — `head` alone is not enough. A store whose every cell has since been
    /// deleted also has `head` null, but `tail` still names the last cell it ever held, and
    /// its free chain is very likely non-empty; placing a fresh cell at the fixed offset
    /// right after the superblock would collide with whatever already lives there and
    /// corrupt the free chain. That case falls through to free-list reuse or tail-bump
    /// instead, exactly as if the store had never been empty.
    fn try_head_init(&mut self, key: &[u8], val: &[u8]) -> Result<Option<Offset>, Error<D::Error>> {
        if !self.sb.head.is_null() || !self.sb.tail.is_null() {
            return Ok(None);
        }

        let header = CellHeader::new(key.len() as u32, val.len() as u32);
        let at = FIRST_CELL_OFFSET;
        self.write_cell(at, &header, key, val)?;

        self.sb.head = at;
        self.sb.tail = at;
        self.write_superblock()?;

        #[cfg(feature = "defmt")]
        defmt::trace!("alloc: head-init at {=u32}", at.get());

        Ok(Some(at))
    }

    /// Path 2: first-fit reuse of a free cell, prepended to the used chain.
    fn try_free_reuse(&mut self, key: &[u8], val: &[u8]) -> Result<Option<Offset>, Error<D::Error>> {
        let need = key.len() as u32 + val.len() as u32;

        let mut pred: Option<Offset> = None;
        let mut cur = self.sb.freehead;
        while !cur.is_null() {
            let mut header = self.read_header(cur);
            if header.capa >= need {
                match pred {
                    Some(pred_off) => {
                        let mut pred_header = self.read_header(pred_off);
                        pred_header.next = header.next;
                        self.write_header(pred_off, &pred_header)?;
                    }
                    None => self.sb.freehead = header.next,
                }

                header.keysize = key.len() as u32;
                header.valsize = val.len() as u32;
                header.next = self.sb.head;
                self.sb.head = cur;

                self.write_cell(cur, &header, key, val)?;
                self.write_superblock()?;

                #[cfg(feature = "defmt")]
                defmt::trace!("alloc: free-list reuse at {=u32}", cur.get());

                return Ok(Some(cur));
            }
            pred = Some(cur);
            cur = header.next;
        }
        Ok(None)
    }

    /// Path 3: extend the high-water mark past the current tail, with the documented
    /// one-byte gap preserved from the source layout.
    fn try_tail_bump(&mut self, key: &[u8], val: &[u8]) -> Result<Option<Offset>, Error<D::Error>> {
        let tail = self.sb.tail;
        let tail_header = self.read_header(tail);
        let new_header = CellHeader::new(key.len() as u32, val.len() as u32);

        let tailend = tail.get() + tail_header.footprint();
        let nextend = tailend + new_header.footprint();

        if nextend >= self.sb.size {
            return Ok(None);
        }

        let next_off = Offset(tailend + 1);
        self.write_cell(next_off, &new_header, key, val)?;

        let mut tail_header = tail_header;
        tail_header.next = next_off;
        self.write_header(tail, &tail_header)?;

        // `free` never clears `tail`, so an emptied store (head null) can still have
        // `tail` name an already-freed cell. Splicing onto that cell alone wouldn't make
        // the new one reachable from `head`; restore it when this is the first live cell.
        if self.sb.head.is_null() {
            self.sb.head = next_off;
        }

        self.sb.tail = next_off;
        self.write_superblock()?;

        #[cfg(feature = "defmt")]
        defmt::trace!("alloc: tail-bump at {=u32}", next_off.get());

        Ok(Some(next_off))
    }

    fn alloc(&mut self, key: &[u8], val: &[u8]) -> Result<Offset, Error<D::Error>> {
        if let Some(at) = self.try_head_init(key, val)? {
            return Ok(at);
        }
        if let Some(at) = self.try_free_reuse(key, val)? {
            return Ok(at);
        }
        if let Some(at) = self.try_tail_bump(key, val)? {
            return Ok(at);
        }
        #[cfg(feature = "defmt")]
        defmt::debug!("alloc: out of space");
        Err(Error::OutOfSpace)
    }

    // -- free (§4.3) ----------------------------------------------------------------------

    fn free(&mut self, addr: Offset) -> Result<(), Error<D::Error>> {
        if self.sb.head.is_null() {
            return Ok(());
        }

        if self.sb.head == addr {
            let mut header = self.read_header(addr);
            self.sb.head = header.next;
            header.next = self.sb.freehead;
            self.sb.freehead = addr;
            self.write_header(addr, &header)?;
            self.write_superblock()?;
            return Ok(());
        }

        let mut pred_off = self.sb.head;
        let mut pred_header = self.read_header(pred_off);
        while !pred_header.next.is_null() {
            if pred_header.next == addr {
                let mut header = self.read_header(addr);
                pred_header.next = header.next;
                self.write_header(pred_off, &pred_header)?;

                header.next = self.sb.freehead;
                self.sb.freehead = addr;
                self.write_header(addr, &header)?;

                self.write_superblock()?;
                return Ok(());
            }
            pred_off = pred_header.next;
            pred_header = self.read_header(pred_off);
        }

        // `addr` is not reachable from the used chain: nothing to do.
        Ok(())
    }

    // -- public API (§4.5) ----------------------------------------------------------------

    /// Looks up `key`, returning its cell offset and a fresh copy of its value.
    pub fn get(&mut self, key: &[u8]) -> Option<(Offset, Vec<u8>)> {
        let (at, header) = self.find(key)?;
        let val = self.read_value(at, &header);
        Some((at, val))
    }

    /// Inserts or updates `key`.
    ///
    /// If `key` already has a cell and the new payload still fits in its `capa`, the cell
    /// is rewritten in place and its offset is unchanged. If the payload no longer fits,
    /// the old cell is freed and a new one allocated (which may relocate the key). If
    /// `key` is new, a cell is allocated for it.
    pub fn set(&mut self, key: &[u8], val: &[u8]) -> Result<Offset, Error<D::Error>> {
        if let Some((at, mut header)) = self.find(key) {
            let datasize = key.len() as u32 + val.len() as u32;
            if datasize <= header.capa {
                header.keysize = key.len() as u32;
                header.valsize = val.len() as u32;
                self.write_cell(at, &header, key, val)?;
                self.write_superblock()?;
                return Ok(at);
            }

            self.free(at)?;
            return self.alloc(key, val);
        }

        self.alloc(key, val)
    }

    /// Removes `key`, returning its former cell offset. A miss is `Ok(None)`, not an
    /// error; deleting an absent key is a no-op and repeated deletion is idempotent.
    pub fn del(&mut self, key: &[u8]) -> Result<Option<Offset>, Error<D::Error>> {
        match self.find(key) {
            Some((at, _)) => {
                self.free(at)?;
                Ok(Some(at))
            }
            None => Ok(None),
        }
    }

    // -- debug dump (§4.5) ------------------------------------------------------------------

    /// Offsets of every cell currently on the used chain, head first.
    pub fn used_offsets(&mut self) -> Vec<Offset> {
        let mut out = Vec::new();
        let mut cur = self.sb.head;
        while !cur.is_null() {
            out.push(cur);
            cur = self.read_header(cur).next;
        }
        out
    }

    /// Offsets of every cell currently on the free chain, head first.
    pub fn free_offsets(&mut self) -> Vec<Offset> {
        let mut out = Vec::new();
        let mut cur = self.sb.freehead;
        while !cur.is_null() {
            out.push(cur);
            cur = self.read_header(cur).next;
        }
        out
    }

    /// Walks the used chain then the free chain, producing a human-readable listing.
    ///
    /// Used cells are reported with their key and value bytes; free cells with just their
    /// offset and capacity. When the `defmt` feature is enabled the same walk is also
    /// traced through [`defmt::trace!`].
    pub fn dump(&mut self) -> String {
        let mut out = String::new();

        let mut cur = self.sb.head;
        while !cur.is_null() {
            let header = self.read_header(cur);
            let key = self.read_key(cur, &header);
            let val = self.read_value(cur, &header);
            let _ = writeln!(out, "used  addr={} key={:?} val={:?}", cur.get(), key, val);
            #[cfg(feature = "defmt")]
            defmt::trace!("used cell addr={=u32}", cur.get());
            cur = header.next;
        }

        let mut cur = self.sb.freehead;
        while !cur.is_null() {
            let header = self.read_header(cur);
            let _ = writeln!(out, "free  addr={} capa={}", cur.get(), header.capa);
            #[cfg(feature = "defmt")]
            defmt::trace!("free cell addr={=u32} capa={=u32}", cur.get(), header.capa);
            cur = header.next;
        }

        out
    }
}
