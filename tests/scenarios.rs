//! End-to-end scenarios against [`MemoryDevice`], mirroring the fixed data shapes the
//! engine was designed against.

use hwstore::mem::MemoryDevice;
use hwstore::Store;

fn key(n: u32) -> Vec<u8> {
    format!("key{n:04}\0").into_bytes()
}

fn val(n: u32) -> Vec<u8> {
    format!("val{n:04}\0").into_bytes()
}

fn var(n: u32) -> Vec<u8> {
    format!("VAR{n:04}\0").into_bytes()
}

#[test]
fn s1_twelve_pairs_land_on_used_chain() {
    let device = MemoryDevice::new(16384);
    let mut store = Store::attach(device);

    for n in 0..12 {
        store.set(&key(n), &val(n)).unwrap();
    }

    assert_eq!(store.get(&key(7)).unwrap().1, val(7));
    assert_eq!(store.used_offsets().len(), 12);
    assert!(store.free_offsets().is_empty());
}

#[test]
fn s2_same_size_set_is_in_place_update() {
    let device = MemoryDevice::new(16384);
    let mut store = Store::attach(device);

    let mut original_offsets = Vec::new();
    for n in 0..12 {
        original_offsets.push(store.set(&key(n), &val(n)).unwrap());
    }

    for n in 0..12 {
        let offset = store.set(&key(n), &var(n)).unwrap();
        assert_eq!(offset, original_offsets[n as usize]);
    }

    assert_eq!(store.get(&key(3)).unwrap().1, var(3));
}

#[test]
fn s3_allocator_exhausts_a_small_device() {
    let device = MemoryDevice::new(256);
    let mut store = Store::attach(device);

    let val = vec![b'a'; 40];
    let mut offsets = Vec::new();
    let mut attempts = 0;
    while attempts < 7 {
        attempts += 1;
        let k = format!("k{}", offsets.len()).into_bytes();
        match store.set(&k, &val) {
            Ok(offset) => offsets.push(offset.0),
            Err(_) => break,
        }
    }

    assert!(!offsets.is_empty());
    assert!(attempts <= 7);
    assert!(
        offsets.len() < attempts,
        "a 256-byte device must exhaust before all {attempts} attempts land"
    );
    assert!(offsets.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn s4_growing_a_value_relocates_and_frees_the_old_cell() {
    let device = MemoryDevice::new(4096);
    let mut store = Store::attach(device);

    let first = store.set(b"a", b"xxxx").unwrap();
    let second = store.set(b"a", b"yyyyyyyy").unwrap();

    assert_ne!(first, second);
    assert_eq!(store.get(b"a").unwrap().1, b"yyyyyyyy");
    assert!(store.free_offsets().contains(&first));
}

/// Regression test for a documented quirk: freeing the cell currently named `tail` does
/// not clear `tail`, so the next tail-bump reads a header off the free chain and rewrites
/// its `next` pointer — splicing a live cell into what is supposed to be the free chain.
/// This is inherited, not introduced here, and is deliberately not worked around.
#[test]
fn tail_after_del_quirk_splices_the_free_chain() {
    let device = MemoryDevice::new(4096);
    let mut store = Store::attach(device);

    let first = store.set(b"a", b"xxxx").unwrap();
    let second = store.set(b"a", b"yyyyyyyy").unwrap();

    let free = store.free_offsets();
    assert!(free.contains(&first));
    assert!(
        free.contains(&second),
        "the quirk is expected to pull the relocated cell onto the free walk too"
    );
}

#[test]
fn s5_delete_then_set_reuses_the_freed_cell() {
    let device = MemoryDevice::new(4096);
    let mut store = Store::attach(device);

    let k1_offset = store.set(b"k1", b"v1").unwrap();
    store.set(b"k2", b"v2").unwrap();
    store.del(b"k1").unwrap();
    let k3_offset = store.set(b"k3", b"v3").unwrap();

    assert_eq!(k3_offset, k1_offset);
    assert_eq!(store.used_offsets().first().copied(), Some(k3_offset));
}

#[test]
fn s6_reattaching_sees_the_same_logical_state() {
    let device = MemoryDevice::new(4096);
    let mut store = Store::attach(device);

    store.set(b"k1", b"v1").unwrap();
    store.set(b"k2", b"v2").unwrap();
    store.del(b"k1").unwrap();
    store.set(b"k3", b"v3").unwrap();

    let device = store.into_device();
    let mut reattached = Store::attach(device);

    assert!(reattached.get(b"k1").is_none());
    assert_eq!(reattached.get(b"k2").unwrap().1, b"v2");
    assert_eq!(reattached.get(b"k3").unwrap().1, b"v3");
}

#[test]
fn attaching_a_never_written_device_starts_empty() {
    let device = MemoryDevice::new(1024);
    let mut store = Store::attach(device);

    assert!(store.get(b"anything").is_none());
    assert!(store.used_offsets().is_empty());
    assert!(store.free_offsets().is_empty());
}

#[test]
fn deleting_an_absent_key_is_a_no_op() {
    let device = MemoryDevice::new(1024);
    let mut store = Store::attach(device);

    assert_eq!(store.del(b"missing").unwrap(), None);
    assert_eq!(store.del(b"missing").unwrap(), None);
}

#[test]
fn tail_bump_preserves_the_one_byte_gap() {
    let device = MemoryDevice::new(4096);
    let mut store = Store::attach(device);

    let first = store.set(b"a", b"bbbb").unwrap();
    let second = store.set(b"cc", b"dddd").unwrap();

    // footprint of the first cell is CellHeader::SIZE (16) + capa (5) = 21 bytes;
    // tail-bump must land one byte past that, not flush against it.
    assert_eq!(second.0, first.0 + 16 + 5 + 1);
}
