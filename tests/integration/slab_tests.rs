//! Slab allocator behaviour through the public API

use reqpool::config::SlabConfig;
use reqpool::pool::SlabAllocator;

/// Marker written before give is visible after the next take
#[test]
fn test_slab_reuse_marker_round_trip() {
    let slab = SlabAllocator::default();

    let mut buf = slab.take(10);
    assert_eq!(buf.capacity(), 16);
    buf[..4].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
    slab.give(buf);

    let buf = slab.take(10);
    assert_eq!(&buf[..4], &[0xDE, 0xAD, 0xBE, 0xEF]);
}

/// Oversized buffers bypass every free-list
#[test]
fn test_slab_oversize_bypass() {
    let slab = SlabAllocator::default();
    for size in [32769, 65536, 1 << 20] {
        let buf = slab.take(size);
        assert_eq!(buf.capacity(), size);
        slab.give(buf);
    }
    assert!((0..slab.slot_count()).all(|slot| slab.free_len(slot) == 0));
    assert_eq!(slab.stats().discarded, 3);
}

/// Narrow slab configuration
#[test]
fn test_slab_custom_shifts() {
    let slab = SlabAllocator::new(&SlabConfig {
        min_shift: 6,
        max_shift: 8,
        slot_capacity: 2,
    });
    assert_eq!(slab.min_size(), 64);
    assert_eq!(slab.max_size(), 256);
    assert_eq!(slab.slot_count(), 3);

    assert_eq!(slab.take(1).capacity(), 64);
    assert_eq!(slab.take(65).capacity(), 128);
    assert_eq!(slab.take(257).capacity(), 257);
}

/// Concurrent take/give never hands out a wrongly sized buffer
#[test]
fn test_slab_concurrent_capacity_homogeneous() {
    let slab = SlabAllocator::default();

    std::thread::scope(|scope| {
        for t in 0..4usize {
            let slab = &slab;
            scope.spawn(move || {
                for i in 0..2_000usize {
                    let size = 1 + (i * 7 + t * 13) % 4096;
                    let buf = slab.take(size);
                    let slot = slab.slot(size).unwrap();
                    assert_eq!(buf.capacity(), slab.slot_size(slot).unwrap());
                    slab.give(buf);
                }
            });
        }
    });

    let stats = slab.stats();
    assert_eq!(stats.fresh + stats.reused, 8_000);
    assert_eq!(stats.discarded, 0);
}
