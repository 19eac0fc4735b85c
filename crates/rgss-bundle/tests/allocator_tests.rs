use std::collections::HashSet;

use rgss_bundle::allocator::SECTION_ID_BOUND;
use rgss_bundle::{Error, SectionIdAllocator};

#[test]
fn test_ten_thousand_ids_are_distinct() {
    let mut allocator = SectionIdAllocator::new();
    let ids: HashSet<i32> = (0..10_000).map(|_| allocator.next().unwrap()).collect();

    assert_eq!(ids.len(), 10_000);
    assert!(ids.iter().all(|id| (0..SECTION_ID_BOUND).contains(id)));
    assert_eq!(allocator.len(), 10_000);
}

#[test]
fn test_seeded_allocators_are_deterministic() {
    let mut a = SectionIdAllocator::with_seed(42);
    let mut b = SectionIdAllocator::with_seed(42);
    for _ in 0..16 {
        assert_eq!(a.next().unwrap(), b.next().unwrap());
    }
}

#[test]
fn test_reserved_ids_are_never_returned() {
    let mut probe = SectionIdAllocator::with_seed(9);
    let first = probe.next().unwrap();

    let mut allocator = SectionIdAllocator::with_seed(9);
    assert!(allocator.reserve(first));
    assert!(!allocator.reserve(first));
    assert!(allocator.is_used(first));

    let fresh = allocator.next().unwrap();
    assert_ne!(fresh, first);
    assert!(allocator.is_used(fresh));
}

#[test]
fn test_exhaustion_is_reported() {
    let mut allocator = SectionIdAllocator::with_seed(1).with_max_attempts(0);
    assert!(matches!(
        allocator.next(),
        Err(Error::AllocatorExhausted { attempts: 0 })
    ));
}
