use proptest::prelude::*;
use scratch_arena::{AllocError, Allocator, Arena, ArenaState, DEFAULT_ALIGNMENT};

fn requests() -> impl Strategy<Value = Vec<(usize, usize)>> {
    proptest::collection::vec((1_usize..48, 0_u32..7), 1..200)
        .prop_map(|requests| {
            requests
                .into_iter()
                .map(|(size, exponent)| (size, 1_usize << exponent))
                .collect()
        })
}

fn arena_from(fill: Option<u8>, capacity: usize) -> Arena {
    match fill {
        Some(byte) => Arena::from_buffer(vec![byte; capacity]).unwrap(),
        None => Arena::with_capacity(capacity).unwrap(),
    }
}

proptest! {
    #[test]
    fn ranges_are_disjoint_aligned_and_in_bounds(
        requests in requests(),
        fill in proptest::option::of(any::<u8>()),
        capacity in 1_usize..1024,
    ) {
        let mut arena = arena_from(fill, capacity);
        let mut issued: Vec<(usize, usize)> = Vec::new();

        for (size, align) in requests {
            let before = arena.offset();
            match arena.alloc(size, align) {
                Ok(bytes) => {
                    prop_assert_eq!(bytes.len(), size);
                    prop_assert_eq!(bytes.as_ptr() as usize % align, 0);
                    prop_assert!(bytes.iter().all(|&byte| byte == 0));
                    bytes.fill(0xEE);
                    let end = arena.offset();
                    prop_assert!(end <= arena.capacity());
                    issued.push((end - size, end));
                }
                Err(err) => {
                    prop_assert!(err.is_out_of_memory());
                    prop_assert_eq!(arena.offset(), before);
                }
            }
        }

        prop_assert!(issued.windows(2).all(|pair| pair[0].1 <= pair[1].0));
    }

    #[test]
    fn allocations_after_reset_are_zeroed(
        first in requests(),
        second in requests(),
        fill in proptest::option::of(any::<u8>()),
    ) {
        let mut arena = arena_from(fill, 512);
        for (size, align) in first {
            if let Ok(bytes) = arena.alloc(size, align) {
                bytes.fill(0xA5);
            }
        }

        arena.reset();
        prop_assert_eq!(arena.offset(), 0);
        for (size, align) in second {
            if let Ok(bytes) = arena.alloc(size, align) {
                prop_assert!(bytes.iter().all(|&byte| byte == 0));
            }
        }
    }

    #[test]
    fn exhausted_arena_rejects_without_moving(size in 1_usize..64, exponent in 0_u32..7) {
        let mut arena = Arena::with_capacity(64).unwrap();
        arena.alloc(64, 1).unwrap();

        let err = arena.alloc(size, 1 << exponent).unwrap_err();
        prop_assert!(err.is_out_of_memory());
        prop_assert_eq!(arena.offset(), 64);
        prop_assert_eq!(arena.state(), ArenaState::Exhausted);
    }
}

#[test]
fn failure_boundary_keeps_offset() {
    let mut arena = Arena::with_capacity(16).unwrap();
    assert_eq!(arena.alloc(16, 8).unwrap().len(), 16);
    assert!(matches!(
        arena.alloc(1, 8),
        Err(AllocError::OutOfMemory { requested: 1, .. })
    ));
    assert_eq!(arena.offset(), 16);
    assert_eq!(arena.state(), ArenaState::Exhausted);
}

#[test]
fn scenario_with_sixteen_byte_alignment() {
    let mut arena = Arena::with_capacity(64).unwrap();
    let first = arena.reserve(10, 16).unwrap();
    assert_eq!((first.start(), first.end()), (0, 10));

    let second = arena.reserve(20, 16).unwrap();
    assert_eq!((second.start(), second.end()), (16, 36));
    assert_eq!(arena.offset(), 36);
    assert_eq!(arena.remaining(), 28);
}

#[test]
fn allocation_after_reset_starts_at_base() {
    let mut arena = Arena::with_capacity(128).unwrap();
    arena.alloc(3, 1).unwrap();
    arena.alloc(40, 32).unwrap().fill(0xFF);
    arena.reset();

    let range = arena.reserve(100, DEFAULT_ALIGNMENT).unwrap();
    assert_eq!(range.start(), 0);
    assert!(arena.get(&range).unwrap().iter().all(|&byte| byte == 0));
}

#[test]
fn repeated_resets_match_a_single_reset() {
    let mut once = Arena::with_capacity(64).unwrap();
    let mut many = Arena::with_capacity(64).unwrap();
    for arena in [&mut once, &mut many] {
        arena.alloc(24, 8).unwrap();
    }

    once.reset();
    for _ in 0..5 {
        many.reset();
    }

    assert_eq!(once.offset(), many.offset());
    assert_eq!(once.generation(), many.generation());
    assert_eq!(once.remaining(), many.remaining());
}

#[test]
fn free_through_the_capability_set_is_ignored() {
    let mut arena = Arena::with_capacity(64).unwrap();
    let allocation = Allocator::allocate_default(&mut arena, 16).unwrap();
    Allocator::free(&mut arena, allocation);
    Allocator::free(&mut arena, allocation);
    assert_eq!(arena.offset(), 16);
    assert_eq!(arena.bytes(&allocation).map(<[u8]>::len), Some(16));
}
