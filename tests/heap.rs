//! Randomized stress testing across every free-list policy, grounded on the
//! original suite's `TestHeapStress.h`/`.cpp`: drive a long random sequence
//! of `alloc`/`free`/`resize` calls against a fixed arena and check that the
//! heap's view of the world (`get_stats`, each live allocation's actual
//! writable extent) never contradicts what the test itself tracked.

use pet_embedded::heap::avl::Avl;
use pet_embedded::heap::best_fit::BestFit;
use pet_embedded::heap::tlsf::Tlsf;
use pet_embedded::heap::Heap;
use rand::{rngs::StdRng, Rng, SeedableRng};

const ARENA_BYTES: usize = 64 * 1024;
const ITERATIONS: usize = 5_000;

struct Live {
    ptr: *mut u8,
    size: usize,
}

fn stress<P>(seed: u64)
where
    P: pet_embedded::heap::policy::FreeListPolicy<u32, 3, true>,
{
    let mut space = vec![0u8; ARENA_BYTES];
    let mut heap: Heap<'_, P, u32, 3, true> = Heap::new(&mut space).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut live: Vec<Live> = Vec::new();

    for _ in 0..ITERATIONS {
        let do_alloc = live.is_empty() || rng.gen_bool(0.6);
        if do_alloc {
            let size = rng.gen_range(1..=512);
            if let Some(ptr) = heap.alloc(size) {
                // SAFETY: the allocation is exactly `size` writable bytes.
                unsafe { std::ptr::write_bytes(ptr, (live.len() & 0xff) as u8, size) };
                live.push(Live { ptr, size });
            }
        } else if rng.gen_bool(0.5) {
            let idx = rng.gen_range(0..live.len());
            let entry = live.swap_remove(idx);
            // SAFETY: `entry.ptr` came from a prior successful `alloc` and
            // has not been freed.
            unsafe {
                assert!(heap.free(entry.ptr));
            }
        } else {
            let idx = rng.gen_range(0..live.len());
            let new_size = rng.gen_range(1..=512);
            // SAFETY: `live[idx].ptr` is a live allocation on this heap.
            if unsafe { heap.resize(live[idx].ptr, new_size) } {
                live[idx].size = new_size;
            }
        }

        let stats = heap.get_stats();
        assert_eq!(stats.n_used, live.len());
    }

    for entry in live {
        // SAFETY: every remaining entry is still a live allocation.
        unsafe {
            assert!(heap.free(entry.ptr));
        }
    }
    assert_eq!(heap.get_stats().n_used, 0);
}

#[test]
fn best_fit_survives_random_workload() {
    for seed in 0..4 {
        stress::<BestFit<u32, 3, true>>(seed);
    }
}

#[test]
fn avl_survives_random_workload() {
    for seed in 0..4 {
        stress::<Avl<u32, 3, true>>(seed);
    }
}

#[test]
fn tlsf_survives_random_workload() {
    for seed in 0..4 {
        stress::<Tlsf<u32, 3, true>>(seed);
    }
}
