use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

use sparse_mlp::NetBuilder;

/// Counts allocation events (fresh allocations and reallocations).
struct CountingAlloc {
    events: AtomicUsize,
}

impl CountingAlloc {
    const fn new() -> Self {
        Self {
            events: AtomicUsize::new(0),
        }
    }

    fn reset(&self) {
        self.events.store(0, Ordering::Relaxed);
    }

    fn events(&self) -> usize {
        self.events.load(Ordering::Relaxed)
    }
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        self.events.fetch_add(1, Ordering::Relaxed);
        unsafe { System.alloc(layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        self.events.fetch_add(1, Ordering::Relaxed);
        unsafe { System.alloc_zeroed(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        self.events.fetch_add(1, Ordering::Relaxed);
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}

#[global_allocator]
static ALLOC: CountingAlloc = CountingAlloc::new();

fn make_batch(len: usize, nr_in: usize, nr_out: usize) -> Vec<(Vec<f32>, Vec<f32>)> {
    (0..len)
        .map(|i| {
            let mut costs = vec![1.0_f32; nr_out];
            costs[i % nr_out] = 0.0;
            (vec![0.1_f32; nr_in], costs)
        })
        .collect()
}

#[test]
fn train_allocations_do_not_scale_with_batch_len() {
    let (nr_in, nr_out) = (32, 8);
    let base = NetBuilder::new(&[nr_in, 64, 64, nr_out])
        .unwrap()
        .build_with_seed(0)
        .unwrap();
    let small = make_batch(4, nr_in, nr_out);
    let large = make_batch(256, nr_in, nr_out);

    let mut counts = Vec::new();
    for batch in [&small, &large] {
        let mut net = base.clone();
        ALLOC.reset();
        net.train(batch).unwrap();
        counts.push(ALLOC.events());
    }

    assert_eq!(
        counts[0], counts[1],
        "allocation events for batch len 4 vs 256: {counts:?}"
    );
}
