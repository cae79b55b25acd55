//! Counting global allocator.
//!
//! Binaries opt in with
//!
//! ```ignore
//! #[global_allocator]
//! static ALLOC: cachebench::reclaim::CountingAllocator = cachebench::reclaim::CountingAllocator;
//! ```
//!
//! [`heap_stats`] returns `None` unless the counting allocator is the one
//! serving `Box` allocations, so callers report "unavailable" instead of
//! zeros or counts from stray direct calls.

use super::HeapStats;

use std::alloc::{GlobalAlloc, Layout, System};
use std::hint::black_box;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static INSTALLED: AtomicBool = AtomicBool::new(false);
static COUNTERS: HeapCounters = HeapCounters::new();

/// Byte and call counters behind the allocator.
struct HeapCounters {
    allocated_bytes: AtomicU64,
    freed_bytes: AtomicU64,
    allocations: AtomicU64,
}

impl HeapCounters {
    const fn new() -> Self {
        Self {
            allocated_bytes: AtomicU64::new(0),
            freed_bytes: AtomicU64::new(0),
            allocations: AtomicU64::new(0),
        }
    }

    #[inline]
    fn record_alloc(&self, size: usize) {
        self.allocated_bytes.fetch_add(size as u64, Ordering::Relaxed);
        self.allocations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_free(&self, size: usize) {
        self.freed_bytes.fetch_add(size as u64, Ordering::Relaxed);
    }

    fn snapshot(&self) -> HeapStats {
        let allocated_bytes = self.allocated_bytes.load(Ordering::Relaxed);
        let freed_bytes = self.freed_bytes.load(Ordering::Relaxed);
        HeapStats {
            allocated_bytes,
            freed_bytes,
            live_bytes: allocated_bytes.saturating_sub(freed_bytes),
            allocations: self.allocations.load(Ordering::Relaxed),
        }
    }
}

/// System allocator that keeps process-wide byte and call counters.
pub struct CountingAllocator;

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            COUNTERS.record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            COUNTERS.record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        COUNTERS.record_free(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            COUNTERS.record_free(layout.size());
            COUNTERS.record_alloc(new_size);
        }
        new_ptr
    }
}

/// Whether a [`CountingAllocator`] is the process's global allocator.
///
/// Checked by making one heap allocation and watching the counters; the
/// answer is cached once it is yes.
pub fn is_installed() -> bool {
    if INSTALLED.load(Ordering::Relaxed) {
        return true;
    }

    let before = COUNTERS.allocations.load(Ordering::Relaxed);
    drop(black_box(Box::new(0u64)));
    let installed = COUNTERS.allocations.load(Ordering::Relaxed) > before;
    if installed {
        INSTALLED.store(true, Ordering::Relaxed);
    }
    installed
}

/// Current heap counters, `None` when the counting allocator is not in use.
pub fn heap_stats() -> Option<HeapStats> {
    if !is_installed() {
        return None;
    }
    Some(COUNTERS.snapshot())
}
