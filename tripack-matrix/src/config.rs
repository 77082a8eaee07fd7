use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

const DEFAULT_PARALLEL_THRESHOLD: usize = 1 << 14;

static MULTITHREAD: AtomicBool = AtomicBool::new(true);
static PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PARALLEL_THRESHOLD);

pub fn is_multithread_enabled() -> bool { 
    cfg!(feature = "multithread") && MULTITHREAD.load(Ordering::Relaxed)
}

pub fn set_multithread_enabled(flag: bool) { 
    MULTITHREAD.store(flag, Ordering::Relaxed)
}

/// Minimum buffer length for element kernels to run on the thread pool.
pub fn parallel_threshold() -> usize { 
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

pub fn set_parallel_threshold(len: usize) { 
    PARALLEL_THRESHOLD.store(len, Ordering::Relaxed)
}

pub(crate) fn should_parallelize(len: usize) -> bool { 
    is_multithread_enabled() && len >= parallel_threshold()
}
