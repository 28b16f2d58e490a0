//! Worker pool setup for parallel script extraction.

use anyhow::{Context, Result};

/// Stack size of each worker thread.
pub const WORKER_STACK_SIZE: usize = 8 * 1024 * 1024;

/// Worker count for `jobs`: the explicit value if given, otherwise one per core.
pub fn worker_count(jobs: Option<usize>) -> usize {
    jobs.filter(|&n| n > 0).unwrap_or_else(num_cpus::get).max(1)
}

/// Initialize the global rayon thread pool.
pub fn init_thread_pool(jobs: Option<usize>) -> Result<usize> {
    let workers = worker_count(jobs);

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .stack_size(WORKER_STACK_SIZE)
        .build_global()
        .context("Failed to initialize worker pool")?;

    tracing::info!(
        workers,
        cores = num_cpus::get(),
        "initialized thread pool"
    );

    Ok(workers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_count() {
        assert_eq!(worker_count(Some(3)), 3);
        assert_eq!(worker_count(Some(0)), num_cpus::get().max(1));
        assert_eq!(worker_count(None), num_cpus::get().max(1));
    }
}
