//! A bounded MPMC strip queue feeding a fixed pool of scoped worker
//! threads (spec §4.7's addition: the frame is partitioned into scanline
//! strips and rasterized in parallel), grounded in
//! `freddiehaddad-oxidized`'s bounded-channel fan-out from a single
//! producer to a pool of consumers.

use crate::config::RasterConfig;
use crossbeam_channel::bounded;
use std::ops::Range;

pub struct WorkerPool {
    threads: usize,
    strip_height: u32,
}

impl WorkerPool {
    pub fn new(config: &RasterConfig) -> WorkerPool {
        WorkerPool { threads: config.worker_threads.max(1), strip_height: config.strip_height.max(1) }
    }

    pub fn thread_count(&self) -> usize {
        self.threads
    }

    /// Splits `[0, height)` into `strip_height`-tall ranges and runs `job`
    /// against each one across the pool. A synchronous barrier: every
    /// strip has been processed by the time this returns, matching
    /// `sw-raster`'s per-draw-call dispatch (the driver issues the next
    /// primitive's strips only after this one's are done).
    pub fn run_strips<F>(&self, height: u32, job: F)
    where
        F: Fn(Range<u32>) + Sync,
    {
        if height == 0 {
            return;
        }
        let (tx, rx) = bounded::<Range<u32>>(self.threads * 4);
        std::thread::scope(|scope| {
            for _ in 0..self.threads {
                let rx = rx.clone();
                let job = &job;
                scope.spawn(move || {
                    while let Ok(strip) = rx.recv() {
                        job(strip);
                    }
                });
            }
            let mut y = 0;
            while y < height {
                let end = (y + self.strip_height).min(height);
                tx.send(y..end).expect("workers outlive the queue for the scope's duration");
                y = end;
            }
            drop(tx);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[test]
    fn every_row_is_covered_exactly_once() {
        let config = RasterConfig { worker_threads: 4, strip_height: 3 };
        let pool = WorkerPool::new(&config);
        let covered: Vec<AtomicU32> = (0..17).map(|_| AtomicU32::new(0)).collect();
        pool.run_strips(17, |range| {
            for y in range {
                covered[y as usize].fetch_add(1, Ordering::SeqCst);
            }
        });
        assert!(covered.iter().all(|c| c.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn zero_height_dispatches_no_strips() {
        let pool = WorkerPool::new(&RasterConfig { worker_threads: 2, strip_height: 4 });
        let calls = Mutex::new(0u32);
        pool.run_strips(0, |_range| {
            *calls.lock().unwrap() += 1;
        });
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn a_single_worker_still_processes_every_strip() {
        let pool = WorkerPool::new(&RasterConfig { worker_threads: 1, strip_height: 5 });
        let total = Mutex::new(0u32);
        pool.run_strips(12, |range| {
            *total.lock().unwrap() += range.end - range.start;
        });
        assert_eq!(*total.lock().unwrap(), 12);
    }
}
