//! Parallel candidate generation with a poll-based completion handle.
//!
//! The chunk's N×N cell footprint is embarrassingly parallel: each cell's
//! activation depends only on its own coordinates. Rows are evaluated on the
//! rayon pool and collected in row-major order, so the candidate list is
//! deterministic for a fixed (seed, coordinate, params). The owning chunk
//! polls the handle once per tick instead of blocking.

use std::sync::mpsc;

use rayon::prelude::*;

use crate::population::density;
use crate::population::params::{Category, CategoryParams};

/// Local (x, z) cell index within a chunk.
pub type CellIndex = (u32, u32);

/// Polls before a stalled job is logged (roughly ten seconds at 60 Hz).
const STALL_WARN_POLLS: u32 = 600;

/// Evaluate the sampler over every cell of an `edge`×`edge` footprint.
///
/// `capacity` bounds the output; excess candidates are dropped rather than
/// reallocating or failing. Because output order is row-major, truncation is
/// deterministic too.
pub fn generate_candidates(
    edge: u32,
    offset_x: i64,
    offset_z: i64,
    seed: u64,
    salt: u64,
    density: f32,
    capacity: usize,
) -> Vec<CellIndex> {
    let mut cells: Vec<CellIndex> = (0..edge)
        .into_par_iter()
        .flat_map_iter(|x| {
            (0..edge).filter_map(move |z| {
                if density::is_active(x, z, offset_x, offset_z, seed, salt, density) {
                    Some((x, z))
                } else {
                    None
                }
            })
        })
        .collect();

    if cells.len() > capacity {
        cells.truncate(capacity);
    }
    cells
}

/// Estimated candidate capacity for a chunk footprint and density.
pub fn estimate_capacity(edge: u32, density: f32) -> usize {
    ((edge * edge) as f32 * density * 1.5).ceil() as usize
}

/// Handle to an in-flight candidate generation job.
///
/// The worker sends its result over a channel; `poll` drains it without
/// blocking. Dropping the handle while the worker is still running is safe:
/// the worker owns all of its data and its final send simply fails.
pub struct CandidateJob {
    category: Category,
    rx: mpsc::Receiver<Vec<CellIndex>>,
    polls: u32,
    stall_logged: bool,
}

impl CandidateJob {
    /// Dispatch candidate generation for one category of one chunk.
    pub fn spawn(
        category: Category,
        edge: u32,
        chunk_offset_x: i64,
        chunk_offset_z: i64,
        seed: u64,
        params: &CategoryParams,
    ) -> Self {
        let density = params.clamped_density(category);
        let salt = category.salt();
        let offset_x = chunk_offset_x + params.offset.x as i64;
        let offset_z = chunk_offset_z + params.offset.y as i64;
        let capacity = estimate_capacity(edge, density);

        let (tx, rx) = mpsc::channel();
        rayon::spawn(move || {
            let cells =
                generate_candidates(edge, offset_x, offset_z, seed, salt, density, capacity);
            // Receiver may be gone if the chunk unloaded mid-flight
            let _ = tx.send(cells);
        });

        Self {
            category,
            rx,
            polls: 0,
            stall_logged: false,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Non-blocking completion poll.
    ///
    /// Returns the candidate list once the worker has finished, `None`
    /// while it is still running. A job that stays incomplete for an
    /// unreasonable number of polls is logged once so a stalled category is
    /// diagnosable; it is never aborted.
    pub fn poll(&mut self) -> Option<Vec<CellIndex>> {
        match self.rx.try_recv() {
            Ok(cells) => Some(cells),
            Err(mpsc::TryRecvError::Empty) => {
                self.polls += 1;
                if self.polls >= STALL_WARN_POLLS && !self.stall_logged {
                    log::warn!(
                        "{} candidate job still incomplete after {} polls",
                        self.category.label(),
                        self.polls
                    );
                    self.stall_logged = true;
                }
                None
            }
            Err(mpsc::TryRecvError::Disconnected) => {
                // Worker panicked; treat as an empty category rather than
                // stalling the chunk forever.
                log::warn!("{} candidate job worker died", self.category.label());
                Some(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::population::params::PopulationParams;

    #[test]
    fn test_candidates_deterministic() {
        let a = generate_candidates(16, -32, 48, 42, Category::Trees.salt(), 0.05, 1000);
        let b = generate_candidates(16, -32, 48, 42, Category::Trees.salt(), 0.05, 1000);
        assert_eq!(a, b);
    }

    #[test]
    fn test_candidates_row_major_order() {
        let cells = generate_candidates(32, 0, 0, 7, Category::Trees.salt(), 0.3, 10_000);
        for pair in cells.windows(2) {
            assert!(pair[0] <= pair[1], "not row-major: {:?}", pair);
        }
    }

    #[test]
    fn test_capacity_truncates_without_panic() {
        let cells = generate_candidates(32, 0, 0, 7, Category::Trees.salt(), 0.5, 10);
        assert_eq!(cells.len(), 10);
    }

    #[test]
    fn test_density_monotonic_candidate_count() {
        let lo = generate_candidates(64, 0, 0, 42, Category::Pickups.salt(), 0.05, 100_000);
        let hi = generate_candidates(64, 0, 0, 42, Category::Pickups.salt(), 0.25, 100_000);
        assert!(hi.len() >= lo.len());
        // Monotonicity is per-cell, not just in aggregate
        for cell in &lo {
            assert!(hi.contains(cell));
        }
    }

    #[test]
    fn test_job_poll_completes() {
        let params = PopulationParams::default();
        let mut job = CandidateJob::spawn(Category::Trees, 16, 0, 0, 42, &params.trees);

        let mut result = None;
        for _ in 0..500 {
            if let Some(cells) = job.poll() {
                result = Some(cells);
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        let cells = result.expect("job never completed");

        // Must match the synchronous path exactly
        let expected = generate_candidates(
            16,
            0,
            0,
            42,
            Category::Trees.salt(),
            params.trees.clamped_density(Category::Trees),
            estimate_capacity(16, params.trees.clamped_density(Category::Trees)),
        );
        assert_eq!(cells, expected);
    }

    #[test]
    fn test_dropping_job_mid_flight_is_safe() {
        let params = PopulationParams::default();
        let job = CandidateJob::spawn(Category::Deposits, 64, 0, 0, 42, &params.deposits);
        drop(job);
        // Worker finishes into a closed channel; nothing to assert beyond
        // not crashing.
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
}
