//! Chunked processing of local operations
//!
//! Convolution, versine and smoothing only read a bounded neighbourhood
//! around each output sample. Large series are split into chunks whose
//! input view carries a halo of that radius, so every chunk computes
//! exactly the samples a whole-series pass would. A `chunk_size` of
//! `None` processes the whole series as a single chunk.

use crate::error::{RestorationError, Result};
use rayon::prelude::*;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Default chunk length used by the pipeline when chunking is enabled
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Progress notification emitted after each completed chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkProgress {
    /// Number of chunks finished so far
    pub completed: usize,

    /// Total number of chunks
    pub total: usize,

    /// Output samples finished so far
    pub samples_done: usize,
}

impl ChunkProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// How a local operation is split up
#[derive(Clone, Copy, Default)]
pub struct ChunkOptions<'a> {
    /// Output samples per chunk (`None` = whole series)
    pub chunk_size: Option<usize>,

    /// Run chunks on the rayon pool
    pub parallel: bool,

    progress: Option<&'a (dyn Fn(ChunkProgress) + Sync)>,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> ChunkOptions<'a> {
    pub fn whole_series() -> Self {
        Self::default()
    }

    pub fn chunked(chunk_size: usize) -> Self {
        Self {
            chunk_size: Some(chunk_size),
            ..Self::default()
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Called after every finished chunk (from worker threads in parallel mode)
    pub fn with_progress(mut self, progress: &'a (dyn Fn(ChunkProgress) + Sync)) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Checked before each chunk starts; setting it aborts the whole run
    pub fn with_cancel(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn notify(&self, progress: ChunkProgress) {
        if let Some(callback) = self.progress {
            callback(progress);
        }
    }
}

impl std::fmt::Debug for ChunkOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkOptions")
            .field("chunk_size", &self.chunk_size)
            .field("parallel", &self.parallel)
            .field("progress", &self.progress.is_some())
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

/// Input window of one chunk: the chunk's samples plus the halo on both sides
pub struct ChunkView<'a> {
    data: &'a [f64],
    offset: usize,
    total_len: usize,
}

impl<'a> ChunkView<'a> {
    /// Length of the full series this view belongs to
    pub fn total_len(&self) -> usize {
        self.total_len
    }

    /// Sample at a global index, `None` outside the series
    #[inline]
    pub fn try_get(&self, index: isize) -> Option<f64> {
        if index < 0 || index as usize >= self.total_len {
            return None;
        }
        let local = index as usize - self.offset;
        debug_assert!(local < self.data.len(), "read outside the chunk halo");
        Some(self.data[local])
    }

    /// Sample at a global index with zero fill outside the series
    #[inline]
    pub fn get(&self, index: isize) -> f64 {
        self.try_get(index).unwrap_or(0.0)
    }

    /// Global index range covered by the view (chunk plus halo, clipped to the series)
    pub fn covered(&self) -> Range<usize> {
        self.offset..self.offset + self.data.len()
    }

    pub fn data(&self) -> &'a [f64] {
        self.data
    }
}

/// Split `0..len` into chunk output ranges
pub fn chunk_ranges(len: usize, chunk_size: Option<usize>) -> Result<Vec<Range<usize>>> {
    let size = match chunk_size {
        Some(0) => {
            return Err(RestorationError::invalid_input("chunk size must be positive"));
        }
        Some(size) => size,
        None => len.max(1),
    };
    Ok((0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect())
}

/// Run a local operation over `input` chunk by chunk
///
/// `kernel` receives the chunk's view (with `halo` extra samples each
/// side) and the global output range it must fill, and returns exactly
/// `range.len()` values. Output is the concatenation of all chunks.
///
/// # Errors
/// `Cancelled` if the cancel flag is observed before a chunk starts;
/// `InvalidInput` for a zero chunk size.
pub fn process_chunked<F>(
    input: &[f64],
    halo: usize,
    options: &ChunkOptions<'_>,
    kernel: F,
) -> Result<Vec<f64>>
where
    F: Fn(&ChunkView<'_>, Range<usize>) -> Vec<f64> + Sync,
{
    let len = input.len();
    let ranges = chunk_ranges(len, options.chunk_size)?;
    let total = ranges.len();

    let run_chunk = |range: Range<usize>| -> Vec<f64> {
        let lo = range.start.saturating_sub(halo);
        let hi = (range.end + halo).min(len);
        let view = ChunkView {
            data: &input[lo..hi],
            offset: lo,
            total_len: len,
        };
        let out = kernel(&view, range.clone());
        debug_assert_eq!(out.len(), range.len());
        out
    };

    if options.parallel && total > 1 {
        let completed = AtomicUsize::new(0);
        let samples_done = AtomicUsize::new(0);

        let chunks: Vec<Vec<f64>> = ranges
            .into_par_iter()
            .map(|range| {
                if options.is_cancelled() {
                    return Err(RestorationError::Cancelled);
                }
                let count = range.len();
                let out = run_chunk(range);
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                let samples = samples_done.fetch_add(count, Ordering::SeqCst) + count;
                options.notify(ChunkProgress {
                    completed: done,
                    total,
                    samples_done: samples,
                });
                Ok(out)
            })
            .collect::<Result<Vec<_>>>()?;

        // All chunks joined; stitch in order
        return Ok(chunks.concat());
    }

    let mut output = Vec::with_capacity(len);
    for (i, range) in ranges.into_iter().enumerate() {
        if options.is_cancelled() {
            return Err(RestorationError::Cancelled);
        }
        output.extend(run_chunk(range));
        options.notify(ChunkProgress {
            completed: i + 1,
            total,
            samples_done: output.len(),
        });
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// 3-point sum with zero fill, enough to exercise the halo
    fn three_point_sum(view: &ChunkView<'_>, range: Range<usize>) -> Vec<f64> {
        range
            .map(|i| {
                let i = i as isize;
                view.get(i - 1) + view.get(i) + view.get(i + 1)
            })
            .collect()
    }

    #[test]
    fn test_chunk_ranges() {
        let ranges = chunk_ranges(25, Some(10)).unwrap();
        assert_eq!(ranges, vec![0..10, 10..20, 20..25]);
        assert_eq!(chunk_ranges(25, None).unwrap(), vec![0..25]);
        assert!(chunk_ranges(0, None).unwrap().is_empty());
        assert!(chunk_ranges(10, Some(0)).is_err());
    }

    #[test]
    fn test_chunked_matches_whole_series() {
        let input: Vec<f64> = (0..1003).map(|i| (i as f64 * 0.37).sin() * 5.0).collect();

        let whole =
            process_chunked(&input, 1, &ChunkOptions::whole_series(), three_point_sum).unwrap();
        let chunked =
            process_chunked(&input, 1, &ChunkOptions::chunked(100), three_point_sum).unwrap();
        let parallel = process_chunked(
            &input,
            1,
            &ChunkOptions::chunked(64).with_parallel(true),
            three_point_sum,
        )
        .unwrap();

        assert_eq!(whole.len(), input.len());
        assert_eq!(whole, chunked);
        assert_eq!(whole, parallel);
        assert!((whole[0] - (input[0] + input[1])).abs() < 1e-12);
    }

    #[test]
    fn test_progress_after_each_chunk() {
        let input = vec![1.0; 250];
        let seen = Mutex::new(Vec::new());
        let record = |p: ChunkProgress| seen.lock().unwrap().push(p);
        let options = ChunkOptions::chunked(100).with_progress(&record);

        process_chunked(&input, 1, &options, three_point_sum).unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2].completed, 3);
        assert_eq!(seen[2].total, 3);
        assert_eq!(seen[2].samples_done, 250);
        assert!((seen[2].fraction() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cancel_between_chunks() {
        let input = vec![1.0; 300];
        let cancel = AtomicBool::new(false);
        let stop_after_first = |p: ChunkProgress| {
            if p.completed == 1 {
                cancel.store(true, Ordering::SeqCst);
            }
        };
        let options = ChunkOptions::chunked(100)
            .with_progress(&stop_after_first)
            .with_cancel(&cancel);

        let result = process_chunked(&input, 1, &options, three_point_sum);
        assert!(matches!(result, Err(RestorationError::Cancelled)));
    }
}
