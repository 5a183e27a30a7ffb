//! Execution backends for the data-parallel parts of the bounding box pipeline.
//!
//! Every algorithm in this crate is expressed as an elementwise map or a segmented reduction
//! over an index space. An [`ExecutionContext`] decides how that index space is walked: on
//! the calling thread with [`SequentialContext`], or split into contiguous chunks on the rayon
//! thread pool with `RayonContext` (requires the `rayon` feature).
//!
//! Both backends finish all work before returning, so results are ready to read as soon as a
//! call returns and calls issued one after the other on the same context run in order.

use std::ops::Range;

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "rayon")]
use tracing::trace;

/// A backend able to run elementwise maps and segmented reductions.
pub trait ExecutionContext {
    /// Computes `f(i)` for every `i` in `0..len`, in index order.
    fn map<R, F>(&self, len: usize, f: F) -> Vec<R>
    where
        F: Fn(usize) -> R + Sync + Send,
        R: Send;

    /// Reduces `(key, value)` pairs into one `(key, value)` per run of consecutive equal keys,
    /// in input order.
    ///
    /// `items` yields the pairs for any sub-range of `0..len`, which lets a backend start
    /// anywhere in the sequence without materializing it. A key that reappears after a
    /// different key starts a new run; this is not a global group-by.
    ///
    /// `combine` must be associative and commutative. Backends are free to merge the values of
    /// a run in any grouping.
    fn segmented_reduce<K, V, I, It, F>(
        &self,
        len: usize,
        items: I,
        combine: F,
    ) -> Vec<(K, V)>
    where
        K: PartialEq + Send,
        V: Send,
        I: Fn(Range<usize>) -> It + Sync + Send,
        It: Iterator<Item = (K, V)>,
        F: Fn(V, V) -> V + Sync + Send;
}

/// Runs everything on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialContext;

impl ExecutionContext for SequentialContext {
    fn map<R, F>(&self, len: usize, f: F) -> Vec<R>
    where
        F: Fn(usize) -> R + Sync + Send,
        R: Send,
    {
        (0..len).map(f).collect()
    }

    fn segmented_reduce<K, V, I, It, F>(
        &self,
        len: usize,
        items: I,
        combine: F,
    ) -> Vec<(K, V)>
    where
        K: PartialEq + Send,
        V: Send,
        I: Fn(Range<usize>) -> It + Sync + Send,
        It: Iterator<Item = (K, V)>,
        F: Fn(V, V) -> V + Sync + Send,
    {
        reduce_runs(items(0..len), &combine)
    }
}

/// Splits work into contiguous chunks and runs them on the global rayon thread pool.
#[cfg(feature = "rayon")]
#[derive(Debug, Clone, Copy)]
pub struct RayonContext {
    min_chunk_len: usize,
}

#[cfg(feature = "rayon")]
impl RayonContext {
    /// The default lower bound on the number of elements handled by one task.
    pub const DEFAULT_MIN_CHUNK_LEN: usize = 4096;

    pub fn new() -> Self {
        Self {
            min_chunk_len: Self::DEFAULT_MIN_CHUNK_LEN,
        }
    }

    /// Sets the lower bound on the number of elements handled by one task. Zero is treated
    /// as one.
    pub fn with_min_chunk_len(mut self, min_chunk_len: usize) -> Self {
        self.min_chunk_len = min_chunk_len.max(1);
        self
    }

    pub fn min_chunk_len(&self) -> usize {
        self.min_chunk_len
    }

    fn chunk_len(&self, len: usize) -> usize {
        let tasks = rayon::current_num_threads() * 4;
        self.min_chunk_len.max(len.div_ceil(tasks))
    }
}

#[cfg(feature = "rayon")]
impl Default for RayonContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "rayon")]
impl ExecutionContext for RayonContext {
    fn map<R, F>(&self, len: usize, f: F) -> Vec<R>
    where
        F: Fn(usize) -> R + Sync + Send,
        R: Send,
    {
        let mut output_vec = Vec::with_capacity(len);
        (0..len)
            .into_par_iter()
            .with_min_len(self.min_chunk_len)
            .map(f)
            .collect_into_vec(&mut output_vec);
        output_vec
    }

    fn segmented_reduce<K, V, I, It, F>(
        &self,
        len: usize,
        items: I,
        combine: F,
    ) -> Vec<(K, V)>
    where
        K: PartialEq + Send,
        V: Send,
        I: Fn(Range<usize>) -> It + Sync + Send,
        It: Iterator<Item = (K, V)>,
        F: Fn(V, V) -> V + Sync + Send,
    {
        let chunk_len = self.chunk_len(len);
        let chunks = chunk_ranges(len, chunk_len).collect::<Vec<_>>();
        trace!(len, chunk_len, num_chunks = chunks.len(), "segmented reduction plan");

        let mut partials = Vec::with_capacity(chunks.len());
        chunks
            .into_par_iter()
            .map(|range| reduce_runs(items(range), &combine))
            .collect_into_vec(&mut partials);

        stitch_runs(partials, &combine)
    }
}

/// Splits `0..len` into consecutive ranges of at most `chunk_len` elements.
#[cfg_attr(not(feature = "rayon"), allow(dead_code))]
pub(crate) fn chunk_ranges(len: usize, chunk_len: usize) -> impl Iterator<Item = Range<usize>> {
    let chunk_len = chunk_len.max(1);
    (0..len)
        .step_by(chunk_len)
        .map(move |start| start..(start + chunk_len).min(len))
}

/// Sequential segmented reduction, keeping the key of every run.
pub(crate) fn reduce_runs<K, V, F>(items: impl Iterator<Item = (K, V)>, combine: &F) -> Vec<(K, V)>
where
    K: PartialEq,
    F: Fn(V, V) -> V,
{
    let mut runs = Vec::new();
    let mut current: Option<(K, V)> = None;
    for (key, value) in items {
        current = Some(match current.take() {
            Some((run_key, acc)) if run_key == key => (run_key, combine(acc, value)),
            Some(run) => {
                runs.push(run);
                (key, value)
            }
            None => (key, value),
        });
    }
    runs.extend(current);
    runs
}

/// Joins the runs of adjacent chunks. A run cut by a chunk boundary shows up as the last run
/// of one chunk and the first run of the next, with equal keys.
#[cfg_attr(not(feature = "rayon"), allow(dead_code))]
pub(crate) fn stitch_runs<K, V, F>(
    chunks: impl IntoIterator<Item = Vec<(K, V)>>,
    combine: &F,
) -> Vec<(K, V)>
where
    K: PartialEq,
    F: Fn(V, V) -> V,
{
    let mut runs: Vec<(K, V)> = Vec::new();
    for chunk in chunks {
        let mut chunk_runs = chunk.into_iter();
        if let Some((key, value)) = chunk_runs.next() {
            match runs.pop() {
                Some((run_key, acc)) if run_key == key => runs.push((run_key, combine(acc, value))),
                Some(run) => {
                    runs.push(run);
                    runs.push((key, value));
                }
                None => runs.push((key, value)),
            }
        }
        runs.extend(chunk_runs);
    }
    runs
}
