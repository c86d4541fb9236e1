//! Batch dispatch: sequential loop or a rayon pool of per-thread workers.
//!
//! Records are grouped into batches of `batch_size` in stream order. Each batch
//! becomes a partial [`MatchTable`] that is merged on the calling thread, so
//! the aggregator is the only writer and needs no locks. In parallel mode the
//! driver reads one block of batches at a time, fans the block out over the
//! pool, then merges it; only that block is held in memory.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use rayon::prelude::*;
use thiserror::Error;

use crate::encode::SymbolCodec;
use crate::fasta::{ParseError, SequenceRecord};
use crate::table::MatchTable;
use crate::window::{CompressedWindow, WindowMatcher};

/// Canonical number of haystack records per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Batches read ahead per pool thread before fanning out.
const BATCHES_PER_WORKER: usize = 4;

/// The run was interrupted.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("cancelled")]
pub struct Cancelled;

/// Shared interrupt flag. Cloning shares the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    #[inline]
    fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Failures that stop a dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Read-only state one worker needs, built once before its first batch.
#[derive(Clone, Debug)]
pub struct WorkerContext<'a> {
    matcher: WindowMatcher,
    // Needles that cannot be packed keep `None` and never match.
    needles: Vec<(&'a str, Option<CompressedWindow>)>,
}

impl<'a> WorkerContext<'a> {
    pub fn new<I>(codec: &SymbolCodec, needles: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let matcher = WindowMatcher::new(codec.clone());
        let needles = needles
            .into_iter()
            .map(|n| (n, matcher.compress(n.as_bytes()).ok()))
            .collect();
        Self { matcher, needles }
    }

    /// Search every needle in every record of `batch`.
    pub fn process_batch(
        &self,
        batch: &[SequenceRecord],
        cancel: &CancelToken,
    ) -> Result<MatchTable, Cancelled> {
        let mut partial = MatchTable::new();
        for hay in batch {
            cancel.check()?;
            let seq = hay.sequence.as_bytes();
            for (needle, packed) in &self.needles {
                let Some(packed) = packed else { continue };
                if self.matcher.find_compressed(packed, seq) {
                    debug!("found '{needle}' in {}", hay.name);
                    partial.insert(needle, &hay.name);
                }
            }
        }
        Ok(partial)
    }
}

/// How to run the batches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchOptions {
    /// 0 = sequential on the calling thread; N > 0 = pool of N threads.
    pub workers: usize,
    pub batch_size: usize,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            workers: 0,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Match one in-memory slice of haystacks against `needles`.
pub fn count_occurrences<'a, I>(
    needles: I,
    haystacks: &[SequenceRecord],
    codec: &SymbolCodec,
) -> MatchTable
where
    I: IntoIterator<Item = &'a str>,
{
    let ctx = WorkerContext::new(codec, needles);
    // A fresh token is never tripped.
    ctx.process_batch(haystacks, &CancelToken::new())
        .unwrap_or_default()
}

/// Drive `records` through batches and aggregate the results.
///
/// `progress` receives the cumulative record count after each merged batch.
pub fn dispatch<'a, I, N>(
    records: I,
    codec: &SymbolCodec,
    needles: N,
    opts: DispatchOptions,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(usize),
) -> Result<MatchTable, DispatchError>
where
    I: IntoIterator<Item = Result<SequenceRecord, ParseError>>,
    N: IntoIterator<Item = &'a str> + Clone,
{
    let mut records = records.into_iter();
    let batch_size = opts.batch_size.max(1);

    if opts.workers == 0 {
        return run_sequential(&mut records, codec, needles, batch_size, cancel, progress);
    }
    run_parallel(
        &mut records,
        codec,
        needles,
        opts.workers,
        batch_size,
        cancel,
        progress,
    )
}

fn run_sequential<'a, I, N>(
    records: &mut I,
    codec: &SymbolCodec,
    needles: N,
    batch_size: usize,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(usize),
) -> Result<MatchTable, DispatchError>
where
    I: Iterator<Item = Result<SequenceRecord, ParseError>>,
    N: IntoIterator<Item = &'a str>,
{
    let ctx = WorkerContext::new(codec, needles);
    let mut table = MatchTable::new();
    let mut done = 0usize;

    loop {
        cancel.check()?;
        let Some(batch) = next_batch(records, batch_size)? else {
            break;
        };
        table.merge(ctx.process_batch(&batch, cancel)?);
        done += batch.len();
        progress(done);
    }
    Ok(table)
}

fn run_parallel<'a, I, N>(
    records: &mut I,
    codec: &SymbolCodec,
    needles: N,
    workers: usize,
    batch_size: usize,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(usize),
) -> Result<MatchTable, DispatchError>
where
    I: Iterator<Item = Result<SequenceRecord, ParseError>>,
    N: IntoIterator<Item = &'a str> + Clone,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("the-count-worker-{i}"))
        .build()?;

    // One context per pool thread, indexed by rayon's thread index.
    let contexts: Vec<WorkerContext<'a>> = (0..workers)
        .map(|_| WorkerContext::new(codec, needles.clone()))
        .collect();
    debug!("started {workers} workers, batch size {batch_size}");

    let block_len = workers * BATCHES_PER_WORKER;
    let mut table = MatchTable::new();
    let mut done = 0usize;

    loop {
        let mut block: Vec<Vec<SequenceRecord>> = Vec::with_capacity(block_len);
        while block.len() < block_len {
            cancel.check()?;
            match next_batch(records, batch_size)? {
                Some(batch) => block.push(batch),
                None => break,
            }
        }
        if block.is_empty() {
            break;
        }

        let partials: Vec<(usize, MatchTable)> = pool.install(|| {
            block
                .par_iter()
                .map(|batch| {
                    let ctx = &contexts[rayon::current_thread_index().unwrap_or(0) % workers];
                    ctx.process_batch(batch, cancel).map(|t| (batch.len(), t))
                })
                .collect::<Result<Vec<_>, Cancelled>>()
        })?;

        for (n, partial) in partials {
            cancel.check()?;
            table.merge(partial);
            done += n;
            progress(done);
        }
    }
    Ok(table)
}

/// Pull up to `size` records. `None` once the stream is exhausted.
fn next_batch<I>(records: &mut I, size: usize) -> Result<Option<Vec<SequenceRecord>>, ParseError>
where
    I: Iterator<Item = Result<SequenceRecord, ParseError>>,
{
    let mut batch = Vec::with_capacity(size);
    for rec in records.by_ref().take(size) {
        batch.push(rec?);
    }
    Ok(if batch.is_empty() { None } else { Some(batch) })
}
