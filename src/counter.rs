//! Pipeline driver: needles + haystack stream → [`MatchTable`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info, warn};
use thiserror::Error;

use crate::dispatch::{self, CancelToken, DEFAULT_BATCH_SIZE, DispatchError, DispatchOptions};
use crate::encode::{CodecError, DEFAULT_ALPHABET, SymbolCodec};
use crate::fasta::{self, NeedleSet, ParseError, SequenceStream};
use crate::table::MatchTable;
use crate::window::WindowMatcher;

/// What to do with needles longer than one window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LongNeedlePolicy {
    /// Compare only the leading window-sized prefix.
    #[default]
    Truncate,
    /// Fail the run with [`CountError::NeedleTooLong`].
    Reject,
}

/// Run configuration.
#[derive(Clone, Debug)]
pub struct CountConfig {
    workers: usize,
    batch_size: usize,
    alphabet: Vec<u8>,
    pack_width: Option<u32>,
    long_needles: LongNeedlePolicy,
}

impl Default for CountConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            alphabet: DEFAULT_ALPHABET.to_vec(),
            pack_width: None,
            long_needles: LongNeedlePolicy::Truncate,
        }
    }
}

impl CountConfig {
    /// Worker threads; 0 runs sequentially on the calling thread.
    pub fn workers(mut self, n: usize) -> Self {
        self.workers = n;
        self
    }
    /// Haystack records per batch (default 10).
    pub fn batch_size(mut self, n: usize) -> Self {
        self.batch_size = n.max(1);
        self
    }
    /// Ordered alphabet; code `i` is the `i`-th symbol.
    pub fn alphabet(mut self, symbols: impl Into<Vec<u8>>) -> Self {
        self.alphabet = symbols.into();
        self
    }
    /// Explicit bits per symbol instead of `ceil(log2(|alphabet|))`.
    pub fn pack_width(mut self, bits: u32) -> Self {
        self.pack_width = Some(bits);
        self
    }
    pub fn long_needles(mut self, policy: LongNeedlePolicy) -> Self {
        self.long_needles = policy;
        self
    }

    pub fn codec(&self) -> Result<SymbolCodec, CodecError> {
        SymbolCodec::new(&self.alphabet, self.pack_width)
    }

    pub(crate) fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            workers: self.workers,
            batch_size: self.batch_size,
        }
    }
}

/// Everything that can stop a run.
///
/// File errors display the path only; the cause is the error source.
#[derive(Debug, Error)]
pub enum CountError {
    #[error("{}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}", .path.display())]
    Parse { path: PathBuf, source: ParseError },
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("needle '{needle}' has {length} symbols, more than the {capacity}-symbol window")]
    NeedleTooLong {
        needle: String,
        length: usize,
        capacity: usize,
    },
    #[error("interrupted")]
    Cancelled,
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl CountError {
    fn from_dispatch(err: DispatchError, haystack: &Path) -> Self {
        match err {
            DispatchError::Parse(source) => CountError::Parse {
                path: haystack.to_path_buf(),
                source,
            },
            DispatchError::Cancelled(_) => CountError::Cancelled,
            DispatchError::Pool(e) => CountError::Pool(e),
        }
    }
}

fn open(path: &Path) -> Result<BufReader<File>, CountError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| CountError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Load the needle file at `path`, giving up once `cancel` is tripped.
pub fn load_needles(path: &Path, cancel: &CancelToken) -> Result<NeedleSet, CountError> {
    let mut needles = NeedleSet::new();
    for rec in SequenceStream::new(open(path)?) {
        if cancel.is_cancelled() {
            return Err(CountError::Cancelled);
        }
        let rec = rec.map_err(|source| CountError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        needles.insert(rec.sequence, rec.name);
    }

    for seq in needles.sequences() {
        if let Some(labels) = needles.labels(seq).filter(|l| l.len() > 1) {
            let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
            debug!("needle '{seq}' is shared by {}", labels.join(", "));
        }
    }
    Ok(needles)
}

/// Number of records in the haystack file at `path`, for progress totals.
pub fn count_haystack(path: &Path, cancel: &CancelToken) -> Result<usize, CountError> {
    fasta::sequence_count_until(open(path)?, || cancel.is_cancelled())
        .map_err(|source| CountError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or(CountError::Cancelled)
}

/// Count matches between two FASTA files.
pub fn count_files(
    needles_path: &Path,
    haystack_path: &Path,
    cfg: &CountConfig,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(usize),
) -> Result<MatchTable, CountError> {
    let needles = load_needles(needles_path, cancel)?;
    info!(
        "loaded {} distinct needles from {}",
        needles.len(),
        needles_path.display()
    );
    let haystack = open(haystack_path)?;
    count_records(&needles, haystack, haystack_path, cfg, cancel, progress)
}

/// Count matches of `needles` over a FASTA haystack read from `haystack`.
///
/// `source` only labels parse errors.
pub fn count_records<R: BufRead>(
    needles: &NeedleSet,
    haystack: R,
    source: &Path,
    cfg: &CountConfig,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(usize),
) -> Result<MatchTable, CountError> {
    let matcher = WindowMatcher::new(cfg.codec()?);
    let codec = matcher.codec();
    info!(
        "alphabet {} at {} bits per symbol, {}-symbol window",
        String::from_utf8_lossy(codec.symbols()),
        codec.pack_width(),
        matcher.capacity()
    );
    check_needle_lengths(needles, &matcher, cfg.long_needles)?;

    let start = Instant::now();
    let mut scanned = 0usize;
    let table = dispatch::dispatch(
        SequenceStream::new(haystack),
        codec,
        needles.sequences(),
        cfg.dispatch_options(),
        cancel,
        &mut |n| {
            scanned = n;
            progress(n);
        },
    )
    .map_err(|e| CountError::from_dispatch(e, source))?;

    info!(
        "scanned {} haystack records in {:.2?}: {} needles matched, {} hits",
        scanned,
        start.elapsed(),
        table.len(),
        table.pair_count()
    );
    Ok(table)
}

fn check_needle_lengths(
    needles: &NeedleSet,
    matcher: &WindowMatcher,
    policy: LongNeedlePolicy,
) -> Result<(), CountError> {
    let capacity = matcher.capacity();
    for needle in needles.sequences() {
        if needle.len() > capacity {
            match policy {
                LongNeedlePolicy::Truncate => warn!(
                    "needle '{needle}' is {} symbols; only the first {capacity} are compared",
                    needle.len()
                ),
                LongNeedlePolicy::Reject => {
                    return Err(CountError::NeedleTooLong {
                        needle: needle.to_string(),
                        length: needle.len(),
                        capacity,
                    });
                }
            }
        }
        if let Err(e) = matcher.compress(needle.as_bytes()) {
            warn!("needle '{needle}' will never match: {e}");
        }
    }
    Ok(())
}
