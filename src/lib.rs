//! Exact subsequence match counting for DNA probes against sequencing reads.
//!
//! For every needle (a short probe, up to one 32-symbol window) the crate
//! reports the names of all haystack records that contain it verbatim on the
//! forward strand. Matching is presence-only: a read that contains a probe
//! several times is listed once.
//!
//! Pipeline:
//! - [`SymbolCodec`] maps alphabet symbols to fixed-width codes (2 bits for `ATCG`)
//! - [`WindowMatcher`] packs a window into one `u64` and slides it in O(1)
//! - [`SequenceStream`] parses FASTA lazily, one record at a time
//! - [`dispatch()`] batches records over a sequential loop or a rayon pool
//! - [`MatchTable`] unions the per-batch results
//!
//! [`count_files`] ties these together.

pub mod counter;
pub mod dispatch;
pub mod encode;
pub mod fasta;
pub mod logging;
mod table;
pub mod window;

pub use counter::{
    CountConfig, CountError, LongNeedlePolicy, count_files, count_haystack, count_records,
    load_needles,
};
pub use dispatch::{
    CancelToken, Cancelled, DEFAULT_BATCH_SIZE, DispatchError, DispatchOptions, WorkerContext,
    count_occurrences, dispatch,
};
pub use encode::{CodecError, DEFAULT_ALPHABET, SymbolCodec, UnrecognizedSymbol};
pub use fasta::{
    NeedleSet, ParseError, SequenceRecord, SequenceStream, sequence_count, sequence_count_until,
};
pub use table::MatchTable;
pub use window::{CompressedWindow, MAX_WINDOW, WindowMatcher};
