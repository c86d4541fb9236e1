//! Strict multi-record FASTA reading.
//!
//! Records are produced lazily, one per `>` header. Body lines are trimmed,
//! uppercased and concatenated; blank lines are skipped. Any structural error
//! ends the stream.

use std::collections::{BTreeMap, BTreeSet};
use std::io::BufRead;

use thiserror::Error;

/// Header marker.
pub const RECORD_MARKER: char = '>';

/// One named sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceRecord {
    pub name: String,
    pub sequence: String,
}

impl SequenceRecord {
    pub fn new(name: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sequence: sequence.into(),
        }
    }
}

/// Structural errors. Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no sequence for name '{name}' on line {line}")]
    MissingSequence { name: String, line: usize },
    #[error("unnamed sequence '{sequence}' near line {line}")]
    UnnamedSequence { sequence: String, line: usize },
    #[error("read failed")]
    Io(#[from] std::io::Error),
}

/// Forward-only record iterator over any [`BufRead`].
pub struct SequenceStream<R> {
    reader: R,
    line: String,
    lineno: usize,
    // (name, header line number)
    name: Option<(String, usize)>,
    sequence: Option<String>,
    // Body lines seen before the first header, with the line they start on.
    orphan: Option<(String, usize)>,
    done: bool,
}

impl<R: BufRead> SequenceStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            lineno: 0,
            name: None,
            sequence: None,
            orphan: None,
            done: false,
        }
    }

    fn fail(&mut self, err: ParseError) -> Option<Result<SequenceRecord, ParseError>> {
        self.done = true;
        Some(Err(err))
    }

    /// Close out the pending record at a header or at EOF.
    fn take_pending(&mut self) -> Result<Option<SequenceRecord>, ParseError> {
        if let Some((sequence, line)) = self.orphan.take() {
            return Err(ParseError::UnnamedSequence { sequence, line });
        }
        match (self.name.take(), self.sequence.take()) {
            (Some((name, _)), Some(sequence)) => Ok(Some(SequenceRecord { name, sequence })),
            (Some((name, line)), None) => Err(ParseError::MissingSequence { name, line }),
            (None, _) => Ok(None),
        }
    }
}

impl<R: BufRead> Iterator for SequenceStream<R> {
    type Item = Result<SequenceRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            self.line.clear();
            let n = match self.reader.read_line(&mut self.line) {
                Ok(n) => n,
                Err(e) => return self.fail(e.into()),
            };

            if n == 0 {
                self.done = true;
                return match self.take_pending() {
                    Ok(rec) => rec.map(Ok),
                    Err(e) => Some(Err(e)),
                };
            }
            self.lineno += 1;

            if let Some(header) = self.line.strip_prefix(RECORD_MARKER) {
                let header = header.trim().to_string();
                let completed = match self.take_pending() {
                    Ok(rec) => rec,
                    Err(e) => return self.fail(e),
                };
                self.name = Some((header, self.lineno));
                if let Some(rec) = completed {
                    return Some(Ok(rec));
                }
                continue;
            }

            let fragment = self.line.trim();
            if fragment.is_empty() {
                continue;
            }
            let fragment = fragment.to_ascii_uppercase();

            if self.name.is_none() {
                match self.orphan.as_mut() {
                    Some((seq, _)) => seq.push_str(&fragment),
                    None => self.orphan = Some((fragment, self.lineno)),
                }
                continue;
            }
            match self.sequence.as_mut() {
                Some(seq) => seq.push_str(&fragment),
                None => self.sequence = Some(fragment),
            }
        }
    }
}

/// Needles keyed by sequence; each sequence keeps every label it appeared under.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NeedleSet {
    labels: BTreeMap<String, BTreeSet<String>>,
}

impl NeedleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every record of a FASTA source; fails on the first structural error.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ParseError> {
        Self::from_records(SequenceStream::new(reader))
    }

    pub fn from_records<I>(records: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = Result<SequenceRecord, ParseError>>,
    {
        let mut set = Self::new();
        for rec in records {
            let rec = rec?;
            set.insert(rec.sequence, rec.name);
        }
        Ok(set)
    }

    pub fn insert(&mut self, sequence: impl Into<String>, label: impl Into<String>) {
        self.labels
            .entry(sequence.into())
            .or_default()
            .insert(label.into());
    }

    /// Distinct needle sequences, sorted.
    pub fn sequences(&self) -> impl Iterator<Item = &str> + Clone {
        self.labels.keys().map(String::as_str)
    }

    pub fn labels(&self, sequence: &str) -> Option<&BTreeSet<String>> {
        self.labels.get(sequence)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for NeedleSet {
    /// Unlabelled needles; each sequence is its own label.
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = Self::new();
        for seq in iter {
            let seq = seq.into();
            set.insert(seq.clone(), seq);
        }
        set
    }
}

/// Number of `>` headers in a FASTA source.
pub fn sequence_count<R: BufRead>(reader: R) -> std::io::Result<usize> {
    Ok(sequence_count_until(reader, || false)?.unwrap_or_default())
}

/// Like [`sequence_count`], but gives up with `None` as soon as `stop` returns
/// true. `stop` is polled once per line.
pub fn sequence_count_until<R, F>(reader: R, mut stop: F) -> std::io::Result<Option<usize>>
where
    R: BufRead,
    F: FnMut() -> bool,
{
    let mut count = 0;
    for line in reader.lines() {
        if stop() {
            return Ok(None);
        }
        if line?.starts_with(RECORD_MARKER) {
            count += 1;
        }
    }
    Ok(Some(count))
}
