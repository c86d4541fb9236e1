//! Needle → matching haystack names, plus the text report.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

/// Accumulated matches. Sets only grow; merging is a per-needle union.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchTable {
    hits: BTreeMap<String, BTreeSet<String>>,
}

impl MatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `haystack` contains `needle`. Repeats collapse.
    pub fn insert(&mut self, needle: &str, haystack: &str) -> bool {
        match self.hits.get_mut(needle) {
            Some(names) => names.insert(haystack.to_string()),
            None => {
                self.hits
                    .insert(needle.to_string(), BTreeSet::from([haystack.to_string()]));
                true
            }
        }
    }

    /// Fold a partial (per-batch) table into this one.
    pub fn merge(&mut self, partial: MatchTable) {
        for (needle, names) in partial.hits {
            match self.hits.get_mut(&needle) {
                Some(existing) => existing.extend(names),
                None => {
                    self.hits.insert(needle, names);
                }
            }
        }
    }

    pub fn get(&self, needle: &str) -> Option<&BTreeSet<String>> {
        self.hits.get(needle)
    }

    /// `(needle, names)` in needle order, skipping needles with no names.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.hits
            .iter()
            .filter(|(_, names)| !names.is_empty())
            .map(|(needle, names)| (needle.as_str(), names))
    }

    /// Number of needles with at least one match.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total (needle, haystack) pairs.
    pub fn pair_count(&self) -> usize {
        self.hits.values().map(BTreeSet::len).sum()
    }

    /// Write the grouped report: `NEEDLE:` then one indented name per line.
    pub fn write_report<W: Write>(&self, mut w: W) -> io::Result<()> {
        for (needle, names) in self.iter() {
            writeln!(w, "{needle}:")?;
            for name in names {
                writeln!(w, "    {name}")?;
            }
        }
        w.flush()
    }
}
