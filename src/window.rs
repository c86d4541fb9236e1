//! Bit-packed sliding window search.
//!
//! A window of `length` symbols is held **LSB-aligned** in a `u64`: the lower
//! `length * pack_width` bits are used, first symbol most significant. Sliding
//! right is O(1): clear the leading symbol, shift by `pack_width`, OR in the
//! new code. Symbols outside the alphabet never enter a window; the window is
//! reseeded after them.

use log::trace;

use crate::encode::{SymbolCodec, UnrecognizedSymbol};

/// Hard ceiling on symbols per window.
pub const MAX_WINDOW: usize = 32;

/// A packed run of symbols.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CompressedWindow {
    /// Packed codes, LSB-aligned.
    pub value: u64,
    /// Number of symbols encoded in `value`.
    pub length: usize,
}

/// Exact-match search over one codec.
#[derive(Clone, Debug)]
pub struct WindowMatcher {
    codec: SymbolCodec,
    capacity: usize,
}

impl WindowMatcher {
    pub fn new(codec: SymbolCodec) -> Self {
        let width = codec.pack_width() as usize;
        let capacity = MAX_WINDOW.min(u64::BITS as usize / width);
        Self { codec, capacity }
    }

    pub fn codec(&self) -> &SymbolCodec {
        &self.codec
    }

    /// Most symbols a single window can hold (32 for 2-bit codes).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pack up to [`capacity`](Self::capacity) symbols of `seq`; the rest is ignored.
    pub fn compress(&self, seq: &[u8]) -> Result<CompressedWindow, UnrecognizedSymbol> {
        let width = self.codec.pack_width();
        let mut value = 0u64;
        let mut length = 0usize;
        for &b in seq.iter().take(self.capacity) {
            value = (value << width) | self.codec.encode(b)?;
            length += 1;
        }
        Ok(CompressedWindow { value, length })
    }

    /// Slide a window of `length` symbols one position right, admitting `code`.
    #[inline]
    pub fn move_right(&self, value: u64, code: u64, length: usize) -> u64 {
        let width = self.codec.pack_width();
        let keep = low_mask((length.saturating_sub(1)) as u32 * width);
        ((value & keep) << width) | code
    }

    /// Whether `needle` (truncated to capacity) occurs contiguously in `haystack`.
    ///
    /// A needle containing symbols outside the alphabet never matches.
    pub fn find_subsequence(&self, needle: &[u8], haystack: &[u8]) -> bool {
        match self.compress(needle) {
            Ok(window) => self.find_compressed(&window, haystack),
            Err(e) => {
                trace!("needle cannot be packed: {e}");
                false
            }
        }
    }

    /// Same as [`find_subsequence`](Self::find_subsequence) for an already packed needle.
    pub fn find_compressed(&self, needle: &CompressedWindow, haystack: &[u8]) -> bool {
        let len = needle.length;
        if len == 0 || haystack.len() < len {
            return false;
        }

        let Some((mut window, mut next)) = self.seed(haystack, 0, len) else {
            return false;
        };

        loop {
            if window == needle.value {
                return true;
            }
            let Some(&b) = haystack.get(next) else {
                return false;
            };
            match self.codec.encode(b) {
                Ok(code) => {
                    window = self.move_right(window, code, len);
                    next += 1;
                }
                Err(e) => {
                    trace!("{e} at offset {next}, reseeding");
                    match self.seed(haystack, next + 1, len) {
                        Some((w, n)) => {
                            window = w;
                            next = n;
                        }
                        None => return false,
                    }
                }
            }
        }
    }

    /// Pack the first `len` consecutive recognized symbols at or after `start`.
    ///
    /// Returns the window and the index of the first symbol after it, or `None`
    /// if the haystack runs out first.
    fn seed(&self, haystack: &[u8], start: usize, len: usize) -> Option<(u64, usize)> {
        let width = self.codec.pack_width();
        let mut value = 0u64;
        let mut filled = 0usize;
        let mut i = start;
        while filled < len {
            // Not enough symbols left to fill the window.
            if haystack.len() - i.min(haystack.len()) < len - filled {
                return None;
            }
            match self.codec.encode(haystack[i]) {
                Ok(code) => {
                    value = (value << width) | code;
                    filled += 1;
                }
                Err(e) => {
                    trace!("{e} at offset {i} while seeding");
                    value = 0;
                    filled = 0;
                }
            }
            i += 1;
        }
        Some((value, i))
    }
}

impl Default for WindowMatcher {
    fn default() -> Self {
        Self::new(SymbolCodec::default())
    }
}

/// Mask of the lower `bits` bits.
#[inline]
fn low_mask(bits: u32) -> u64 {
    if bits >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}
