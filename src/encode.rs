//! Symbol encoding: alphabet → fixed-width bit codes.
//!
//! Conventions
//! - Codes are contiguous from 0 in alphabet order (`A,T,C,G` by default).
//! - `pack_width` is `ceil(log2(|alphabet|))` bits unless overridden, never 0.
//! - Lookup is a 256-entry LUT; symbols outside the alphabet map to `UNMAPPED`.
//! - Alphabet symbols are folded to ASCII uppercase, matching parsed records.

use thiserror::Error;

/// Default alphabet ordering: A=00, T=01, C=10, G=11.
pub const DEFAULT_ALPHABET: &[u8] = b"ATCG";

/// Widest supported code, in bits.
pub const MAX_PACK_WIDTH: u32 = 8;

const UNMAPPED: u8 = 0xFF;

/// Errors raised while building a [`SymbolCodec`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("alphabet is empty")]
    EmptyAlphabet,
    #[error("symbol '{0}' appears more than once in the alphabet")]
    DuplicateSymbol(char),
    #[error("alphabet symbol {0:#04x} is not ASCII")]
    NonAsciiSymbol(u8),
    #[error("pack width {0} is outside 1..=8")]
    PackWidthOutOfRange(u32),
    #[error("pack width {width} cannot hold {symbols} distinct codes")]
    PackWidthTooSmall { width: u32, symbols: usize },
}

/// A symbol with no code in the alphabet.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("unrecognized symbol {0:?}")]
pub struct UnrecognizedSymbol(pub char);

/// Immutable symbol → code mapping. Cheap to clone (one LUT).
#[derive(Clone, Debug)]
pub struct SymbolCodec {
    lut: [u8; 256],
    symbols: Vec<u8>,
    pack_width: u32,
}

impl SymbolCodec {
    /// Build a codec from an ordered alphabet and an optional explicit width.
    ///
    /// `acgt` and `ACGT` build the same codec; `aA` is a duplicate.
    pub fn new(alphabet: &[u8], pack_width: Option<u32>) -> Result<Self, CodecError> {
        if alphabet.is_empty() {
            return Err(CodecError::EmptyAlphabet);
        }

        let mut lut = [UNMAPPED; 256];
        let mut symbols = Vec::with_capacity(alphabet.len());
        for (code, &raw) in alphabet.iter().enumerate() {
            if !raw.is_ascii() {
                return Err(CodecError::NonAsciiSymbol(raw));
            }
            let sym = raw.to_ascii_uppercase();
            if lut[sym as usize] != UNMAPPED {
                return Err(CodecError::DuplicateSymbol(sym as char));
            }
            // ASCII alphabets have at most 128 symbols, so codes stay below UNMAPPED.
            lut[sym as usize] = code as u8;
            symbols.push(sym);
        }

        let needed = bits_for(alphabet.len());
        let width = match pack_width {
            None => needed,
            Some(w) if w == 0 || w > MAX_PACK_WIDTH => {
                return Err(CodecError::PackWidthOutOfRange(w));
            }
            Some(w) if w < needed => {
                return Err(CodecError::PackWidthTooSmall {
                    width: w,
                    symbols: alphabet.len(),
                });
            }
            Some(w) => w,
        };

        Ok(Self {
            lut,
            symbols,
            pack_width: width,
        })
    }

    /// Code for `symbol`, or [`UnrecognizedSymbol`] if it is not in the alphabet.
    #[inline]
    pub fn encode(&self, symbol: u8) -> Result<u64, UnrecognizedSymbol> {
        match self.lut[symbol as usize] {
            UNMAPPED => Err(UnrecognizedSymbol(symbol as char)),
            code => Ok(code as u64),
        }
    }

    /// Bits per symbol.
    #[inline]
    pub fn pack_width(&self) -> u32 {
        self.pack_width
    }

    /// Alphabet in code order.
    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Default for SymbolCodec {
    fn default() -> Self {
        let mut lut = [UNMAPPED; 256];
        for (code, &sym) in DEFAULT_ALPHABET.iter().enumerate() {
            lut[sym as usize] = code as u8;
        }
        Self {
            lut,
            symbols: DEFAULT_ALPHABET.to_vec(),
            pack_width: 2,
        }
    }
}

/// `ceil(log2(n))`, at least 1.
#[inline]
fn bits_for(n: usize) -> u32 {
    if n <= 2 {
        1
    } else {
        usize::BITS - (n - 1).leading_zeros()
    }
}
