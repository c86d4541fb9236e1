use the_count::*;

#[test]
fn test_default_codec_codes() {
    let c = SymbolCodec::default();
    assert_eq!(c.pack_width(), 2);
    assert_eq!(c.encode(b'A'), Ok(0));
    assert_eq!(c.encode(b'T'), Ok(1));
    assert_eq!(c.encode(b'C'), Ok(2));
    assert_eq!(c.encode(b'G'), Ok(3));
    assert_eq!(c.encode(b'N'), Err(UnrecognizedSymbol('N')));
    // No case folding at the codec level.
    assert!(c.encode(b'a').is_err());
}

#[test]
fn test_pack_width_inferred_and_explicit() {
    assert_eq!(SymbolCodec::new(b"AB", None).unwrap().pack_width(), 1);
    assert_eq!(SymbolCodec::new(b"ABC", None).unwrap().pack_width(), 2);
    assert_eq!(SymbolCodec::new(b"ABCDE", None).unwrap().pack_width(), 3);
    assert_eq!(SymbolCodec::new(b"A", None).unwrap().pack_width(), 1);
    assert_eq!(SymbolCodec::new(b"AB", Some(4)).unwrap().pack_width(), 4);
}

#[test]
fn test_codec_rejects_bad_alphabets() {
    assert_eq!(SymbolCodec::new(b"", None).unwrap_err(), CodecError::EmptyAlphabet);
    assert_eq!(
        SymbolCodec::new(b"ATA", None).unwrap_err(),
        CodecError::DuplicateSymbol('A')
    );
    assert_eq!(
        SymbolCodec::new(&[b'A', 0xC3], None).unwrap_err(),
        CodecError::NonAsciiSymbol(0xC3)
    );
    assert_eq!(
        SymbolCodec::new(b"ATCG", Some(0)).unwrap_err(),
        CodecError::PackWidthOutOfRange(0)
    );
    assert_eq!(
        SymbolCodec::new(b"ATCG", Some(9)).unwrap_err(),
        CodecError::PackWidthOutOfRange(9)
    );
    assert_eq!(
        SymbolCodec::new(b"ATCGN", Some(2)).unwrap_err(),
        CodecError::PackWidthTooSmall {
            width: 2,
            symbols: 5
        }
    );
}

#[test]
fn test_compress_orderings() {
    let m = WindowMatcher::default();
    let w = m.compress(b"ATCG").unwrap();
    assert_eq!(w.value, 0b00011011);
    assert_eq!(w.length, 4);

    let m = WindowMatcher::new(SymbolCodec::new(b"GCTA", None).unwrap());
    assert_eq!(m.compress(b"ATCG").unwrap().value, 0b11100100);

    let m = WindowMatcher::new(SymbolCodec::new(b"AB", None).unwrap());
    assert_eq!(m.compress(b"ABAB").unwrap().value, 0b0101);

    let m = WindowMatcher::new(SymbolCodec::new(b"AB", Some(2)).unwrap());
    assert_eq!(m.compress(b"ABAB").unwrap().value, 0b00010001);
}

#[test]
fn test_compress_caps_at_window() {
    let m = WindowMatcher::default();
    assert_eq!(m.capacity(), 32);
    let w = m.compress("A".repeat(33).as_bytes()).unwrap();
    assert_eq!(w.length, 32);

    let g = m.compress("G".repeat(40).as_bytes()).unwrap();
    assert_eq!(g.value, u64::MAX);
    assert_eq!(g.length, 32);

    // Symbols past the cap are never inspected.
    let mut long = "A".repeat(32);
    long.push('X');
    assert!(m.compress(long.as_bytes()).is_ok());
    assert_eq!(m.compress(b"AXG"), Err(UnrecognizedSymbol('X')));
}

#[test]
fn test_capacity_shrinks_with_wider_codes() {
    let m = WindowMatcher::new(SymbolCodec::new(b"ATCG", Some(4)).unwrap());
    assert_eq!(m.capacity(), 16);
    let m = WindowMatcher::new(SymbolCodec::new(b"ATCGN", None).unwrap());
    assert_eq!(m.capacity(), 21);
}

#[test]
fn test_move_right_two_bit() {
    let m = WindowMatcher::default();
    assert_eq!(m.move_right(0b1010, 0, 2), 0b1000);
    // TC -> CG
    assert_eq!(m.move_right(0b0110, 3, 2), 0b1011);
}

#[test]
fn test_move_right_wide_codes() {
    let m = WindowMatcher::new(SymbolCodec::new(b"ATCG", Some(4)).unwrap());
    // Two 4-bit symbols: drop the high nibble, admit code 0.
    assert_eq!(m.move_right(0b1010_1111, 0, 2), 0b1111_0000);

    let m = WindowMatcher::new(SymbolCodec::new(b"ABCDE", None).unwrap());
    // 3-bit codes, window of 3: [4,1,2] -> [1,2,3]
    let w = m.compress(b"EBC").unwrap();
    assert_eq!(m.move_right(w.value, 3, 3), m.compress(b"BCD").unwrap().value);
}

#[test]
fn test_move_right_full_width_window() {
    let m = WindowMatcher::default();
    let hay = format!("C{}", "G".repeat(31));
    let start = m.compress(hay.as_bytes()).unwrap();
    let slid = m.move_right(start.value, 3, 32);
    assert_eq!(slid, u64::MAX);
}

#[test]
fn test_find_subsequence_basics() {
    let m = WindowMatcher::default();
    assert!(m.find_subsequence(b"AT", b"GCATGC"));
    assert!(m.find_subsequence(b"AT", b"ATATAT"));
    assert!(!m.find_subsequence(b"GG", b"AATTCC"));
    assert!(!m.find_subsequence(b"GG", b""));
    assert!(!m.find_subsequence(b"GG", b"G"));
    assert!(m.find_subsequence(b"GG", b"AXGGTC"));
}

#[test]
fn test_find_subsequence_edges() {
    let m = WindowMatcher::default();
    // Needle equal to haystack.
    assert!(m.find_subsequence(b"ATCG", b"ATCG"));
    // Match at the very end.
    assert!(m.find_subsequence(b"CG", b"AAAACG"));
    // Empty needle never matches.
    assert!(!m.find_subsequence(b"", b"ATCG"));
    // Needles with foreign symbols never match.
    assert!(!m.find_subsequence(b"AXG", b"AXG"));
}

#[test]
fn test_find_subsequence_reseeds_after_unrecognized() {
    let m = WindowMatcher::default();
    // Window must not span an N.
    assert!(!m.find_subsequence(b"AT", b"ANT"));
    assert!(m.find_subsequence(b"TCG", b"ATNNTCG"));
    // Not enough symbols after the last N.
    assert!(!m.find_subsequence(b"TCG", b"TCNTC"));
    // Only unrecognized symbols.
    assert!(!m.find_subsequence(b"A", b"NNNN"));
    // Reseed right at the end.
    assert!(m.find_subsequence(b"G", b"ANG"));
}

#[test]
fn test_find_subsequence_truncates_long_needles() {
    let m = WindowMatcher::default();
    let prefix = "ATCG".repeat(8);
    let needle = format!("{prefix}TTTT");
    let hay = format!("GG{prefix}AAAA");
    assert!(m.find_subsequence(needle.as_bytes(), hay.as_bytes()));
}

#[test]
fn test_find_subsequence_non_dna_alphabet() {
    let m = WindowMatcher::new(SymbolCodec::new(b"ABCDE", None).unwrap());
    assert!(m.find_subsequence(b"EDA", b"ABEDAC"));
    assert!(!m.find_subsequence(b"EDA", b"ABEDCA"));
    assert!(m.find_subsequence(b"CE", b"AZCE"));
}

#[test]
fn test_lowercase_alphabet_folds_to_uppercase() {
    let c = SymbolCodec::new(b"acgt", None).unwrap();
    assert_eq!(c.symbols(), b"ACGT");
    assert_eq!(c.encode(b'A'), Ok(0));
    assert_eq!(c.encode(b'T'), Ok(3));
    assert!(c.encode(b'a').is_err());

    let m = WindowMatcher::new(c);
    assert!(m.find_subsequence(b"ACG", b"TTACGTT"));

    assert_eq!(
        SymbolCodec::new(b"aTA", None).unwrap_err(),
        CodecError::DuplicateSymbol('A')
    );
}
