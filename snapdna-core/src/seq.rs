//! Nucleotide helpers.

/// Base pairs that complement each other in both directions.
const PAIRS: [(u8, u8); 9] = [
    (b'A', b'T'),
    (b'C', b'G'),
    (b'R', b'Y'),
    (b'K', b'M'),
    (b'B', b'V'),
    (b'D', b'H'),
    (b'S', b'S'),
    (b'W', b'W'),
    (b'N', b'N'),
];

static COMPLEMENT: [u8; 256] = complement_table();

const fn complement_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = i as u8;
        i += 1;
    }
    let mut p = 0;
    while p < PAIRS.len() {
        let (a, b) = PAIRS[p];
        table[a as usize] = b;
        table[b as usize] = a;
        table[a.to_ascii_lowercase() as usize] = b.to_ascii_lowercase();
        table[b.to_ascii_lowercase() as usize] = a.to_ascii_lowercase();
        p += 1;
    }
    // Uracil pairs with adenine; adenine still pairs with thymine.
    table[b'U' as usize] = b'A';
    table[b'u' as usize] = b'a';
    table
}

/// IUPAC complement of one base; case is kept and other bytes map to
/// themselves.
#[inline]
pub fn complement(base: u8) -> u8 {
    COMPLEMENT[base as usize]
}

pub fn reverse_complement(bases: &[u8]) -> Vec<u8> {
    bases.iter().rev().map(|&b| complement(b)).collect()
}
