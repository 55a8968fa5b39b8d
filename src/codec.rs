//! Per-block compression and expansion: histogram to packed bits, and back.
//!
//! The packing loop is grounded on `huffman.c`'s bit-accumulator approach and
//! on `tools/adaptive_huff.rs`'s `put_code`/`get_bit` style; the buffer itself
//! is a `bit_vec::BitVec`, the same crate the teacher uses in `lzss_huff.rs`.

use bit_vec::BitVec;
use std::collections::HashMap;

use crate::block::BitBuf;
use crate::htree::{assign_codes, build, CodeEntry, MAX_CODE_LEN};
use crate::Error;

/// Compress one block's raw bytes into packed bits plus its code table.
///
/// Returns `None` if `raw` is empty (no tree can be built, and no frame
/// should be emitted for an empty block).
pub fn compress(raw: &[u8]) -> Result<Option<(BitBuf, Vec<CodeEntry>)>, Error> {
    let mut histogram = [0u32; 256];
    for &b in raw {
        histogram[b as usize] += 1;
    }
    let Some(mut root) = build(&histogram) else {
        return Ok(None);
    };
    let (table, total_bits) = assign_codes(&mut root)?;

    let mut dict = [(0u32, 0u32); 256];
    for entry in &table {
        dict[entry.symbol as usize] = (entry.bits, entry.blen);
    }

    let mut packed = BitVec::with_capacity(total_bits as usize);
    for &b in raw {
        let (bits, blen) = dict[b as usize];
        for i in (0..blen).rev() {
            packed.push((bits >> i) & 1 == 1);
        }
    }
    debug_assert_eq!(packed.len() as u64, total_bits);

    Ok(Some((BitBuf { bytes: packed.to_bytes(), nbits: total_bits }, table)))
}

/// Expand one block's packed bits back to raw bytes, given its code table.
pub fn decompress(zdata: &BitBuf, table: &[CodeEntry]) -> Result<Vec<u8>, Error> {
    // Single-symbol blocks were packed at 1 bit/byte with bits=0, blen=1; a
    // lookup keyed purely on the bit pattern works the same as any other code.
    let mut lookup: HashMap<u64, u8> = HashMap::with_capacity(table.len());
    for entry in table {
        if entry.blen == 0 || entry.blen > MAX_CODE_LEN {
            return Err(Error::CodeTooLong);
        }
        let key = (1u64 << entry.blen) | entry.bits as u64;
        lookup.insert(key, entry.symbol);
    }

    let bits = BitVec::from_bytes(&zdata.bytes);
    let mut out = Vec::new();
    let mut acc: u64 = 1;
    let mut consumed = 0u64;
    for bit in bits.iter() {
        if consumed >= zdata.nbits {
            break;
        }
        acc = (acc << 1) | (bit as u64);
        consumed += 1;
        if let Some(&symbol) = lookup.get(&acc) {
            out.push(symbol);
            acc = 1;
        }
    }
    if acc != 1 {
        return Err(Error::MalformedBitstream);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(data: &[u8]) {
        match compress(data).unwrap() {
            None => assert!(data.is_empty()),
            Some((zdata, table)) => {
                let back = decompress(&zdata, &table).unwrap();
                assert_eq!(back, data);
            }
        }
    }

    #[test]
    fn empty_input_produces_no_block() {
        assert!(compress(b"").unwrap().is_none());
    }

    #[test]
    fn single_symbol_roundtrips() {
        roundtrip(b"AAAA");
    }

    #[test]
    fn two_symbol_roundtrips() {
        roundtrip(b"AABB");
    }

    #[test]
    fn text_roundtrips() {
        roundtrip(b"the quick brown fox jumps over the lazy dog, repeatedly, over and over.");
    }

    #[test]
    fn bit_count_matches_sum_of_freq_times_blen() {
        let data = b"mississippi river";
        let (zdata, table) = compress(data).unwrap().unwrap();
        let mut histogram = [0u32; 256];
        for &b in data {
            histogram[b as usize] += 1;
        }
        let expected: u64 = table
            .iter()
            .map(|e| histogram[e.symbol as usize] as u64 * e.blen as u64)
            .sum();
        assert_eq!(zdata.nbits, expected);
    }

    #[test]
    fn malformed_bitstream_is_rejected() {
        // a 2-bit code can never resolve from a single leftover bit.
        let table = vec![CodeEntry { symbol: b'a', bits: 0b01, blen: 2 }];
        let zdata = BitBuf { bytes: vec![0b0000_0000], nbits: 1 };
        assert!(decompress(&zdata, &table).is_err());
    }
}
