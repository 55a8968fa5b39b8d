//! On-wire framing: one length-prefixed, self-describing record per block.
//!
//! Grounded on `testpbwrite.c`/`testpbread.c`'s `hpb_t` message (`bits_len`,
//! `symbols_table`, `lengths_table`, `codes_table`, `payload`) and on
//! `hblock.c`'s `streamreader`, which reads a big-endian `uint32_t` length
//! prefix followed by exactly that many bytes of record. The record itself is
//! encoded as a flat big-endian layout rather than pulled through a protobuf
//! crate — see DESIGN.md's Open Question resolution.

use std::io::{Read, Write};

use crate::block::BitBuf;
use crate::htree::CodeEntry;
use crate::Error;

/// Maximum number of distinct symbols a block's table may carry.
pub const DICTSIZE: usize = 256;

fn write_u32<W: Write>(w: &mut W, v: u32) -> Result<(), Error> {
    w.write_all(&v.to_be_bytes()).map_err(|_| Error::IoWrite)
}

fn read_u32<R: Read>(r: &mut R) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Serialize one block's compressed bits and code table as a length-prefixed
/// frame and write it to `w`.
pub fn write_frame<W: Write>(w: &mut W, zdata: &BitBuf, table: &[CodeEntry]) -> Result<(), Error> {
    let k = table.len();
    debug_assert!(k <= DICTSIZE);

    // bits_len(4) + K(4) + 3*K*4 (symbols/lengths/codes) + payload
    let record_len = 4 + 4 + 3 * k * 4 + zdata.bytes.len();
    let mut record = Vec::with_capacity(record_len);
    record.extend_from_slice(&(zdata.nbits as u32).to_be_bytes());
    record.extend_from_slice(&(k as u32).to_be_bytes());
    for e in table {
        record.extend_from_slice(&(e.symbol as u32).to_be_bytes());
    }
    for e in table {
        record.extend_from_slice(&e.blen.to_be_bytes());
    }
    for e in table {
        record.extend_from_slice(&e.bits.to_be_bytes());
    }
    record.extend_from_slice(&zdata.bytes);

    write_u32(w, record.len() as u32)?;
    w.write_all(&record).map_err(|_| Error::IoWrite)
}

/// Read one frame from `r`. `Ok(None)` signals a clean end of stream (either
/// real EOF, or a malformed/oversized length prefix, both of which the
/// pipeline treats as "nothing more to read").
pub fn read_frame<R: Read>(
    r: &mut R,
    message_max: usize,
) -> Result<Option<(BitBuf, Vec<CodeEntry>)>, Error> {
    let len = match read_u32(r) {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };
    if len as usize > message_max {
        log::debug!("frame length {len} exceeds message_max {message_max}, treating as EOF");
        return Ok(None);
    }
    let mut record = vec![0u8; len as usize];
    if r.read_exact(&mut record).is_err() {
        return Ok(None);
    }
    match parse_record(&record) {
        Ok(v) => Ok(Some(v)),
        Err(Error::MalformedFrame) => {
            log::debug!("malformed frame record, treating as EOF");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn parse_record(record: &[u8]) -> Result<(BitBuf, Vec<CodeEntry>), Error> {
    let mut cur = std::io::Cursor::new(record);
    let bits_len = read_u32(&mut cur).map_err(|_| Error::MalformedFrame)?;
    let k = read_u32(&mut cur).map_err(|_| Error::MalformedFrame)? as usize;
    if k > DICTSIZE {
        return Err(Error::MalformedFrame);
    }
    let mut symbols = Vec::with_capacity(k);
    for _ in 0..k {
        let s = read_u32(&mut cur).map_err(|_| Error::MalformedFrame)?;
        if s > 255 {
            return Err(Error::MalformedFrame);
        }
        symbols.push(s as u8);
    }
    let mut lengths = Vec::with_capacity(k);
    for _ in 0..k {
        lengths.push(read_u32(&mut cur).map_err(|_| Error::MalformedFrame)?);
    }
    let mut codes = Vec::with_capacity(k);
    for _ in 0..k {
        codes.push(read_u32(&mut cur).map_err(|_| Error::MalformedFrame)?);
    }
    let payload_len = bits_len.div_ceil(8) as usize;
    let mut payload = vec![0u8; payload_len];
    cur.read_exact(&mut payload).map_err(|_| Error::MalformedFrame)?;

    let table = symbols
        .into_iter()
        .zip(lengths)
        .zip(codes)
        .map(|((symbol, blen), bits)| CodeEntry { symbol, bits, blen })
        .collect();

    Ok((BitBuf { bytes: payload, nbits: bits_len as u64 }, table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_roundtrip_preserves_fields() {
        let table = vec![
            CodeEntry { symbol: b'a', bits: 0b0, blen: 1 },
            CodeEntry { symbol: b'b', bits: 0b1, blen: 1 },
        ];
        let zdata = BitBuf { bytes: vec![0b1010_0000], nbits: 4 };
        let mut buf = Vec::new();
        write_frame(&mut buf, &zdata, &table).unwrap();

        let mut cur = std::io::Cursor::new(buf);
        let (got_zdata, mut got_table) = read_frame(&mut cur, crate::HPB_MESSAGE_MAX)
            .unwrap()
            .expect("frame parses");
        got_table.sort_by_key(|e| e.symbol);
        assert_eq!(got_zdata.nbits, zdata.nbits);
        assert_eq!(got_zdata.bytes, zdata.bytes);
        assert_eq!(got_table, table);
    }

    #[test]
    fn malformed_length_prefix_ends_cleanly() {
        let mut cur = std::io::Cursor::new(0xFFFF_FFFFu32.to_be_bytes().to_vec());
        let result = read_frame(&mut cur, crate::HPB_MESSAGE_MAX).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn truncated_stream_ends_cleanly() {
        let mut cur = std::io::Cursor::new(vec![0u8; 2]);
        let result = read_frame(&mut cur, crate::HPB_MESSAGE_MAX).unwrap();
        assert!(result.is_none());
    }
}
