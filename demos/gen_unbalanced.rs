//! Emit the exponential-frequency test pattern used to stress an unbalanced
//! Huffman tree: symbol `'A'+i` repeated `2^i` times, for `i` in `0..seq`.
//!
//! A direct port of `gen_unbalanced_data.c`, kept as a demo binary; the
//! pattern it generates is also used directly (with a small `seq`) in the
//! library's own unit tests.

use std::io::Write;

fn main() {
    let seq: u32 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(22);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut freq: u64 = 1;
    for i in 0..seq {
        let symbol = b'A' + i as u8;
        eprintln!("i={}, freq={freq}", symbol as char);
        let chunk = vec![symbol; freq as usize];
        out.write_all(&chunk).expect("write to stdout failed");
        freq *= 2;
    }
}
