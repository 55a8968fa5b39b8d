//! Count per-symbol frequencies of stdin and print them.
//!
//! A direct port of `haffman.c`'s statistics pass, kept as a small demo
//! binary rather than a library export: it is useful for inspecting input
//! before compressing it, but plays no role in the compress/expand pipeline.

use std::io::Read;

const DICTSIZE: usize = 256;
const BUFFERSIZE: usize = 1024;

fn main() {
    let mut dictionary = [0u64; DICTSIZE];
    let mut buffer = [0u8; BUFFERSIZE];
    let mut stdin = std::io::stdin();

    loop {
        let read = stdin.read(&mut buffer).unwrap_or(0);
        if read == 0 {
            break;
        }
        for &b in &buffer[..read] {
            dictionary[b as usize] += 1;
        }
    }

    let mut used = 0;
    for (symbol, &count) in dictionary.iter().enumerate() {
        if count > 0 {
            println!("Symbol {symbol:03} = {count}");
            used += 1;
        }
    }
    println!("Used symbols = {used}");
}
