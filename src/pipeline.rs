//! Reader/worker-pool/writer orchestration over the bounded FIFO.
//!
//! Grounded on `huffman.c`'s `#pragma omp parallel` section: one reader task,
//! one writer task, and a pool of worker tasks sharing a `fqueue` and a
//! process-wide state flag. Threads here are plain `std::thread` (via
//! `std::thread::scope`, so the reader/writer can borrow the caller's
//! `Read`/`Write` without `'static` bounds) coordinated through the shared
//! [`Context`] instead of the source's file-scope globals.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::block::{Block, State};
use crate::codec;
use crate::fifo::Fifo;
use crate::frame;
use crate::{Config, Error};

/// Process-wide pipeline lifecycle, mirroring `pstate_t` in `huffman.c`.
/// Monotonic: `Working -> Pending -> Finished`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ProcessState {
    Working,
    Pending,
    Finished,
}

/// Shared state handed to every pipeline thread.
struct Context {
    fifo: Fifo,
    state: Mutex<ProcessState>,
    workers_remaining: AtomicUsize,
    /// set by a worker that hits a fatal per-block error, or by the writer on
    /// I/O failure; surfaced to the caller once all threads join.
    fatal: Mutex<Option<Error>>,
}

impl Context {
    fn new(max_len: usize, workers: usize) -> Self {
        Context {
            fifo: Fifo::new(max_len),
            state: Mutex::new(ProcessState::Working),
            workers_remaining: AtomicUsize::new(workers),
            fatal: Mutex::new(None),
        }
    }

    fn set_state(&self, s: ProcessState) {
        let mut guard = self.state.lock().unwrap();
        log::debug!("pipeline state {:?} -> {:?}", *guard, s);
        *guard = s;
    }

    fn state(&self) -> ProcessState {
        *self.state.lock().unwrap()
    }

    fn record_fatal(&self, e: Error) {
        let mut guard = self.fatal.lock().unwrap();
        if guard.is_none() {
            *guard = Some(e);
        }
    }
}

/// Compress `input` into the framed wire format, writing to `output`.
pub fn compress<R: Read + Send, W: Write + Send>(
    input: &mut R,
    output: &mut W,
    config: &Config,
) -> Result<(), Error> {
    let workers = config.resolved_workers();
    let ctx = Context::new(config.fifo_max_len, workers);

    std::thread::scope(|scope| {
        scope.spawn(|| reader_compress(input, &ctx, config));
        for _ in 0..workers {
            scope.spawn(|| worker_compress(&ctx));
        }
        let writer_result = writer_compress(output, &ctx);
        if let Err(e) = writer_result {
            ctx.record_fatal(e);
        }
    });

    match ctx.fatal.lock().unwrap().take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn reader_compress<R: Read>(input: &mut R, ctx: &Context, config: &Config) {
    let mut seq = 0u64;
    loop {
        let mut buf = vec![0u8; config.buffer_size];
        let mut filled = 0usize;
        // Fill the buffer as much as possible before handing it to a worker,
        // but accept a short final read as end of stream (matches the
        // source's `rawreader`, which treats any non-positive read as EOF).
        loop {
            match input.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(_) => {
                    filled = 0;
                    break;
                }
            }
            if filled == buf.len() {
                break;
            }
        }
        if filled == 0 {
            break;
        }
        buf.truncate(filled);
        log::debug!("reader: read block of {filled} bytes");
        ctx.fifo.push(Block::from_raw(seq, buf));
        seq += 1;
    }
    ctx.set_state(ProcessState::Pending);
}

fn worker_compress(ctx: &Context) {
    loop {
        if let Some(mut block) = ctx.fifo.claim_first(State::RawReady) {
            let seq = block.seq;
            log::debug!("worker: compressing block {seq}");
            match codec::compress(&block.raw) {
                Ok(Some((zdata, table))) => {
                    block.raw = Vec::new();
                    block.zdata = zdata;
                    block.table = table;
                    block.set_state(State::Ready);
                }
                Ok(None) => {
                    // Empty block: nothing to emit, still mark Ready with no
                    // payload so the writer can skip it.
                    block.set_state(State::Ready);
                }
                Err(e) => {
                    log::error!("worker: block {seq} failed to compress: {e}");
                    ctx.record_fatal(e);
                    block.set_state(State::Error);
                }
            }
            ctx.fifo.reinsert_claimed(block);
        } else if ctx.state() == ProcessState::Pending {
            break;
        } else {
            std::thread::yield_now();
        }
    }
    if ctx.workers_remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
        ctx.set_state(ProcessState::Finished);
    }
}

fn writer_compress<W: Write>(output: &mut W, ctx: &Context) -> Result<(), Error> {
    loop {
        if let Some(block) = ctx.fifo.pop_ready() {
            if block.state == State::Error {
                return Err(Error::MalformedBitstream);
            }
            if block.zdata.nbits > 0 || !block.table.is_empty() {
                frame::write_frame(output, &block.zdata, &block.table)?;
            }
            log::debug!("writer: emitted frame for block {}", block.seq);
        } else if ctx.state() == ProcessState::Finished && ctx.fifo.is_empty() {
            break;
        } else {
            std::thread::yield_now();
        }
    }
    Ok(())
}

/// Expand a framed wire stream from `input`, writing raw bytes to `output`.
pub fn decompress<R: Read + Send, W: Write + Send>(
    input: &mut R,
    output: &mut W,
    config: &Config,
) -> Result<(), Error> {
    let workers = config.resolved_workers();
    let ctx = Context::new(config.fifo_max_len, workers);

    std::thread::scope(|scope| {
        scope.spawn(|| reader_decompress(input, &ctx, config));
        for _ in 0..workers {
            scope.spawn(|| worker_decompress(&ctx));
        }
        let writer_result = writer_decompress(output, &ctx);
        if let Err(e) = writer_result {
            ctx.record_fatal(e);
        }
    });

    match ctx.fatal.lock().unwrap().take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn reader_decompress<R: Read>(input: &mut R, ctx: &Context, config: &Config) {
    let mut seq = 0u64;
    loop {
        match frame::read_frame(input, config.message_max) {
            Ok(Some((zdata, table))) => {
                ctx.fifo.push(Block::from_zdata(seq, zdata, table));
                seq += 1;
            }
            Ok(None) => break,
            Err(e) => {
                log::error!("reader: fatal frame error: {e}");
                ctx.record_fatal(e);
                break;
            }
        }
    }
    ctx.set_state(ProcessState::Pending);
}

fn worker_decompress(ctx: &Context) {
    loop {
        if let Some(mut block) = ctx.fifo.claim_first(State::ZdataReady) {
            let seq = block.seq;
            log::debug!("worker: expanding block {seq}");
            match codec::decompress(&block.zdata, &block.table) {
                Ok(raw) => {
                    block.raw = raw;
                    block.set_state(State::Ready);
                }
                Err(e) => {
                    log::error!("worker: block {seq} failed to expand: {e}");
                    ctx.record_fatal(e);
                    block.set_state(State::Error);
                }
            }
            ctx.fifo.reinsert_claimed(block);
        } else if ctx.state() == ProcessState::Pending {
            break;
        } else {
            std::thread::yield_now();
        }
    }
    if ctx.workers_remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
        ctx.set_state(ProcessState::Finished);
    }
}

fn writer_decompress<W: Write>(output: &mut W, ctx: &Context) -> Result<(), Error> {
    loop {
        if let Some(block) = ctx.fifo.pop_ready() {
            if block.state == State::Error {
                return Err(Error::MalformedBitstream);
            }
            output.write_all(&block.raw).map_err(|_| Error::IoWrite)?;
            log::debug!("writer: emitted {} raw bytes for block {}", block.raw.len(), block.seq);
        } else if ctx.state() == ProcessState::Finished && ctx.fifo.is_empty() {
            break;
        } else {
            std::thread::yield_now();
        }
    }
    Ok(())
}

/// Convenience wrapper for compressing an in-memory buffer.
pub fn compress_slice(data: &[u8], workers: usize) -> Result<Vec<u8>, Error> {
    let mut config = crate::STD_CONFIG;
    config.workers = workers;
    let mut input = std::io::Cursor::new(data);
    let mut output = Vec::new();
    compress(&mut input, &mut output, &config)?;
    Ok(output)
}

/// Convenience wrapper for expanding an in-memory buffer.
pub fn decompress_slice(data: &[u8], workers: usize) -> Result<Vec<u8>, Error> {
    let mut config = crate::STD_CONFIG;
    config.workers = workers;
    let mut input = std::io::Cursor::new(data);
    let mut output = Vec::new();
    decompress(&mut input, &mut output, &config)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_produces_empty_output() {
        let frames = compress_slice(b"", 2).unwrap();
        assert!(frames.is_empty());
        let back = decompress_slice(&frames, 2).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn small_input_roundtrips() {
        let data = b"AABB";
        let frames = compress_slice(data, 2).unwrap();
        let back = decompress_slice(&frames, 2).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn multi_block_input_splits_and_roundtrips() {
        let mut config = crate::STD_CONFIG;
        config.buffer_size = 16;
        config.workers = 3;
        let data: Vec<u8> = (0..100u32).map(|i| (i % 251) as u8).collect();
        let mut input = std::io::Cursor::new(&data);
        let mut compressed = Vec::new();
        compress(&mut input, &mut compressed, &config).unwrap();

        let mut frame_count = 0;
        let mut cur = std::io::Cursor::new(&compressed);
        while frame::read_frame(&mut cur, config.message_max).unwrap().is_some() {
            frame_count += 1;
        }
        let expected_frames = data.len().div_ceil(config.buffer_size);
        assert_eq!(frame_count, expected_frames);

        let mut input2 = std::io::Cursor::new(&compressed);
        let mut back = Vec::new();
        decompress(&mut input2, &mut back, &config).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn single_worker_preserves_order() {
        let data: Vec<u8> = (0..2000u32).map(|i| (i % 256) as u8).collect();
        let frames = compress_slice(&data, 1).unwrap();
        let back = decompress_slice(&frames, 1).unwrap();
        assert_eq!(back, data);
    }
}
