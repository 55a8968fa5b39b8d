//! # huffstream
//!
//! A streaming, block-parallel Huffman compressor/expander.
//!
//! The input byte stream is split into fixed-size blocks. Each block gets its
//! own canonical Huffman tree, built from a histogram of that block alone, and
//! is packed into a self-describing frame carrying its code table. A small
//! pipeline of reader/worker/writer threads processes blocks concurrently
//! while preserving the original block order on output.
//!
//! ## Buffer example
//!
//! ```rs
//! use huffstream::pipeline;
//! let data = b"the quick brown fox jumps over the lazy dog";
//! let frames = pipeline::compress_slice(data, 2).expect("compression failed");
//! let back = pipeline::decompress_slice(&frames, 2).expect("expansion failed");
//! assert_eq!(&back[..], &data[..]);
//! ```

pub mod pqueue;
pub mod htree;
pub mod block;
pub mod codec;
pub mod frame;
pub mod fifo;
pub mod pipeline;

/// Boxed dynamic error, used at the CLI boundary the same way the teacher
/// crate's `DYNERR` alias is used.
pub type DynErr = Box<dyn std::error::Error>;

/// Errors produced anywhere in the compress/expand pipeline.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("error reading input stream")]
    IoRead,
    #[error("error writing output stream")]
    IoWrite,
    #[error("frame length prefix exceeds the maximum message size")]
    FileTooLarge,
    #[error("frame could not be parsed")]
    MalformedFrame,
    #[error("compressed bitstream did not resolve to a valid code")]
    MalformedBitstream,
    #[error("huffman code exceeded the maximum supported length")]
    CodeTooLong,
    #[error("invalid command line usage")]
    Usage,
}

/// Tunable knobs for the pipeline, analogous to the teacher's `Options`.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// size of a raw (uncompressed) block read by the compressor, in bytes
    pub buffer_size: usize,
    /// maximum size of one serialized frame the decompressor will accept
    pub message_max: usize,
    /// maximum depth of the bounded FIFO shared between pipeline threads
    pub fifo_max_len: usize,
    /// number of worker threads (reader and writer are separate, additional threads)
    pub workers: usize,
}

/// 512 KiB, matching the original implementation's `BUFFERSIZE`.
pub const BUFFERSIZE: usize = 512 * 1024;

/// Ceiling on one parsed frame; the source uses `2 * BUFFERSIZE`.
pub const HPB_MESSAGE_MAX: usize = 2 * BUFFERSIZE;

/// Matches `FIFO_QUEUE_MAX_LEN` in the original `fqueue.h`.
pub const FIFO_QUEUE_MAX_LEN: usize = 20;

pub const STD_CONFIG: Config = Config {
    buffer_size: BUFFERSIZE,
    message_max: HPB_MESSAGE_MAX,
    fifo_max_len: FIFO_QUEUE_MAX_LEN,
    workers: 0, // 0 means "derive from available_parallelism at runtime"
};

impl Config {
    /// Resolve `workers == 0` into a concrete worker count.
    pub fn resolved_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get().saturating_sub(2).max(1))
            .unwrap_or(1)
    }
}
