//! The unit of work passed through the pipeline: a chunk of raw bytes or
//! compressed bits, together with its processing state.
//!
//! Grounded on `hblock.c`/`hblock.h`'s `hblock_t`/`hblock_state`, expanded
//! with the `RAW_READY`/`ZDATA_READY`/`ERROR` states needed to drive both
//! compression and expansion through the same pipeline machinery.

use crate::htree::CodeEntry;

/// Where a block sits in its processing lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Empty,
    RawReady,
    ZdataReady,
    Processing,
    Ready,
    Error,
}

/// A packed bit buffer: `nbits` meaningful bits stored MSB-first, last byte
/// left-justified.
#[derive(Clone, Debug, Default)]
pub struct BitBuf {
    pub bytes: Vec<u8>,
    pub nbits: u64,
}

/// One block of the stream, carrying either raw bytes (pre-compression /
/// post-expansion) or packed bits plus a code table (post-compression /
/// pre-expansion).
pub struct Block {
    pub state: State,
    pub seq: u64,
    pub raw: Vec<u8>,
    pub zdata: BitBuf,
    pub table: Vec<CodeEntry>,
    /// true only for the marker left in the FIFO's slot while a worker holds
    /// the real block outside the queue; see `Fifo::claim_first`.
    placeholder: bool,
}

impl Block {
    /// A freshly read raw chunk, ready for a worker to compress.
    pub fn from_raw(seq: u64, raw: Vec<u8>) -> Self {
        log::debug!("block {seq}: created RAW_READY with {} bytes", raw.len());
        Block {
            state: State::RawReady,
            seq,
            raw,
            zdata: BitBuf::default(),
            table: Vec::new(),
            placeholder: false,
        }
    }

    /// A freshly parsed frame, ready for a worker to expand.
    pub fn from_zdata(seq: u64, zdata: BitBuf, table: Vec<CodeEntry>) -> Self {
        log::debug!("block {seq}: created ZDATA_READY with {} bits", zdata.nbits);
        Block {
            state: State::ZdataReady,
            seq,
            raw: Vec::new(),
            zdata,
            table,
            placeholder: false,
        }
    }

    /// A marker left in the FIFO's slot while a block is claimed for
    /// processing outside the queue.
    pub fn placeholder(seq: u64) -> Self {
        Block {
            state: State::Processing,
            seq,
            raw: Vec::new(),
            zdata: BitBuf::default(),
            table: Vec::new(),
            placeholder: true,
        }
    }

    pub fn is_placeholder_for(&self, seq: u64) -> bool {
        self.placeholder && self.seq == seq
    }

    pub fn set_state(&mut self, state: State) {
        log::trace!("block {}: {:?} -> {:?}", self.seq, self.state, state);
        self.state = state;
    }
}
