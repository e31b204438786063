//! Binary chain file format.
//!
//! ```text
//! magic "HBLK" | version "1.0" | endianness marker (u8) | block count (u32)
//! then per block: info (56) | data len (u32) | data (len) | hash (32)
//! ```
//!
//! Multi-byte integers are written in the encoder's byte order and the marker
//! records which one that was. Digests and payload bytes are opaque.

use crate::chain::Blockchain;
use crate::constants::{
    BLOCK_DATA_MAX, BLOCK_INFO_SIZE, HASH_SIZE, HBLK_HEADER_SIZE, HBLK_MAGIC, HBLK_VERSION,
};
use crate::error::{Error, Result};
use crate::params::ChainParams;
use crate::{Block, BlockData, BlockInfo, Hash};
use tracing::warn;

/// Byte order of multi-byte integers in a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }

    pub fn marker(self) -> u8 {
        match self {
            Endianness::Little => 1,
            Endianness::Big => 2,
        }
    }

    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            1 => Some(Endianness::Little),
            2 => Some(Endianness::Big),
            _ => None,
        }
    }

    pub fn u32_bytes(self, v: u32) -> [u8; 4] {
        match self {
            Endianness::Little => v.to_le_bytes(),
            Endianness::Big => v.to_be_bytes(),
        }
    }

    pub fn u64_bytes(self, v: u64) -> [u8; 8] {
        match self {
            Endianness::Little => v.to_le_bytes(),
            Endianness::Big => v.to_be_bytes(),
        }
    }

    /// Reads the first four bytes of `bytes`. Panics if fewer are given.
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        let mut arr = [0u8; 4];
        arr.copy_from_slice(&bytes[..4]);
        match self {
            Endianness::Little => u32::from_le_bytes(arr),
            Endianness::Big => u32::from_be_bytes(arr),
        }
    }

    /// Reads the first eight bytes of `bytes`. Panics if fewer are given.
    pub fn read_u64(self, bytes: &[u8]) -> u64 {
        let mut arr = [0u8; 8];
        arr.copy_from_slice(&bytes[..8]);
        match self {
            Endianness::Little => u64::from_le_bytes(arr),
            Endianness::Big => u64::from_be_bytes(arr),
        }
    }
}

/// Serializes `chain` in the host's native byte order.
pub fn encode(chain: &Blockchain) -> Vec<u8> {
    encode_with(chain, Endianness::native())
}

pub fn encode_with(chain: &Blockchain, order: Endianness) -> Vec<u8> {
    let blocks = chain.blocks();
    let body: usize = blocks
        .iter()
        .map(|b| BLOCK_INFO_SIZE + 4 + b.data.as_bytes().len() + HASH_SIZE)
        .sum();
    let mut out = Vec::with_capacity(HBLK_HEADER_SIZE + body);

    out.extend_from_slice(HBLK_MAGIC);
    out.extend_from_slice(HBLK_VERSION);
    out.push(order.marker());
    out.extend_from_slice(&order.u32_bytes(blocks.len() as u32));

    for block in blocks {
        out.extend_from_slice(&block.info.to_bytes(order));
        out.extend_from_slice(&order.u32_bytes(block.data.len()));
        out.extend_from_slice(block.data.as_bytes());
        out.extend_from_slice(&block.hash);
    }
    out
}

pub fn decode(bytes: &[u8]) -> Result<Blockchain> {
    decode_with_params(bytes, ChainParams::default())
}

/// Rebuilds a chain from `bytes`. Stored hashes are kept verbatim; nothing is validated
/// beyond the stream structure.
pub fn decode_with_params(bytes: &[u8], params: ChainParams) -> Result<Blockchain> {
    let mut reader = Reader::new(bytes);

    if reader.take("magic", HBLK_MAGIC.len())? != HBLK_MAGIC {
        return Err(Error::FormatInvalid("bad magic".into()));
    }
    if reader.take("version", HBLK_VERSION.len())? != HBLK_VERSION {
        return Err(Error::FormatInvalid("unsupported version".into()));
    }
    let marker = reader.take("endianness marker", 1)?[0];
    let order = Endianness::from_marker(marker)
        .ok_or_else(|| Error::FormatInvalid(format!("unknown endianness marker {marker}")))?;
    let count = order.read_u32(reader.take("block count", 4)?);
    if count == 0 {
        return Err(Error::FormatInvalid("chain holds no blocks".into()));
    }

    let mut blocks: Vec<Block> = Vec::new();
    blocks.try_reserve((count as usize).min(reader.remaining() / MIN_RECORD_SIZE + 1))?;
    for _ in 0..count {
        blocks.push(read_block(&mut reader, order)?);
    }

    if reader.remaining() > 0 {
        warn!(
            trailing = reader.remaining(),
            "ignoring bytes after the last block"
        );
    }
    Blockchain::from_blocks(blocks, params)
}

const MIN_RECORD_SIZE: usize = BLOCK_INFO_SIZE + 4 + HASH_SIZE;

fn read_block(reader: &mut Reader<'_>, order: Endianness) -> Result<Block> {
    let mut info_bytes = [0u8; BLOCK_INFO_SIZE];
    info_bytes.copy_from_slice(reader.take("block info", BLOCK_INFO_SIZE)?);
    let info = BlockInfo::from_bytes(&info_bytes, order);

    let len = order.read_u32(reader.take("data length", 4)?) as usize;
    if len > BLOCK_DATA_MAX {
        return Err(Error::FormatInvalid(format!(
            "block {} declares {len} data bytes, limit is {BLOCK_DATA_MAX}",
            info.index
        )));
    }
    let payload = reader.take("block data", len)?;
    let mut data = Vec::new();
    data.try_reserve_exact(len)?;
    data.extend_from_slice(payload);

    let mut hash: Hash = [0u8; HASH_SIZE];
    hash.copy_from_slice(reader.take("block hash", HASH_SIZE)?);

    Ok(Block {
        info,
        data: BlockData::new(data)?,
        hash,
    })
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, what: &'static str, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::Truncated {
                what,
                needed: n,
                available: self.remaining(),
            });
        }
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }
}
