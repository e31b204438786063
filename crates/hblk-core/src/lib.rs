pub mod chain;
pub mod codec;
pub mod constants;
pub mod difficulty;
pub mod error;
pub mod mine;
pub mod params;
pub mod validate;

use constants::{BLOCK_DATA_MAX, BLOCK_INFO_SIZE, GENESIS_DATA, GENESIS_HASH, GENESIS_TIMESTAMP};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub use chain::{Blockchain, ChainStore};
pub use codec::Endianness;
pub use error::{Error, Result, ValidationError};
pub use params::ChainParams;

pub type Hash = [u8; 32];

/// Fixed-width block metadata. Its 56-byte layout is hashed verbatim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    pub index: u32,
    pub difficulty: u32,
    pub timestamp: u64,
    pub nonce: u64,
    pub prev_hash: Hash,
}

impl BlockInfo {
    /// Lays the fields out in declaration order, multi-byte fields in `order`.
    pub fn to_bytes(&self, order: Endianness) -> [u8; BLOCK_INFO_SIZE] {
        let mut bytes = [0u8; BLOCK_INFO_SIZE];
        bytes[0..4].copy_from_slice(&order.u32_bytes(self.index));
        bytes[4..8].copy_from_slice(&order.u32_bytes(self.difficulty));
        bytes[8..16].copy_from_slice(&order.u64_bytes(self.timestamp));
        bytes[16..24].copy_from_slice(&order.u64_bytes(self.nonce));
        bytes[24..56].copy_from_slice(&self.prev_hash);
        bytes
    }

    pub fn from_bytes(bytes: &[u8; BLOCK_INFO_SIZE], order: Endianness) -> Self {
        let mut prev_hash = [0u8; 32];
        prev_hash.copy_from_slice(&bytes[24..56]);
        Self {
            index: order.read_u32(&bytes[0..4]),
            difficulty: order.read_u32(&bytes[4..8]),
            timestamp: order.read_u64(&bytes[8..16]),
            nonce: order.read_u64(&bytes[16..24]),
            prev_hash,
        }
    }
}

/// Block payload, at most `BLOCK_DATA_MAX` bytes. Only these bytes are hashed and stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockData {
    bytes: Vec<u8>,
}

impl BlockData {
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() > BLOCK_DATA_MAX {
            return Err(Error::InvalidArgument(format!(
                "block data is {} bytes, limit is {BLOCK_DATA_MAX}",
                bytes.len()
            )));
        }
        Ok(Self { bytes })
    }

    /// Copies at most `BLOCK_DATA_MAX - 1` bytes of `payload` and appends a NUL.
    /// The declared length counts the terminator.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        let copied = payload.len().min(BLOCK_DATA_MAX - 1);
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(copied + 1)?;
        bytes.extend_from_slice(&payload[..copied]);
        bytes.push(0);
        Ok(Self { bytes })
    }

    pub fn len(&self) -> u32 {
        self.bytes.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload with a trailing NUL terminator stripped.
    pub fn payload(&self) -> &[u8] {
        self.bytes.strip_suffix(&[0]).unwrap_or(&self.bytes[..])
    }

    #[cfg(test)]
    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub info: BlockInfo,
    pub data: BlockData,
    pub hash: Hash,
}

impl Block {
    /// Builds an unmined block on top of `prev`, or a first block when `prev` is `None`.
    /// Difficulty and nonce start at zero and the hash is left zeroed.
    pub fn create(prev: Option<&Block>, payload: &[u8]) -> Result<Self> {
        let (index, prev_hash) = match prev {
            Some(p) => (p.info.index.wrapping_add(1), p.hash),
            None => (0, [0u8; 32]),
        };
        Ok(Self {
            info: BlockInfo {
                index,
                difficulty: 0,
                timestamp: now_secs(),
                nonce: 0,
                prev_hash,
            },
            data: BlockData::from_payload(payload)?,
            hash: [0u8; 32],
        })
    }

    pub fn compute_hash(&self) -> Hash {
        block_hash(&self.info, &self.data)
    }

    /// Recomputes and stores the cached hash.
    pub fn seal(&mut self) {
        self.hash = self.compute_hash();
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} difficulty={} timestamp={} nonce={} hash={} prev={} data={:?}",
            self.info.index,
            self.info.difficulty,
            self.info.timestamp,
            self.info.nonce,
            self.hash_hex(),
            hex::encode(self.info.prev_hash),
            String::from_utf8_lossy(self.data.payload()),
        )
    }
}

/// SHA-256 over the little-endian info layout followed by the data bytes.
pub fn block_hash(info: &BlockInfo, data: &BlockData) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(info.to_bytes(Endianness::Little));
    hasher.update(data.as_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

/// The hard-coded first block of every chain.
pub fn genesis_block() -> Block {
    Block {
        info: BlockInfo {
            index: 0,
            difficulty: 0,
            timestamp: GENESIS_TIMESTAMP,
            nonce: 0,
            prev_hash: [0u8; 32],
        },
        data: BlockData {
            bytes: GENESIS_DATA.to_vec(),
        },
        hash: GENESIS_HASH,
    }
}

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

pub mod pow {
    use super::{now_secs, Block, Hash};
    use crate::constants::{BYTE, CANCEL_POLL_INTERVAL};
    use crate::error::{Error, Result};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tracing::debug;

    pub fn count_leading_zero_bits(hash: &Hash) -> u32 {
        let mut total = 0u32;
        for b in hash {
            if *b == 0 {
                total += BYTE;
            } else {
                total += b.leading_zeros();
                break;
            }
        }
        total
    }

    pub fn hash_matches_difficulty(hash: &Hash, difficulty: u32) -> bool {
        count_leading_zero_bits(hash) >= difficulty
    }

    /// Mine the block by incrementing its nonce until the number of leading zero bits
    /// in the block hash >= `block.info.difficulty`. Returns the number of hashes computed.
    pub fn mine(block: &mut Block) -> u64 {
        let start = block.info.nonce;
        let mut attempts = 0u64;
        loop {
            attempts += 1;
            if try_next_nonce(block, start) {
                debug!(
                    index = block.info.index,
                    nonce = block.info.nonce,
                    attempts,
                    "block mined"
                );
                return attempts;
            }
        }
    }

    /// Same as [`mine`], but gives up with [`Error::Cancelled`] once `cancel` is raised.
    /// The flag is polled every `CANCEL_POLL_INTERVAL` attempts.
    pub fn mine_until(block: &mut Block, cancel: &AtomicBool) -> Result<u64> {
        let start = block.info.nonce;
        let mut attempts = 0u64;
        loop {
            if attempts % CANCEL_POLL_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
                debug!(index = block.info.index, attempts, "mining cancelled");
                return Err(Error::Cancelled);
            }
            attempts += 1;
            if try_next_nonce(block, start) {
                debug!(
                    index = block.info.index,
                    nonce = block.info.nonce,
                    attempts,
                    "block mined"
                );
                return Ok(attempts);
            }
        }
    }

    fn try_next_nonce(block: &mut Block, start: u64) -> bool {
        block.info.nonce = block.info.nonce.wrapping_add(1);
        if block.info.nonce == start {
            // nonce space exhausted for this timestamp
            block.info.timestamp = block.info.timestamp.wrapping_add(1).max(now_secs());
        }
        block.seal();
        hash_matches_difficulty(&block.hash, block.info.difficulty)
    }
}
