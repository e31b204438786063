use crate::difficulty::next_difficulty;
use crate::error::{Error, Result, ValidationError};
use crate::params::ChainParams;
use crate::validate::{validate_block, verify_chain};
use crate::{genesis_block, Block};

/// Trait the storage backends implement to persist a chain.
/// This lives in `hblk-core` to avoid a circular dependency.
pub trait ChainStore: Send + Sync {
    /// `None` when nothing has been saved yet.
    fn load(&self) -> anyhow::Result<Option<Blockchain>>;
    fn save(&self, chain: &Blockchain) -> anyhow::Result<()>;
}

/// Append-only sequence of blocks. Never empty: position 0 holds the first block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blockchain {
    blocks: Vec<Block>,
    params: ChainParams,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    /// A chain holding only the genesis block.
    pub fn new() -> Self {
        Self::with_params(ChainParams::default())
    }

    pub fn with_params(params: ChainParams) -> Self {
        Self {
            blocks: vec![genesis_block()],
            params,
        }
    }

    /// Wraps already-built blocks without validating them; see [`Blockchain::verify`].
    pub fn from_blocks(blocks: Vec<Block>, params: ChainParams) -> Result<Self> {
        if blocks.is_empty() {
            return Err(Error::InvalidArgument("a chain needs at least one block".into()));
        }
        Ok(Self { blocks, params })
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn set_params(&mut self, params: ChainParams) {
        self.params = params;
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True when the chain holds no blocks, which a constructed chain never does.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<&Block> {
        self.blocks.get(index as usize)
    }

    pub fn tip(&self) -> &Block {
        // never empty
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn next_difficulty(&self) -> u32 {
        next_difficulty(&self.blocks, &self.params)
    }

    /// Unmined block on top of the tip carrying the difficulty it must meet.
    pub fn candidate(&self, payload: &[u8]) -> Result<Block> {
        let mut block = Block::create(Some(self.tip()), payload)?;
        block.info.difficulty = self.next_difficulty();
        Ok(block)
    }

    /// Validates `block` against the tip and appends it. The chain is untouched on error.
    pub fn append(&mut self, block: Block) -> Result<(), ValidationError> {
        validate_block(&block, Some(self.tip()))?;
        self.blocks.push(block);
        Ok(())
    }

    pub fn verify(&self) -> Result<(), ValidationError> {
        verify_chain(&self.blocks)
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }
}
