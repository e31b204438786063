use crate::error::ValidationError;
use crate::pow::count_leading_zero_bits;
use crate::{genesis_block, Block};

/// Checks `block` against its predecessor: index, linkage, hash, then proof of work.
/// Without a predecessor the block must be the genesis block.
pub fn validate_block(block: &Block, prev: Option<&Block>) -> Result<(), ValidationError> {
    let Some(prev) = prev else {
        return if *block == genesis_block() {
            Ok(())
        } else {
            Err(ValidationError::GenesisMismatch)
        };
    };

    let index = block.info.index;
    let expected = prev.info.index.wrapping_add(1);
    if index != expected {
        return Err(ValidationError::IndexMismatch {
            expected,
            found: index,
        });
    }
    if block.info.prev_hash != prev.hash {
        return Err(ValidationError::LinkageBroken { index });
    }
    if block.compute_hash() != block.hash {
        return Err(ValidationError::HashMismatch { index });
    }
    let actual = count_leading_zero_bits(&block.hash);
    if actual < block.info.difficulty {
        return Err(ValidationError::DifficultyNotMet {
            index,
            required: block.info.difficulty,
            actual,
        });
    }
    Ok(())
}

pub fn is_valid(block: &Block, prev: Option<&Block>) -> bool {
    validate_block(block, prev).is_ok()
}

/// Validates the genesis block and then every adjacent pair, stopping at the first failure.
pub fn verify_chain(blocks: &[Block]) -> Result<(), ValidationError> {
    let Some(first) = blocks.first() else {
        return Err(ValidationError::GenesisMismatch);
    };
    validate_block(first, None)?;
    for pair in blocks.windows(2) {
        validate_block(&pair[1], Some(&pair[0]))?;
    }
    Ok(())
}
