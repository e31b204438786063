use crate::error::{Error, Result};
use crate::pow::hash_matches_difficulty;
use crate::{block_hash, Block};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Mines a block by searching nonces in parallel until its hash has at least
/// `block.info.difficulty` leading zero bits. On success the block carries the winning
/// nonce and its hash, and the nonce is returned. Fails with [`Error::Cancelled`] once
/// `cancel` is raised.
pub fn mine_parallel(block: &mut Block, cancel: &AtomicBool) -> Result<u64> {
    // Only the nonce varies per attempt.
    let template = block.info;
    let data = &block.data;
    let start = template.nonce.wrapping_add(1);

    // Rayon splits the nonce range across threads; `None` inside marks a cancelled search.
    let found = (0u64..u64::MAX).into_par_iter().find_map_any(|offset| {
        if cancel.load(Ordering::Relaxed) {
            return Some(None);
        }
        let mut info = template;
        info.nonce = start.wrapping_add(offset);
        let hash = block_hash(&info, data);
        hash_matches_difficulty(&hash, info.difficulty).then_some(Some((info.nonce, hash)))
    });

    let Some(Some((nonce, hash))) = found else {
        return Err(Error::Cancelled);
    };
    block.info.nonce = nonce;
    block.hash = hash;

    info!(
        "Mined block {} with nonce {} and hash {}",
        block.info.index,
        nonce,
        block.hash_hex()
    );
    Ok(nonce)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis_block;
    use crate::pow::count_leading_zero_bits;
    use crate::validate::validate_block;

    fn candidate(difficulty: u32) -> Block {
        let mut block = Block::create(Some(&genesis_block()), b"parallel").unwrap();
        block.info.difficulty = difficulty;
        block
    }

    #[test]
    fn mine_parallel_example() {
        let mut block = candidate(12);
        let cancel = AtomicBool::new(false);
        let nonce = mine_parallel(&mut block, &cancel).unwrap();
        assert_eq!(block.info.nonce, nonce);
        assert!(count_leading_zero_bits(&block.hash) >= 12);
        assert_eq!(validate_block(&block, Some(&genesis_block())), Ok(()));
    }

    #[test]
    fn mine_parallel_difficulty_zero() {
        let mut block = candidate(0);
        let cancel = AtomicBool::new(false);
        mine_parallel(&mut block, &cancel).unwrap();
        assert_eq!(block.hash, block.compute_hash());
    }

    #[test]
    fn mine_parallel_cancelled() {
        let mut block = candidate(250);
        let before = block.clone();
        let cancel = AtomicBool::new(true);
        assert!(matches!(
            mine_parallel(&mut block, &cancel),
            Err(Error::Cancelled)
        ));
        assert_eq!(block, before);
    }
}
