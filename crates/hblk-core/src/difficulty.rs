use crate::params::ChainParams;
use crate::Block;

/// Difficulty to assign to the block that would follow `blocks`.
///
/// Every `retarget_interval` blocks the time taken by the last window is compared with
/// the expected `block_interval * retarget_interval`: under half of it raises the
/// difficulty by one, over twice lowers it by one. Otherwise the tip's difficulty carries over.
pub fn next_difficulty(blocks: &[Block], params: &ChainParams) -> u32 {
    let Some(last) = blocks.last() else {
        return 0;
    };
    let interval = params.retarget_interval.max(1);
    let at_boundary = (u64::from(last.info.index) + 1) % u64::from(interval) == 0;
    if !at_boundary || last.info.index == 0 {
        return last.info.difficulty;
    }

    // First block of the window ending at `last`.
    let Some(anchor) = blocks
        .len()
        .checked_sub(interval as usize)
        .and_then(|i| blocks.get(i))
    else {
        return last.info.difficulty;
    };

    let expected = params.expected_window_secs();
    let actual = last.info.timestamp.saturating_sub(anchor.info.timestamp);
    if actual < expected / 2 {
        last.info.difficulty.saturating_add(1)
    } else if actual > expected.saturating_mul(2) {
        last.info.difficulty.saturating_sub(1)
    } else {
        last.info.difficulty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{genesis_block, BlockData, BlockInfo};

    /// Genesis followed by blocks 1..=n, block i stamped at `genesis + i * step`.
    fn timed_chain(n: u32, step: u64, difficulty: u32) -> Vec<Block> {
        let mut blocks = vec![genesis_block()];
        for i in 1..=n {
            let (timestamp, prev_hash) = {
                let prev = blocks.last().unwrap();
                (prev.info.timestamp + step, prev.hash)
            };
            blocks.push(Block {
                info: BlockInfo {
                    index: i,
                    difficulty,
                    timestamp,
                    nonce: 0,
                    prev_hash,
                },
                data: BlockData::default(),
                hash: [0u8; 32],
            });
        }
        blocks
    }

    fn params(retarget_interval: u32, block_interval: u64) -> ChainParams {
        ChainParams::new(retarget_interval, block_interval).unwrap()
    }

    #[test]
    fn empty_chain_is_zero() {
        assert_eq!(next_difficulty(&[], &ChainParams::default()), 0);
    }

    #[test]
    fn genesis_only_keeps_zero() {
        assert_eq!(
            next_difficulty(&[genesis_block()], &ChainParams::default()),
            0
        );
    }

    #[test]
    fn fast_window_raises_difficulty() {
        // tip index 4 closes the first window of 5; 4 * 10s < 100s / 2
        let blocks = timed_chain(4, 10, 3);
        assert_eq!(next_difficulty(&blocks, &params(5, 20)), 4);
    }

    #[test]
    fn slow_window_lowers_difficulty() {
        let blocks = timed_chain(4, 100, 3);
        assert_eq!(next_difficulty(&blocks, &params(5, 20)), 2);
    }

    #[test]
    fn on_target_window_keeps_difficulty() {
        let blocks = timed_chain(4, 25, 3);
        assert_eq!(next_difficulty(&blocks, &params(5, 20)), 3);
    }

    #[test]
    fn off_boundary_keeps_difficulty() {
        let blocks = timed_chain(5, 0, 7);
        assert_eq!(next_difficulty(&blocks, &params(5, 20)), 7);
        let blocks = timed_chain(3, 1000, 7);
        assert_eq!(next_difficulty(&blocks, &params(5, 20)), 7);
    }

    #[test]
    fn never_drops_below_zero() {
        let blocks = timed_chain(4, 10_000, 0);
        assert_eq!(next_difficulty(&blocks, &params(5, 1)), 0);
    }

    #[test]
    fn second_window_uses_its_own_anchor() {
        // window 5..=9: fast, even though 0..=4 was slow
        let mut blocks = timed_chain(4, 100, 2);
        for i in 5..=9u32 {
            let prev = blocks.last().unwrap().clone();
            let mut b = prev.clone();
            b.info.index = i;
            b.info.timestamp = prev.info.timestamp + 1;
            blocks.push(b);
        }
        assert_eq!(next_difficulty(&blocks, &params(5, 20)), 3);
    }

    #[test]
    fn backwards_timestamps_count_as_fast() {
        let mut blocks = timed_chain(4, 10, 1);
        blocks[4].info.timestamp = 0;
        assert_eq!(next_difficulty(&blocks, &params(5, 20)), 2);
    }

    #[test]
    fn interval_of_one_retargets_every_block() {
        let blocks = timed_chain(1, 0, 0);
        assert_eq!(next_difficulty(&blocks, &params(1, 10)), 1);
    }
}
