use crate::constants::{BLOCK_GENERATION_INTERVAL, DIFFICULTY_ADJUSTMENT_INTERVAL};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Difficulty retarget parameters of a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainParams {
    /// Number of blocks between two difficulty adjustments.
    pub retarget_interval: u32,
    /// Expected seconds between two blocks.
    pub block_interval: u64,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            retarget_interval: DIFFICULTY_ADJUSTMENT_INTERVAL,
            block_interval: BLOCK_GENERATION_INTERVAL,
        }
    }
}

impl ChainParams {
    pub fn new(retarget_interval: u32, block_interval: u64) -> Result<Self> {
        Self {
            retarget_interval,
            block_interval,
        }
        .validated()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str::<Self>(json)?.validated()
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidArgument(format!("cannot read params {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Expected duration of one full retarget window.
    pub fn expected_window_secs(&self) -> u64 {
        self.block_interval
            .saturating_mul(u64::from(self.retarget_interval))
    }

    fn validated(self) -> Result<Self> {
        if self.retarget_interval == 0 {
            return Err(Error::InvalidArgument(
                "retarget_interval must be at least 1".into(),
            ));
        }
        Ok(self)
    }
}
