pub mod file_store;

use anyhow::{Context, Result};
use hblk_core::{Blockchain, ChainParams, ChainStore};
use tracing::info;

pub use file_store::FileStore;

/// Loads the stored chain, or saves and returns a fresh genesis-only chain. Idempotent.
/// The returned chain retargets with `params`.
///
/// A stored chain is verified block by block before it is returned, so callers can
/// extend it; a chain that fails validation is an error.
pub fn load_or_init<S: ChainStore>(store: &S, params: ChainParams) -> Result<Blockchain> {
    if let Some(mut chain) = store.load()? {
        chain.set_params(params);
        chain.verify().context("stored chain failed validation")?;
        return Ok(chain);
    }
    let chain = Blockchain::with_params(params);
    store.save(&chain)?;
    info!("initialised chain with genesis block");
    Ok(chain)
}
