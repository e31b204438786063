use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hblk_core::{mine::mine_parallel, pow::mine_until, Block, Blockchain, ChainParams, ChainStore};
use hblk_storage::{load_or_init, FileStore};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "hblk")]
#[command(about = "Create, extend and verify a proof-of-work chain file")]
struct Cli {
    /// Chain file
    #[arg(long, global = true, default_value = "blockchain.hblk")]
    file: PathBuf,

    /// JSON file with retarget parameters (retarget_interval, block_interval)
    #[arg(long, global = true)]
    params: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a chain holding only the genesis block
    Init {
        /// Overwrite an existing chain file
        #[arg(long)]
        force: bool,
    },
    /// Mine a block carrying DATA and append it
    Add {
        data: String,
        /// Search nonces on all cores
        #[arg(long)]
        parallel: bool,
        /// Give up mining after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// List the blocks of the chain
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Validate every block of the chain
    Verify,
    /// Print the difficulty the next block must meet
    Difficulty,
}

#[derive(Serialize)]
struct BlockView {
    index: u32,
    difficulty: u32,
    timestamp: u64,
    nonce: u64,
    prev_hash: String,
    hash: String,
    data_len: u32,
    data: String,
}

impl From<&Block> for BlockView {
    fn from(block: &Block) -> Self {
        Self {
            index: block.info.index,
            difficulty: block.info.difficulty,
            timestamp: block.info.timestamp,
            nonce: block.info.nonce,
            prev_hash: hex::encode(block.info.prev_hash),
            hash: block.hash_hex(),
            data_len: block.data.len(),
            data: String::from_utf8_lossy(block.data.payload()).into_owned(),
        }
    }
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let params = match &cli.params {
        Some(path) => ChainParams::from_json_file(path)?,
        None => ChainParams::default(),
    };
    let store = FileStore::open(&cli.file);

    match cli.cmd {
        Command::Init { force } => {
            if store.exists() && !force {
                bail!(
                    "{} already exists, pass --force to overwrite",
                    store.path().display()
                );
            }
            store.save(&Blockchain::with_params(params))?;
            println!("initialised {}", store.path().display());
        }
        Command::Add {
            data,
            parallel,
            timeout_secs,
        } => {
            let mut chain = load_or_init(&store, params)?;
            let mut block = chain.candidate(data.as_bytes())?;
            info!(
                index = block.info.index,
                difficulty = block.info.difficulty,
                "mining block"
            );

            let cancel = Arc::new(AtomicBool::new(false));
            if let Some(secs) = timeout_secs {
                let cancel = cancel.clone();
                thread::spawn(move || {
                    thread::sleep(Duration::from_secs(secs));
                    cancel.store(true, Ordering::Relaxed);
                });
            }
            let mined = if parallel {
                mine_parallel(&mut block, &cancel).map(|_| ())
            } else {
                mine_until(&mut block, &cancel).map(|_| ())
            };
            if let Err(e) = mined {
                warn!("block {} not mined: {e}", block.info.index);
                return Err(e.into());
            }

            chain.append(block.clone())?;
            store.save(&chain)?;
            println!("{block}");
        }
        Command::Show { json } => {
            let chain = load(&store, params)?;
            if json {
                let views: Vec<BlockView> = chain.blocks().iter().map(BlockView::from).collect();
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else {
                for block in chain.blocks() {
                    println!("{block}");
                }
            }
        }
        Command::Verify => {
            let chain = load(&store, params)?;
            match chain.verify() {
                Ok(()) => println!("chain valid: {} blocks", chain.len()),
                Err(e) => bail!("chain invalid: {e}"),
            }
        }
        Command::Difficulty => {
            let chain = load(&store, params)?;
            println!("{}", chain.next_difficulty());
        }
    }
    Ok(())
}

fn load(store: &FileStore, params: ChainParams) -> Result<Blockchain> {
    let mut chain = store
        .load()?
        .with_context(|| format!("no chain at {}", store.path().display()))?;
    chain.set_params(params);
    Ok(chain)
}
