use hblk_core::{pow::mine, Blockchain};
use hblk_storage::FileStore;
use rand::Rng;
use std::fs;
use tempfile::{tempdir, TempDir};

pub fn create_temp_store() -> (TempDir, FileStore) {
    // Create a temporary directory holding the chain file
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("blockchain.hblk");
    (temp_dir, FileStore::open(path))
}

pub fn teardown_store(temp_dir: TempDir, store: FileStore) {
    let dir = temp_dir.path().to_path_buf();
    drop(store);
    temp_dir.close().expect("Failed to delete temp dir");
    let _ = fs::remove_dir_all(&dir);
    // Verify the directory is removed
    assert!(!dir.exists(), "Store directory should be removed");
}

/// Genesis plus `n` mined blocks with random payloads.
pub fn random_chain(n: usize) -> Blockchain {
    let mut rng = rand::thread_rng();
    let mut chain = Blockchain::new();
    for _ in 0..n {
        let len = rng.gen_range(0..1500);
        let payload: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let mut block = chain.candidate(&payload).expect("candidate");
        mine(&mut block);
        chain.append(block).expect("append mined block");
    }
    chain
}
