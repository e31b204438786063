pub const BYTE: u32 = 8;
pub const HASH_SIZE: usize = 32;

/// Serialized size of a `BlockInfo`: two u32, two u64 and a digest, no padding.
pub const BLOCK_INFO_SIZE: usize = 4 + 4 + 8 + 8 + HASH_SIZE;
pub const BLOCK_DATA_MAX: usize = 1024;

pub const GENESIS_TIMESTAMP: u64 = 1_537_578_000;
pub const GENESIS_DATA: &[u8; 16] = b"Holberton School";
pub const GENESIS_HASH: [u8; HASH_SIZE] = [
    0xc5, 0x2c, 0x26, 0xc8, 0xb5, 0x46, 0x16, 0x39, 0x63, 0x5d, 0x8e, 0xdf, 0x2a, 0x97, 0xd4, 0x8d,
    0x0c, 0x8e, 0x00, 0x09, 0xc8, 0x17, 0xf2, 0xb1, 0xd3, 0xd7, 0xff, 0x2f, 0x04, 0x51, 0x58, 0x03,
];

pub const DIFFICULTY_ADJUSTMENT_INTERVAL: u32 = 5;
pub const BLOCK_GENERATION_INTERVAL: u64 = 1;

pub const HBLK_MAGIC: &[u8; 4] = b"HBLK";
pub const HBLK_VERSION: &[u8; 3] = b"1.0";
/// Header: magic, version, endianness marker, block count.
pub const HBLK_HEADER_SIZE: usize = 4 + 3 + 1 + 4;

/// How many nonces the miner tries between checks of its cancel flag.
pub const CANCEL_POLL_INTERVAL: u64 = 1024;
