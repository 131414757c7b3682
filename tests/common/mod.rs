#![allow(dead_code)]

use std::hash::{BuildHasherDefault, Hash, Hasher};
use std::sync::Once;

use env_logger::Builder;
use log::LevelFilter;

static INIT: Once = Once::new();

pub fn initialize_logger() {
    INIT.call_once_force(|_| {
        let mut builder = Builder::new();

        builder
            .filter_level(LevelFilter::Info)
            .filter_module("chainmap_rs", LevelFilter::Debug)
            .is_test(true)
            .parse_default_env();

        // Another test binary thread may have won the race.
        let _ = builder.try_init();
    });
}

/// Hasher that reports integers unchanged, so tests can place keys in known buckets.
/// Byte input falls back to a 31-multiplier polynomial.
#[derive(Default, Clone)]
pub struct PassThroughHasher {
    value: u64,
}

impl Hasher for PassThroughHasher {
    fn finish(&self) -> u64 {
        self.value
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.value = self.value.wrapping_mul(31).wrapping_add(byte as u64);
        }
    }

    fn write_u32(&mut self, n: u32) {
        self.value = n as u64;
    }

    fn write_u64(&mut self, n: u64) {
        self.value = n;
    }

    fn write_usize(&mut self, n: usize) {
        self.value = n as u64;
    }
}

pub type PassThrough = BuildHasherDefault<PassThroughHasher>;

/// Key whose hash is fixed at construction, independent of its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedHashKey {
    pub id: u32,
    pub hash: u32,
}

impl FixedHashKey {
    pub fn new(id: u32, hash: u32) -> Self {
        Self { id, hash }
    }
}

impl std::fmt::Display for FixedHashKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.id)
    }
}

impl Hash for FixedHashKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash);
    }
}

pub fn dump<K, V, S>(map: &chainmap_rs::ChainMap<K, V, S>) -> Vec<String>
where
    K: std::fmt::Display,
    V: std::fmt::Display,
{
    let mut out = Vec::new();
    map.write_buckets(&mut out).expect("writing to a Vec cannot fail");
    String::from_utf8(out)
        .expect("bucket dump is UTF-8")
        .lines()
        .map(str::to_owned)
        .collect()
}
