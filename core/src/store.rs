use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::job::JobSpec;

/// Filesystem-backed key/value store used as the default KV engine.
#[derive(Clone)]
pub struct FsKv {
    root: PathBuf,
}

/// Minimal key/value interface over byte keys and values.
pub trait Kv: Clone + Send + Sync + 'static {
    /// Get value bytes for `key`, if present.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
    /// Set value bytes for `key`, overwriting if it exists.
    fn put(&self, key: &[u8], val: &[u8]) -> Result<()>;
    /// Delete `key`; returns `true` if a value existed.
    fn delete(&self, key: &[u8]) -> bool;
}

/// Serde helpers layered on top of any [`Kv`] implementation.
///
/// Values are JSON so optional and tri-state fields keep their shape.
pub trait KvSerde: Kv {
    /// Deserialize type `T` stored at `key`.
    fn get_t<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        match self.get(key) {
            Some(bytes) => {
                let v = serde_json::from_slice::<T>(&bytes)
                    .with_context(|| format!("decode {}", String::from_utf8_lossy(key)))?;
                Ok(Some(v))
            }
            None => Ok(None),
        }
    }
    /// Serialize `val` and store at `key`.
    fn put_t<T: Serialize>(&self, key: &[u8], val: &T) -> Result<()> {
        let buf = serde_json::to_vec(val)
            .with_context(|| format!("encode {}", String::from_utf8_lossy(key)))?;
        self.put(key, &buf)
    }
}
impl<T: Kv> KvSerde for T {}

/// Default KV type exported by this crate (FS-backed).
pub type DefaultKv = FsKv;

/// Open an FS-backed KV rooted at `dir` (created if missing).
pub fn open_default<P: AsRef<Path>>(dir: P) -> Result<DefaultKv> {
    let root = dir.as_ref().to_path_buf();
    fs::create_dir_all(&root)
        .with_context(|| format!("create kv dir {}", root.display()))?;
    Ok(FsKv { root })
}

/// Build a namespaced key as bytes: `"{ns}:{key}"`.
pub fn ns(ns: &str, key: &str) -> Vec<u8> {
    let mut s = String::with_capacity(ns.len() + 1 + key.len());
    s.push_str(ns);
    s.push(':');
    s.push_str(key);
    s.into_bytes()
}

/// What was last observed for a job this tool manages.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct JobRecord {
    /// Remote id adopted after create/update.
    pub id: String,
    /// Configuration rebuilt from the last read.
    pub observed: JobSpec,
    /// When `observed` was read.
    pub synced_at: DateTime<Utc>,
}

fn record_key(address: &str) -> Vec<u8> {
    ns("jobs", address)
}

/// Load the record stored for `address` (see [`JobSpec::address`]).
pub fn load_record<K: Kv>(kv: &K, address: &str) -> Result<Option<JobRecord>> {
    kv.get_t(&record_key(address))
}

/// Store `record` under `address`.
pub fn save_record<K: Kv>(kv: &K, address: &str, record: &JobRecord) -> Result<()> {
    kv.put_t(&record_key(address), record)
}

/// Drop the record for `address`; returns `true` if one existed.
pub fn forget_record<K: Kv>(kv: &K, address: &str) -> bool {
    kv.delete(&record_key(address))
}

/* --------------------- impl FsKv --------------------- */

impl FsKv {
    fn path_for(&self, key: &[u8]) -> PathBuf {
        // Windows-safe: map arbitrary bytes to a hex file name.
        let mut name = String::with_capacity(key.len() * 2);
        for &b in key {
            name.push(hex_digit(b >> 4));
            name.push(hex_digit(b & 0xF));
        }
        self.root.join(name)
    }
}

fn hex_digit(n: u8) -> char {
    match n {
        0..=9 => (b'0' + n) as char,
        10..=15 => (b'a' + (n - 10)) as char,
        _ => '?',
    }
}

impl Kv for FsKv {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let path = self.path_for(key);
        let mut f = fs::File::open(&path).ok()?;
        let mut buf = Vec::new();
        f.read_to_end(&mut buf).ok()?;
        Some(buf)
    }

    fn put(&self, key: &[u8], val: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        // temp then rename so readers never see a torn file
        let tmp = path.with_extension("tmp");
        let mut f = fs::File::create(&tmp)
            .with_context(|| format!("create {}", tmp.display()))?;
        f.write_all(val)?;
        f.sync_all()?;
        fs::rename(&tmp, &path).with_context(|| format!("rename to {}", path.display()))?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> bool {
        fs::remove_file(self.path_for(key)).is_ok()
    }
}
