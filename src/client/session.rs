use rand::{
    rngs::{OsRng, StdRng},
    Rng, RngCore, SeedableRng,
};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;
use uuid::{Builder, Uuid};

use crate::client::error::ClientResult;

/// Key the session id lives under in durable storage.
pub const SESSION_STORAGE_KEY: &str = "cart-session-id";

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> ClientResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> ClientResult<()>;
}

/// One file per key inside `dir`.
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => {
                let value = value.trim();
                Ok((!value.is_empty()).then(|| value.to_owned()))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), value)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Hands out the same session id for as long as its storage keeps it.
/// Ids never expire.
pub struct SessionIdProvider<S> {
    storage: S,
}

impl<S: SessionStorage> SessionIdProvider<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn get_or_create_session_id(&self) -> ClientResult<String> {
        if let Some(id) = self.storage.get(SESSION_STORAGE_KEY)? {
            return Ok(id);
        }
        let id = generate_session_id();
        self.storage.set(SESSION_STORAGE_KEY, &id)?;
        Ok(id)
    }
}

/// Random v4 UUID, or a timestamp based id when the OS random source fails.
pub fn generate_session_id() -> String {
    match random_uuid() {
        Some(id) => id.to_string(),
        None => {
            warn!("OS random source unavailable, using fallback session id");
            fallback_session_id(SystemTime::now())
        }
    }
}

fn random_uuid() -> Option<Uuid> {
    let mut bytes = [0u8; 16];
    OsRng.try_fill_bytes(&mut bytes).ok()?;
    Some(Builder::from_random_bytes(bytes).into_uuid())
}

fn fallback_session_id(now: SystemTime) -> String {
    let elapsed = now.duration_since(UNIX_EPOCH).unwrap_or_default();
    //only the low 64 bits of the clock feed the seed
    let nanos = (elapsed.as_nanos() & u128::from(u64::MAX)) as u64;
    let seed = nanos ^ u64::from(std::process::id());
    let mut rng = StdRng::seed_from_u64(seed);
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("session-{}{}", suffix, to_base36(elapsed.as_millis()))
}

fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_owned();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}
