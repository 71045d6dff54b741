//! NVRAM-backed persisted state (spec §6: "SystemUniqueId and
//! MilanCapabilities/Features bitmasks persisted in NVRAM; everything
//! else is runtime state reconstructed from Announce/ADP flows").

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MilanError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NvramRecord {
    pub system_unique_id: u64,
    pub capabilities: u32,
    pub features: u32,
}

impl Default for NvramRecord {
    fn default() -> Self {
        Self {
            system_unique_id: 0,
            capabilities: crate::mvu::BASELINE_INTEROPERABILITY,
            features: crate::mvu::MILAN_BASELINE,
        }
    }
}

/// Storage backend for [`NvramRecord`].
pub trait NvramStore {
    fn load(&self) -> Result<NvramRecord>;
    fn save(&mut self, record: &NvramRecord) -> Result<()>;
}

/// In-memory backend: useful for tests and for entities with no durable
/// storage medium.
#[derive(Debug, Default)]
pub struct MemoryNvramStore {
    record: NvramRecord,
}

impl MemoryNvramStore {
    pub fn new(record: NvramRecord) -> Self {
        Self { record }
    }
}

impl NvramStore for MemoryNvramStore {
    fn load(&self) -> Result<NvramRecord> {
        Ok(self.record)
    }

    fn save(&mut self, record: &NvramRecord) -> Result<()> {
        self.record = *record;
        Ok(())
    }
}

/// JSON-file backend for durable persisted state, serialized with
/// `serde_json`.
#[derive(Debug)]
pub struct JsonFileNvramStore {
    path: PathBuf,
}

impl JsonFileNvramStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl NvramStore for JsonFileNvramStore {
    fn load(&self) -> Result<NvramRecord> {
        if !Path::new(&self.path).exists() {
            return Ok(NvramRecord::default());
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| MilanError::Persistence(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| MilanError::Persistence(e.to_string()))
    }

    fn save(&mut self, record: &NvramRecord) -> Result<()> {
        let contents = serde_json::to_string_pretty(record).map_err(|e| MilanError::Persistence(e.to_string()))?;
        fs::write(&self.path, contents).map_err(|e| MilanError::Persistence(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let mut store = MemoryNvramStore::new(NvramRecord::default());
        let record = NvramRecord {
            system_unique_id: 0xDEAD_BEEF,
            capabilities: 1,
            features: 1,
        };
        store.save(&record).unwrap();
        assert_eq!(store.load().unwrap(), record);
    }

    #[test]
    fn json_file_store_round_trips() {
        let dir = std::env::temp_dir().join(format!("milan-nvram-test-{:?}", std::thread::current().id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("nvram.json");
        let mut store = JsonFileNvramStore::new(&path);
        let record = NvramRecord {
            system_unique_id: 42,
            capabilities: 1,
            features: 1,
        };
        store.save(&record).unwrap();
        let reloaded = JsonFileNvramStore::new(&path).load().unwrap();
        assert_eq!(reloaded, record);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_yields_default() {
        let path = std::env::temp_dir().join("milan-nvram-nonexistent-file.json");
        let _ = fs::remove_file(&path);
        let store = JsonFileNvramStore::new(&path);
        assert_eq!(store.load().unwrap(), NvramRecord::default());
    }
}
