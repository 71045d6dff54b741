//! The Milan entity: the profile-level state the integration bridge
//! drives (spec §4.10, §4.11).

use std::time::Duration;

use milan::{
    JsonFileNvramStore, MediaClockReferenceStore, MilanInfo, NvramRecord, NvramStore,
    RedundancyManager, Result as MilanResult,
};

/// Owns the Milan-profile state: persisted identity/capabilities, the
/// media-clock-reference table, and redundant stream pairs. Held by
/// [`crate::bridge::EndpointBridge`] and driven once per tick.
pub struct MilanEntity {
    info: MilanInfo,
    store: Box<dyn NvramStore + Send>,
    media_clock: MediaClockReferenceStore,
    redundancy: RedundancyManager,
}

impl MilanEntity {
    pub fn new(info: MilanInfo, store: Box<dyn NvramStore + Send>) -> Self {
        Self {
            info,
            store,
            media_clock: MediaClockReferenceStore::new(),
            redundancy: RedundancyManager::new(),
        }
    }

    pub fn with_json_persistence(info: MilanInfo, path: impl Into<std::path::PathBuf>) -> Self {
        Self::new(info, Box::new(JsonFileNvramStore::new(path)))
    }

    pub fn get_milan_info(&self) -> &MilanInfo {
        &self.info
    }

    pub fn is_compliant(&self) -> bool {
        self.info.is_milan_compliant()
    }

    pub fn media_clock_mut(&mut self) -> &mut MediaClockReferenceStore {
        &mut self.media_clock
    }

    pub fn redundancy_mut(&mut self) -> &mut RedundancyManager {
        &mut self.redundancy
    }

    pub fn load_persisted(&mut self) -> MilanResult<()> {
        let record = self.store.load()?;
        self.info.capabilities = record.capabilities;
        self.info.features = record.features;
        Ok(())
    }

    pub fn persist(&mut self, system_unique_id: u64) -> MilanResult<()> {
        self.store.save(&NvramRecord {
            system_unique_id,
            capabilities: self.info.capabilities,
            features: self.info.features,
        })
    }

    /// Advance redundancy watchdogs by `dt` (spec §5: "Milan redundancy
    /// watchdog" is one of the per-tick cooperating tasks).
    pub fn tick(&mut self, dt: Duration) -> Vec<(u64, milan::DeliveryState)> {
        self.redundancy.tick_all(dt)
    }
}
