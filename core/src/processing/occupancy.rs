use crate::geometry::{classify, RestrictedZone};
use crate::prelude::{
    EngineConfig, MonitorError, MonitorResult, ProcessingStage, StageInput, StageMetadata,
    StageOutput,
};
use crate::telemetry::log::LogManager;

/// Restricted-zone stage: counts vehicles whose center sits inside the zone.
pub struct ZoneStage {
    zone: RestrictedZone,
    config: Option<EngineConfig>,
    logger: LogManager,
}

impl ZoneStage {
    pub fn new() -> Self {
        Self {
            zone: RestrictedZone::DEFAULT,
            config: None,
            logger: LogManager::new("zone"),
        }
    }

    pub fn zone(&self) -> RestrictedZone {
        self.zone
    }

    /// Replaces the zone; a rejected zone leaves the current one in place.
    pub fn set_zone(&mut self, zone: RestrictedZone) -> MonitorResult<()> {
        let min_extent = self
            .config
            .as_ref()
            .map(|config| config.min_zone_extent_px)
            .unwrap_or(0.0);
        zone.validate(min_extent)?;
        self.zone = zone;
        self.logger.record(&format!(
            "zone set to ({}, {})-({}, {})",
            zone.x1, zone.y1, zone.x2, zone.y2
        ));
        Ok(())
    }

    pub fn reset_zone(&mut self) {
        self.zone = self
            .config
            .as_ref()
            .map(|config| config.default_zone)
            .unwrap_or(RestrictedZone::DEFAULT);
        self.logger.record("zone reset to default");
    }
}

impl Default for ZoneStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for ZoneStage {
    fn initialize(&mut self, config: &EngineConfig) -> MonitorResult<()> {
        config.default_zone.validate(config.min_zone_extent_px)?;
        self.zone = config.default_zone;
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> MonitorResult<StageOutput> {
        if self.config.is_none() {
            return Err(MonitorError::Internal("stage not initialized".into()));
        }

        let occupancy = classify(&input.objects, &self.zone);
        self.logger
            .trace(&format!("{} vehicles in zone", occupancy.count));

        let metadata = StageMetadata {
            zone_count: Some(occupancy.count),
            ..Default::default()
        };

        Ok(StageOutput {
            objects: occupancy.occupants,
            metadata,
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}
