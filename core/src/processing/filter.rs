use crate::prelude::{
    EngineConfig, MonitorError, MonitorResult, ProcessingStage, StageInput, StageMetadata,
    StageOutput,
};
use crate::telemetry::log::LogManager;

/// Keeps detections of the target class at or above the confidence floor.
pub struct DetectionFilterStage {
    config: Option<EngineConfig>,
    logger: LogManager,
}

impl DetectionFilterStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new("filter"),
        }
    }
}

impl Default for DetectionFilterStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for DetectionFilterStage {
    fn initialize(&mut self, config: &EngineConfig) -> MonitorResult<()> {
        if !(0.0..=1.0).contains(&config.min_confidence) {
            return Err(MonitorError::InvalidInput(format!(
                "confidence floor {} outside [0, 1]",
                config.min_confidence
            )));
        }
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> MonitorResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| MonitorError::Internal("stage not initialized".into()))?;

        let received = input.objects.len();
        let objects: Vec<_> = input
            .objects
            .into_iter()
            .filter(|object| {
                object.class_id == config.target_class_id
                    && object.confidence >= config.min_confidence
            })
            .map(|mut object| {
                object.bbox = object.bbox.normalized();
                object
            })
            .collect();

        let note = format!("kept {} of {} detections", objects.len(), received);
        self.logger.trace(&note);

        Ok(StageOutput {
            objects,
            metadata: StageMetadata {
                notes: vec![note],
                ..Default::default()
            },
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}
