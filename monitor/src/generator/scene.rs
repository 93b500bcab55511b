use crate::workflow::source::FrameRecord;
use anyhow::ensure;
use curbcore::interface::{BoundingBox, DetectedObject};
use curbcore::session::{FrameInput, SessionCommand};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const CAR: u32 = 2;
const PERSON: u32 = 0;

/// Configuration for generating a synthetic curb scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub frames: usize,
    pub fps: f64,
    pub frame_width: f64,
    /// Left edges of the cars parked along the curb row.
    pub parked_at: Vec<f64>,
    pub car_length_px: f64,
    pub jitter_px: f64,
    /// Seconds during which one car stops inside the default zone.
    pub intruder_from: f64,
    pub intruder_until: f64,
    /// Emit the calibration line on the first frame.
    pub calibrate: bool,
    pub seed: u64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            frames: 100,
            fps: 4.0,
            frame_width: 640.0,
            parked_at: vec![20.0, 135.0, 420.0],
            car_length_px: 110.0,
            jitter_px: 3.0,
            intruder_from: 5.0,
            intruder_until: 15.0,
            calibrate: true,
            seed: 0,
        }
    }
}

fn jittered(rng: &mut StdRng, value: f64, jitter: f64) -> f64 {
    if jitter > 0.0 {
        value + rng.gen_range(-jitter..jitter)
    } else {
        value
    }
}

pub fn build_scene(config: &SceneConfig) -> anyhow::Result<Vec<FrameRecord>> {
    ensure!(config.fps > 0.0, "scene fps must be positive");
    ensure!(config.car_length_px > 0.0, "car length must be positive");

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut records = Vec::with_capacity(config.frames);

    for index in 0..config.frames {
        let timestamp = index as f64 / config.fps;
        let mut objects = Vec::new();

        for &left in &config.parked_at {
            let x1 = jittered(&mut rng, left, config.jitter_px);
            let x2 = jittered(&mut rng, left + config.car_length_px, config.jitter_px);
            objects.push(DetectedObject::new(
                BoundingBox::new(x1, 180.0, x2, 240.0),
                CAR,
                rng.gen_range(0.6..0.95),
            ));
        }

        if (config.intruder_from..config.intruder_until).contains(&timestamp) {
            let cx = jittered(&mut rng, 300.0, config.jitter_px);
            objects.push(DetectedObject::new(
                BoundingBox::new(cx - 55.0, 305.0, cx + 55.0, 345.0),
                CAR,
                rng.gen_range(0.7..0.99),
            ));
        }

        // Pedestrian and a weak car detection; both must be filtered out.
        objects.push(DetectedObject::new(
            BoundingBox::new(330.0, 290.0, 350.0, 350.0),
            PERSON,
            0.9,
        ));
        objects.push(DetectedObject::new(
            BoundingBox::new(150.0, 300.0, 250.0, 340.0),
            CAR,
            0.3,
        ));

        let commands = if index == 0 && config.calibrate {
            vec![
                SessionCommand::CalibrationPoint { x: 0.0, y: 420.0 },
                SessionCommand::CalibrationPoint {
                    x: config.frame_width,
                    y: 420.0,
                },
            ]
        } else {
            Vec::new()
        };

        records.push(FrameRecord {
            frame: FrameInput {
                timestamp,
                frame_width: config.frame_width,
                objects,
                snapshot: None,
            },
            commands,
        });
    }

    Ok(records)
}
