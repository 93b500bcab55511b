use anyhow::Context;
use curbcore::session::{FrameInput, SessionCommand};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One line of detector output, optionally carrying operator commands that
/// apply before the frame is processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    #[serde(flatten)]
    pub frame: FrameInput,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<SessionCommand>,
}

pub fn parse_frames<R: BufRead>(reader: R) -> anyhow::Result<Vec<FrameRecord>> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading frame line {}", index + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let record: FrameRecord = serde_json::from_str(trimmed)
            .with_context(|| format!("parsing frame line {}", index + 1))?;
        records.push(record);
    }
    Ok(records)
}

pub fn load_frames<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<FrameRecord>> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("opening frame stream {}", path_ref.display()))?;
    parse_frames(BufReader::new(file))
        .with_context(|| format!("loading frames from {}", path_ref.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_frames_with_commands_and_skips_comments() {
        let input = r#"# recorded at the north curb
{"timestamp": 0.0, "frame_width": 640, "objects": [], "commands": [{"command": "calibration_point", "x": 0, "y": 400}]}

{"timestamp": 0.5, "frame_width": 640, "image": "frames/000001.jpg", "objects": [{"bbox": [10, 200, 120, 260], "class_id": 2, "confidence": 0.8}]}
"#;
        let frames = parse_frames(Cursor::new(input)).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].commands.len(), 1);
        assert_eq!(frames[1].frame.objects.len(), 1);
        assert!(frames[1].frame.snapshot.is_some());
    }

    #[test]
    fn malformed_line_reports_its_number() {
        let err = parse_frames(Cursor::new("{\"timestamp\": 0.0}\n")).unwrap_err();
        assert!(format!("{:#}", err).contains("line 1"));
    }
}
