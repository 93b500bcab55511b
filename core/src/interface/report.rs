use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Payload handed to the reporting collaborator when a zone count turns stable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InfractionReport {
    pub description: String,
    pub count: usize,
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<PathBuf>,
}

impl InfractionReport {
    pub fn new(count: usize, timestamp: f64, evidence: Option<PathBuf>) -> Self {
        Self {
            description: describe_count(count),
            count,
            timestamp,
            evidence,
        }
    }
}

/// Human-readable summary of a restricted-zone count.
pub fn describe_count(count: usize) -> String {
    match count {
        0 => "zone clear".to_string(),
        1 => "1 vehicle in restricted zone".to_string(),
        n => format!("{} vehicles in restricted zone", n),
    }
}

/// Observable outcome of one delivery attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryEvent {
    Delivered { count: usize, status: u16 },
    Rejected { count: usize, status: u16 },
    Failed { count: usize, reason: String },
}

impl DeliveryEvent {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryEvent::Delivered { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_pluralizes_counts() {
        assert_eq!(describe_count(0), "zone clear");
        assert_eq!(describe_count(1), "1 vehicle in restricted zone");
        assert_eq!(describe_count(3), "3 vehicles in restricted zone");
    }

    #[test]
    fn report_omits_missing_evidence() {
        let report = InfractionReport::new(2, 4.5, None);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("evidence").is_none());
        assert_eq!(json["description"], "2 vehicles in restricted zone");
    }
}
