//! Telemetry records emitted once per sampled frame.

use serde::{Serialize, Serializer};
use std::fmt;

/// A measured value or a typed reason for its absence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Reading<T> {
    Value(T),
    /// The measurement ran but found nothing (no digits, no lines).
    Undetected,
    /// The measurement could not be made (no gauge configured, invalid
    /// gauge line, no transition on the gauge).
    Unavailable,
}

impl<T> Reading<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Reading::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Reading::Value(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reading<U> {
        match self {
            Reading::Value(v) => Reading::Value(f(v)),
            Reading::Undetected => Reading::Undetected,
            Reading::Unavailable => Reading::Unavailable,
        }
    }
}

impl<T> From<Option<T>> for Reading<T> {
    /// `None` maps to [`Reading::Undetected`].
    fn from(value: Option<T>) -> Self {
        value.map_or(Reading::Undetected, Reading::Value)
    }
}

impl<T: fmt::Display> fmt::Display for Reading<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(v) => v.fmt(f),
            Reading::Undetected => f.write_str("undetected"),
            Reading::Unavailable => f.write_str("unavailable"),
        }
    }
}

impl<T: Serialize> Serialize for Reading<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reading::Value(v) => v.serialize(serializer),
            Reading::Undetected => serializer.serialize_str("undetected"),
            Reading::Unavailable => serializer.serialize_str("unavailable"),
        }
    }
}

/// Which columns a sink writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordLayout {
    /// mission_clock, speed, altitude
    Basic,
    /// Basic plus angle, engine counts and propellant levels
    #[default]
    Extended,
}

const BASIC_COLUMNS: [&str; 3] = ["mission_clock", "speed", "altitude"];
const EXTENDED_COLUMNS: [&str; 8] = [
    "mission_clock",
    "speed",
    "altitude",
    "angle",
    "engines_upper",
    "engines_booster",
    "lox_percent",
    "ch4_percent",
];

impl RecordLayout {
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            RecordLayout::Basic => &BASIC_COLUMNS,
            RecordLayout::Extended => &EXTENDED_COLUMNS,
        }
    }
}

/// One row of telemetry. Never mutated after the orchestrator builds it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TelemetryRecord {
    /// Index of the frame this record was sampled from
    #[serde(skip)]
    pub frame_index: u64,
    pub mission_clock: String,
    pub speed: Reading<u32>,
    pub altitude: Reading<f64>,
    pub angle: Reading<f64>,
    pub engines_upper: u32,
    pub engines_booster: u32,
    pub lox_percent: Reading<f64>,
    pub ch4_percent: Reading<f64>,
}

impl TelemetryRecord {
    /// Renders the row as text cells in `layout` column order.
    pub fn cells(&self, layout: RecordLayout) -> Vec<String> {
        let mut cells = vec![
            self.mission_clock.clone(),
            self.speed.to_string(),
            self.altitude.to_string(),
        ];
        if layout == RecordLayout::Extended {
            cells.push(self.angle.map(|a| format!("{a:.2}")).to_string());
            cells.push(self.engines_upper.to_string());
            cells.push(self.engines_booster.to_string());
            cells.push(self.lox_percent.map(|p| format!("{p:.2}")).to_string());
            cells.push(self.ch4_percent.map(|p| format!("{p:.2}")).to_string());
        }
        cells
    }

    /// Renders the row as JSON values in `layout` column order.
    pub fn json_cells(&self, layout: RecordLayout) -> serde_json::Result<Vec<serde_json::Value>> {
        let mut cells = vec![
            serde_json::to_value(&self.mission_clock)?,
            serde_json::to_value(self.speed)?,
            serde_json::to_value(self.altitude)?,
        ];
        if layout == RecordLayout::Extended {
            cells.push(serde_json::to_value(self.angle)?);
            cells.push(serde_json::to_value(self.engines_upper)?);
            cells.push(serde_json::to_value(self.engines_booster)?);
            cells.push(serde_json::to_value(self.lox_percent)?);
            cells.push(serde_json::to_value(self.ch4_percent)?);
        }
        Ok(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> TelemetryRecord {
        TelemetryRecord {
            frame_index: 10,
            mission_clock: "00:01:05".to_string(),
            speed: Reading::Value(1234),
            altitude: Reading::Value(12.5),
            angle: Reading::Undetected,
            engines_upper: 3,
            engines_booster: 0,
            lox_percent: Reading::Value(54.321),
            ch4_percent: Reading::Unavailable,
        }
    }

    #[test]
    fn test_reading_display() {
        assert_eq!(Reading::Value(42).to_string(), "42");
        assert_eq!(Reading::<u32>::Undetected.to_string(), "undetected");
        assert_eq!(Reading::<f64>::Unavailable.to_string(), "unavailable");
    }

    #[test]
    fn test_reading_from_option() {
        assert_eq!(Reading::from(Some(3)), Reading::Value(3));
        assert_eq!(Reading::<i32>::from(None), Reading::Undetected);
    }

    #[test]
    fn test_reading_serializes_as_number_or_sentinel() {
        assert_eq!(serde_json::to_string(&Reading::Value(1.5)).unwrap(), "1.5");
        assert_eq!(
            serde_json::to_string(&Reading::<f64>::Undetected).unwrap(),
            "\"undetected\""
        );
    }

    #[test]
    fn test_cells_follow_layout() {
        let record = sample_record();
        assert_eq!(
            record.cells(RecordLayout::Basic),
            vec!["00:01:05", "1234", "12.5"]
        );
        assert_eq!(
            record.cells(RecordLayout::Extended),
            vec![
                "00:01:05",
                "1234",
                "12.5",
                "undetected",
                "3",
                "0",
                "54.32",
                "unavailable"
            ]
        );
        assert_eq!(
            record.cells(RecordLayout::Extended).len(),
            RecordLayout::Extended.columns().len()
        );
    }

    #[test]
    fn test_json_cells() {
        let cells = sample_record().json_cells(RecordLayout::Extended).unwrap();
        assert_eq!(cells[1], serde_json::json!(1234));
        assert_eq!(cells[3], serde_json::json!("undetected"));
        assert_eq!(cells[7], serde_json::json!("unavailable"));
    }
}
