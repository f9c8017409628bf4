//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic simulation job preparation, launch and results retrieval."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Engine outputs: recorded curves and the timeline.

use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, SimulationError};

pub const CURVES_FILE: &str = "outputs/curves/curves.csv";
pub const TIMELINE_FILE: &str = "outputs/timeline/timeline.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SimulationStatus {
    Success,
    Failure,
}

/// One recorded variable, as `(time, value)` points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

impl TimeSeries {
    pub fn last_value(&self) -> Option<f64> {
        self.points.last().map(|(_, value)| *value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEvent {
    pub time: f64,
    pub model: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DynamicSimulationResult {
    pub status: SimulationStatus,
    pub curves: IndexMap<String, TimeSeries>,
    pub timeline: Vec<TimelineEvent>,
    /// Engine error output, set on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DynamicSimulationResult {
    /// Collect whatever outputs the engine left in `workdir`. Curves are
    /// required only when `curves_expected` is set.
    pub fn collect(workdir: &Path, status: SimulationStatus, curves_expected: bool) -> Result<Self> {
        let curves_path = workdir.join(CURVES_FILE);
        let curves = if curves_path.is_file() {
            read_curves(&curves_path)?
        } else if curves_expected && status == SimulationStatus::Success {
            return Err(SimulationError::MissingOutput(curves_path));
        } else {
            IndexMap::new()
        };
        let timeline_path = workdir.join(TIMELINE_FILE);
        let timeline = if timeline_path.is_file() {
            read_timeline(&timeline_path)?
        } else {
            Vec::new()
        };
        Ok(Self {
            status,
            curves,
            timeline,
            error: None,
        })
    }
}

/// Parse a `;`-separated curves file whose first column is time. The engine
/// ends every row with a separator, which yields an empty trailing column.
pub fn read_curves(path: &Path) -> Result<IndexMap<String, TimeSeries>> {
    let file = fs::File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let columns: Vec<(usize, String)> = reader
        .headers()?
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, name)| !name.trim().is_empty())
        .map(|(index, name)| (index, name.trim().to_owned()))
        .collect();
    let mut series: IndexMap<String, TimeSeries> = columns
        .iter()
        .map(|(_, name)| {
            (
                name.clone(),
                TimeSeries {
                    name: name.clone(),
                    points: Vec::new(),
                },
            )
        })
        .collect();

    for record in reader.records() {
        let record = record?;
        let Some(time) = record.get(0).and_then(|raw| raw.trim().parse::<f64>().ok()) else {
            continue;
        };
        for (index, name) in &columns {
            let value = record.get(*index).and_then(|raw| raw.trim().parse::<f64>().ok());
            if let (Some(value), Some(entry)) = (value, series.get_mut(name)) {
                entry.points.push((time, value));
            }
        }
    }
    debug!(path = %path.display(), curves = series.len(), "curves parsed");
    Ok(series)
}

/// Parse `time | model | message` lines; blank lines are ignored.
pub fn read_timeline(path: &Path) -> Result<Vec<TimelineEvent>> {
    let content = fs::read_to_string(path)?;
    let mut events = Vec::new();
    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.splitn(3, '|').map(str::trim);
        let parsed = match (fields.next(), fields.next(), fields.next()) {
            (Some(time), Some(model), Some(message)) => time.parse::<f64>().ok().map(|time| TimelineEvent {
                time,
                model: model.to_owned(),
                message: message.to_owned(),
            }),
            _ => None,
        };
        match parsed {
            Some(event) => events.push(event),
            None => {
                return Err(SimulationError::Timeline {
                    line: number + 1,
                    content: line.to_owned(),
                })
            }
        }
    }
    Ok(events)
}
