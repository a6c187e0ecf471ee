use std::str::FromStr;

use crate::bounder::{MaxFrames, DEFAULT_MAX_FRAMES};
use crate::error::Error;

pub const DEFAULT_SAMPLE_TYPES: &[(&str, &str)] = &[
    ("cpu-time", "nanoseconds"),
    ("cpu-samples", "count"),
    ("wall-time", "nanoseconds"),
];

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub max_frames: usize,
    pub sample_types: Vec<SampleType>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            max_frames: DEFAULT_MAX_FRAMES,
            sample_types: DEFAULT_SAMPLE_TYPES
                .iter()
                .map(|(name, unit)| SampleType::new(*name, *unit))
                .collect(),
        }
    }
}

impl Configuration {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let configuration: Configuration = serde_json::from_str(json)?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.max_frames()?;
        if self.sample_types.is_empty() {
            return Err(Error::InvalidConfiguration(
                "at least one sample type is required".to_owned(),
            ));
        }
        for (i, sample_type) in self.sample_types.iter().enumerate() {
            if self.sample_types[..i].iter().any(|t| t.name == sample_type.name) {
                return Err(Error::InvalidConfiguration(format!(
                    "duplicate sample type {:?}",
                    sample_type.name
                )));
            }
        }
        Ok(())
    }

    pub fn max_frames(&self) -> Result<MaxFrames, Error> {
        MaxFrames::new(self.max_frames)
    }
}

/// A metric recorded for each sample, e.g. `cpu-time` in `nanoseconds`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SampleType {
    pub name: String,
    pub unit: String,
}

impl SampleType {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
        }
    }
}

impl FromStr for SampleType {
    type Err = Error;

    // "name:unit"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((name, unit)) if !name.is_empty() && !unit.is_empty() => {
                Ok(Self::new(name, unit))
            }
            _ => Err(Error::InvalidConfiguration(format!(
                "invalid sample type {:?} (expected \"name:unit\")",
                s
            ))),
        }
    }
}

impl TryFrom<String> for SampleType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SampleType> for String {
    fn from(value: SampleType) -> Self {
        format!("{}:{}", value.name, value.unit)
    }
}
