use std::time::SystemTime;

use crate::configuration::SampleType;

/// Index into `Profile::string_table`.
pub type StringId = i64;
pub type FunctionId = u64;
pub type LocationId = u64;

/// An immutable snapshot of one profiling window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub sample_types: Vec<SampleType>,
    pub samples: Vec<Sample>,
    pub locations: Vec<Location>,
    pub functions: Vec<Function>,
    pub string_table: Vec<String>,
    pub start: SystemTime,
    pub finish: SystemTime,
}

/// Sample
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// The stack leading to this sample.
    /// The leaf node will be stored at `location_ids[0]`.
    pub location_ids: Vec<LocationId>,
    /// One value per entry of `Profile::sample_types`, in the same order.
    pub values: Vec<i64>,
    pub labels: Vec<Label>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub key: StringId,
    pub value: StringId,
}

/// Location represents a line in the source code hit when a sample was captured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub function_id: FunctionId,
    pub line: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub id: FunctionId,
    pub name: StringId,
    pub filename: StringId,
}

impl Profile {
    pub fn string(&self, id: StringId) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.string_table.get(index))
            .map(String::as_str)
    }

    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.functions.iter().find(|f| f.id == id)
    }

    pub fn duration(&self) -> std::time::Duration {
        self.finish.duration_since(self.start).unwrap_or_default()
    }
}
