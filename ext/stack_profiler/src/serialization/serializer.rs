use std::time::{Duration, UNIX_EPOCH};

use prost::Message;

use super::pprof;
use super::profile::{Function, Label, Location, Profile, Sample};
use crate::configuration::SampleType;
use crate::error::Error;

pub struct ProfileSerializer;

impl ProfileSerializer {
    /// Encode `profile` as an uncompressed pprof message.
    ///
    /// Output depends only on the contents of `profile`; the same snapshot
    /// always produces the same bytes.
    pub fn encode(profile: &Profile) -> Vec<u8> {
        let mut string_table = profile.string_table.clone();
        if string_table.is_empty() {
            string_table.push(String::new());
        }

        // Sample type names are normally interned by the recorder; append
        // them if a hand-built profile lacks them
        let sample_type = profile
            .sample_types
            .iter()
            .map(|sample_type| pprof::ValueType {
                r#type: Self::string_index(&mut string_table, &sample_type.name),
                unit: Self::string_index(&mut string_table, &sample_type.unit),
            })
            .collect();

        let sample = profile
            .samples
            .iter()
            .map(|sample| pprof::Sample {
                location_id: sample.location_ids.clone(),
                value: sample.values.clone(),
                label: sample
                    .labels
                    .iter()
                    .map(|label| pprof::Label {
                        key: label.key,
                        str: label.value,
                    })
                    .collect(),
            })
            .collect();

        let location = profile
            .locations
            .iter()
            .map(|location| pprof::Location {
                id: location.id,
                line: vec![pprof::Line {
                    function_id: location.function_id,
                    line: location.line,
                }],
            })
            .collect();

        let function = profile
            .functions
            .iter()
            .map(|function| pprof::Function {
                id: function.id,
                name: function.name,
                system_name: function.name,
                filename: function.filename,
            })
            .collect();

        let time_nanos = profile
            .start
            .duration_since(UNIX_EPOCH)
            .map(Self::nanos)
            .unwrap_or(0);

        pprof::Profile {
            sample_type,
            sample,
            location,
            function,
            string_table,
            time_nanos,
            duration_nanos: Self::nanos(profile.duration()),
        }
        .encode_to_vec()
    }

    /// Decode pprof bytes produced by [`ProfileSerializer::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Profile, Error> {
        let message = pprof::Profile::decode(bytes)?;

        let string = |id: i64| -> Result<String, Error> {
            usize::try_from(id)
                .ok()
                .and_then(|index| message.string_table.get(index))
                .cloned()
                .ok_or_else(|| {
                    Error::MalformedProfile(format!("string index {} out of range", id))
                })
        };

        let sample_types = message
            .sample_type
            .iter()
            .map(|value_type| {
                Ok(SampleType::new(
                    string(value_type.r#type)?,
                    string(value_type.unit)?,
                ))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let locations = message
            .location
            .iter()
            .map(|location| match location.line.as_slice() {
                [line] => Ok(Location {
                    id: location.id,
                    function_id: line.function_id,
                    line: line.line,
                }),
                lines => Err(Error::MalformedProfile(format!(
                    "location {} has {} lines, expected 1",
                    location.id,
                    lines.len()
                ))),
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let functions = message
            .function
            .iter()
            .map(|function| Function {
                id: function.id,
                name: function.name,
                filename: function.filename,
            })
            .collect();

        let samples = message
            .sample
            .iter()
            .map(|sample| Sample {
                location_ids: sample.location_id.clone(),
                values: sample.value.clone(),
                labels: sample
                    .label
                    .iter()
                    .map(|label| Label {
                        key: label.key,
                        value: label.str,
                    })
                    .collect(),
            })
            .collect();

        let start = UNIX_EPOCH + Duration::from_nanos(message.time_nanos.max(0) as u64);
        let finish = start + Duration::from_nanos(message.duration_nanos.max(0) as u64);

        Ok(Profile {
            sample_types,
            samples,
            locations,
            functions,
            string_table: message.string_table,
            start,
            finish,
        })
    }

    /// Human-readable rendering of a snapshot, for debugging.
    pub fn to_json(profile: &Profile) -> Result<String, Error> {
        Ok(serde_json::to_string(profile)?)
    }

    fn string_index(string_table: &mut Vec<String>, s: &str) -> i64 {
        match string_table.iter().position(|existing| existing == s) {
            Some(index) => index as i64,
            None => {
                string_table.push(s.to_owned());
                (string_table.len() - 1) as i64
            }
        }
    }

    fn nanos(duration: Duration) -> i64 {
        i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX)
    }
}
