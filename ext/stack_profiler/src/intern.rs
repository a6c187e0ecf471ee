use std::collections::{hash_map, HashMap};
use std::hash::Hash;

use crate::frame::FrameDescriptor;
use crate::serialization::profile::{Function, FunctionId, Location, LocationId, StringId};

/// Deduplicated strings. Index 0 is always the empty string.
#[derive(Debug)]
pub struct StringTable {
    strings: Vec<String>,
    ids: HashMap<String, StringId>,
}

impl StringTable {
    pub fn new() -> Self {
        let mut table = Self {
            strings: vec![],
            ids: HashMap::new(),
        };
        table.intern("");
        table
    }

    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(id) = self.ids.get(s) {
            return *id;
        }
        let id = self.strings.len() as StringId;
        self.strings.push(s.to_owned());
        self.ids.insert(s.to_owned(), id);
        id
    }

    pub fn get(&self, id: StringId) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.strings.get(index))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn into_strings(self) -> Vec<String> {
        self.strings
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Assigns ids 1..=N to keys in first-seen order. Id 0 is reserved by pprof.
#[derive(Debug)]
struct CompactIdMap<K> {
    ids: HashMap<K, u64>,
    next: u64,
}

impl<K: Eq + Hash> CompactIdMap<K> {
    fn new() -> Self {
        Self {
            ids: HashMap::new(),
            next: 0,
        }
    }

    /// Returns the id of `key`, calling `on_first_use` when the key is new.
    fn ensure_with<F>(&mut self, key: K, on_first_use: F) -> u64
    where
        F: FnOnce(u64),
    {
        match self.ids.entry(key) {
            hash_map::Entry::Occupied(o) => *o.get(),
            hash_map::Entry::Vacant(v) => {
                self.next += 1;
                on_first_use(self.next);
                *v.insert(self.next)
            }
        }
    }
}

/// String, function and location tables of one profiling window.
///
/// Tables only ever grow; a new window starts with a fresh `InternTables`.
#[derive(Debug)]
pub struct InternTables {
    strings: StringTable,
    function_ids: CompactIdMap<(StringId, StringId)>,
    functions: Vec<Function>,
    location_ids: CompactIdMap<(FunctionId, i64)>,
    locations: Vec<Location>,
}

impl InternTables {
    pub fn new() -> Self {
        Self {
            strings: StringTable::new(),
            function_ids: CompactIdMap::new(),
            functions: vec![],
            location_ids: CompactIdMap::new(),
            locations: vec![],
        }
    }

    pub fn intern_string(&mut self, s: &str) -> StringId {
        self.strings.intern(s)
    }

    pub fn intern_function(&mut self, name: &str, filename: &str) -> FunctionId {
        let name = self.strings.intern(name);
        let filename = self.strings.intern(filename);
        let functions = &mut self.functions;
        self.function_ids.ensure_with((name, filename), |id| {
            functions.push(Function { id, name, filename });
        })
    }

    pub fn intern_location(&mut self, function_id: FunctionId, line: i64) -> LocationId {
        let locations = &mut self.locations;
        self.location_ids.ensure_with((function_id, line), |id| {
            locations.push(Location {
                id,
                function_id,
                line,
            });
        })
    }

    pub fn intern_frame(&mut self, frame: &FrameDescriptor) -> LocationId {
        let function_id = self.intern_function(&frame.function_name, &frame.file_path);
        self.intern_location(function_id, frame.line_number)
    }

    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Location>, Vec<Function>) {
        (self.strings.into_strings(), self.locations, self.functions)
    }
}

impl Default for InternTables {
    fn default() -> Self {
        Self::new()
    }
}
