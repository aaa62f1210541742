//! Field mapping tables.
//!
//! A [`MappingTable`] is the raw, ordered list of mapping entries as written
//! in configuration or returned by a custom mapping function. It is turned
//! into a [`FieldMapping`] (`target field -> source specifier`) before
//! projection.
//!
//! In configuration files a table may be written as a list:
//!
//! ```toml
//! "App\\User" = ["id", { name = "full_name" }, { phone = "phones.number" }]
//! ```
//!
//! or as a table, where integer keys are positional:
//!
//! ```toml
//! [indexes.people."App\\User"]
//! 0 = "id"
//! name = "full_name"
//! ```

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;

/// One raw entry of a mapping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingEntry {
    /// Target field name equals the source specifier.
    Positional(String),
    /// Explicit target field fed from a source specifier.
    Named { field: String, source: String },
}

impl MappingEntry {
    pub fn field(&self) -> &str {
        match self {
            MappingEntry::Positional(source) => source,
            MappingEntry::Named { field, .. } => field,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            MappingEntry::Positional(source) => source,
            MappingEntry::Named { source, .. } => source,
        }
    }

    fn from_key(key: String, source: String) -> Self {
        if key.parse::<i64>().is_ok() {
            MappingEntry::Positional(source)
        } else {
            MappingEntry::Named { field: key, source }
        }
    }
}

/// Ordered list of raw mapping entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    entries: Vec<MappingEntry>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional entry.
    pub fn field(mut self, source: impl Into<String>) -> Self {
        self.entries.push(MappingEntry::Positional(source.into()));
        self
    }

    /// Append a named entry.
    pub fn alias(mut self, field: impl Into<String>, source: impl Into<String>) -> Self {
        self.entries.push(MappingEntry::Named {
            field: field.into(),
            source: source.into(),
        });
        self
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve the table into `target -> source`. Later entries for the same
    /// target replace earlier ones.
    pub fn to_field_mapping(&self) -> FieldMapping {
        let mut mapping = FieldMapping::new();
        for entry in &self.entries {
            mapping.insert(entry.field(), entry.source());
        }
        mapping
    }
}

impl<S: Into<String>> FromIterator<S> for MappingTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|source| MappingEntry::Positional(source.into()))
                .collect(),
        }
    }
}

/// Ordered `target field -> source specifier` map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    entries: Vec<(String, String)>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A replaced entry keeps its original position.
    pub fn insert(&mut self, field: impl Into<String>, source: impl Into<String>) {
        let field = field.into();
        let source = source.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(existing) => existing.1 = source,
            None => self.entries.push((field, source)),
        }
    }

    /// Merge `other` into `self`; `other` wins on collisions.
    pub fn merge(mut self, other: FieldMapping) -> FieldMapping {
        for (field, source) in other.entries {
            self.insert(field, source);
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, source)| source.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(f, s)| (f.as_str(), s.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for MappingTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MappingTableVisitor)
    }
}

struct MappingTableVisitor;

impl<'de> Visitor<'de> for MappingTableVisitor {
    type Value = MappingTable;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a list of field names / {field = source} tables, or a table of field = source")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::new();
        while let Some(item) = seq.next_element::<MappingItem>()? {
            entries.extend(item.0);
        }
        Ok(MappingTable { entries })
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        Ok(MappingTable {
            entries: read_entries(map)?,
        })
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(MappingTable::new())
    }
}

/// A list element: a bare field name or an inline `{field = source}` table.
struct MappingItem(Vec<MappingEntry>);

impl<'de> Deserialize<'de> for MappingItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ItemVisitor;

        impl<'de> Visitor<'de> for ItemVisitor {
            type Value = MappingItem;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a field name or a {field = source} table")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(MappingItem(vec![MappingEntry::Positional(v.to_string())]))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(MappingItem(vec![MappingEntry::Positional(v)]))
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
                Ok(MappingItem(read_entries(map)?))
            }
        }

        deserializer.deserialize_any(ItemVisitor)
    }
}

fn read_entries<'de, A: MapAccess<'de>>(mut map: A) -> Result<Vec<MappingEntry>, A::Error> {
    let mut entries = Vec::new();
    while let Some((key, source)) = map.next_entry::<String, String>()? {
        entries.push(MappingEntry::from_key(key, source));
    }
    Ok(entries)
}
