//! Fetched rows.

use crate::encode::{encode_record, SerializationError};
use crate::source::Source;
use crate::value::Value;

/// One row from one source table, as an ordered column-name-to-value mapping.
///
/// An empty record means the source had no row at the sampled offset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// A record with no columns.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append a column, replacing an earlier column of the same name.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Columns in the order the source returned them.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Encode through the temporal-aware JSON policy.
    pub fn to_json(&self) -> Result<serde_json::Value, SerializationError> {
        encode_record(self)
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Record::empty(), |record, (k, v)| record.with_field(k, v))
    }
}

/// The correlated records fetched for one sample key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRecords {
    pub pin: Record,
    pub geo: Record,
    pub user: Record,
}

impl SourceRecords {
    pub fn new(pin: Record, geo: Record, user: Record) -> Self {
        Self { pin, geo, user }
    }

    pub fn get(&self, source: Source) -> &Record {
        match source {
            Source::Pin => &self.pin,
            Source::Geo => &self.geo,
            Source::User => &self.user,
        }
    }

    /// Records paired with their source, in emission order.
    pub fn iter(&self) -> impl Iterator<Item = (Source, &Record)> {
        Source::ALL.into_iter().map(move |s| (s, self.get(s)))
    }

    /// Sources that returned no row.
    pub fn empty_sources(&self) -> Vec<Source> {
        self.iter()
            .filter(|(_, r)| r.is_empty())
            .map(|(s, _)| s)
            .collect()
    }
}
