//! The row fetcher seam and source-to-table mapping.

use crate::error::FetchError;
use async_trait::async_trait;
use emulator_types::{SampleKey, Source, SourceRecords};

/// Fetches the correlated row triple at one sample key.
#[async_trait]
pub trait RowFetcher: Send + Sync {
    /// Read the row at ordinal position `key` from each source table.
    ///
    /// A source with fewer than `key + 1` rows contributes an empty record.
    async fn fetch(&self, key: SampleKey) -> Result<SourceRecords, FetchError>;
}

/// Table names read for each source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTables {
    pub pin: String,
    pub geo: String,
    pub user: String,
}

impl Default for SourceTables {
    fn default() -> Self {
        Self {
            pin: Source::Pin.default_table().to_string(),
            geo: Source::Geo.default_table().to_string(),
            user: Source::User.default_table().to_string(),
        }
    }
}

impl SourceTables {
    /// Build and validate a table mapping.
    pub fn new(
        pin: impl Into<String>,
        geo: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let tables = Self {
            pin: pin.into(),
            geo: geo.into(),
            user: user.into(),
        };
        tables.validate()?;
        Ok(tables)
    }

    pub fn table(&self, source: Source) -> &str {
        match source {
            Source::Pin => &self.pin,
            Source::Geo => &self.geo,
            Source::User => &self.user,
        }
    }

    /// Table names are interpolated into SQL, so only `[A-Za-z0-9_$]` is allowed.
    pub fn validate(&self) -> Result<(), FetchError> {
        for source in Source::ALL {
            let name = self.table(source);
            let valid = !name.is_empty()
                && name.len() <= 64
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
            if !valid {
                return Err(FetchError::InvalidTable(name.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables() {
        let tables = SourceTables::default();
        assert_eq!(tables.table(Source::Pin), "pinterest_data");
        assert_eq!(tables.table(Source::Geo), "geolocation_data");
        assert_eq!(tables.table(Source::User), "user_data");
        assert!(tables.validate().is_ok());
    }

    #[test]
    fn test_rejects_injection_in_table_name() {
        let err = SourceTables::new("pins", "geo`; DROP TABLE x; --", "users").unwrap_err();
        assert!(matches!(err, FetchError::InvalidTable(_)));
        assert!(SourceTables::new("pins", "", "users").is_err());
    }
}
