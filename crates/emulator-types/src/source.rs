//! Logical sources and sample keys.

use std::fmt;
use std::str::FromStr;

/// One of the three logical tables sampled each iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
    /// Post data.
    Pin,
    /// Geolocation data.
    Geo,
    /// User profile data.
    User,
}

impl Source {
    /// All sources in emission order.
    pub const ALL: [Source; 3] = [Source::Pin, Source::Geo, Source::User];

    /// Short name used in topic suffixes, stream names and archive keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Pin => "pin",
            Source::Geo => "geo",
            Source::User => "user",
        }
    }

    /// Table the source is read from unless overridden.
    pub fn default_table(&self) -> &'static str {
        match self {
            Source::Pin => "pinterest_data",
            Source::Geo => "geolocation_data",
            Source::User => "user_data",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pin" => Ok(Source::Pin),
            "geo" => Ok(Source::Geo),
            "user" => Ok(Source::User),
            other => Err(format!("unknown source '{other}' (expected pin, geo or user)")),
        }
    }
}

/// Row offset chosen for one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleKey(pub u64);

impl SampleKey {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for SampleKey {
    fn from(k: u64) -> Self {
        SampleKey(k)
    }
}

impl fmt::Display for SampleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
