//! PyPI JSON API response types

use std::fmt;

use indexmap::IndexMap;
use serde::de::{IgnoredAny, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tally_core::types::{parse_timestamp, Timestamp};

/// Project metadata document served at `/pypi/<name>/json`
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectMetadata {
    /// Project information block
    #[serde(default)]
    pub info: Option<ProjectInfo>,
    /// Files per release version, in the order the registry lists them
    pub releases: IndexMap<String, Option<Release>>,
}

/// Files of one release.
///
/// Only the first listed file is decoded; the rest are skipped unread, so a
/// malformed later file cannot fail the document.
#[derive(Debug, Clone, Default)]
pub struct Release {
    /// First file as listed by the registry
    pub first_file: Option<ReleaseFile>,
    /// Number of files listed for the release
    pub file_count: usize,
}

impl<'de> Deserialize<'de> for Release {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ReleaseVisitor;

        impl<'de> Visitor<'de> for ReleaseVisitor {
            type Value = Release;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a list of release files")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Release, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let first_file = seq.next_element::<ReleaseFile>()?;
                let mut file_count = usize::from(first_file.is_some());
                while seq.next_element::<IgnoredAny>()?.is_some() {
                    file_count += 1;
                }
                Ok(Release { first_file, file_count })
            }
        }

        deserializer.deserialize_seq(ReleaseVisitor)
    }
}

/// Subset of the project information block
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectInfo {
    /// Project name as displayed by the registry
    pub name: Option<String>,
    /// Latest version
    pub version: Option<String>,
    /// One-line summary
    pub summary: Option<String>,
}

/// A distributable file belonging to a release
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReleaseFile {
    /// File name
    pub filename: Option<String>,
    /// Distribution kind (sdist, bdist_wheel, ...)
    #[serde(rename = "packagetype")]
    pub package_type: Option<String>,
    /// Time the file was uploaded
    #[serde(default, deserialize_with = "deserialize_upload_time")]
    pub upload_time: Option<Timestamp>,
}

fn deserialize_upload_time<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|value| parse_timestamp(&value).map_err(serde::de::Error::custom))
        .transpose()
}
