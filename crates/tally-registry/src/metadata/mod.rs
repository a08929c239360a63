//! Earliest upload time extraction from project metadata

use tally_core::error::TallyError;
use tally_core::types::Timestamp;

use crate::api::ProjectMetadata;
use crate::RegistryResult;

/// Decode a raw metadata body for `name`
pub fn parse_metadata(name: &str, body: &[u8]) -> RegistryResult<ProjectMetadata> {
    serde_json::from_slice(body).map_err(|e| TallyError::MetadataParse {
        name: name.to_string(),
        message: e.to_string(),
    })
}

/// Earliest upload time across all releases of a project.
///
/// Only the first listed file of each release is considered. It is not
/// necessarily the earliest file of that release, but it is close enough for
/// day-level bucketing and avoids scanning every file.
///
/// Returns `None` when no release has a file carrying an upload time.
pub fn earliest_timestamp(metadata: &ProjectMetadata) -> Option<Timestamp> {
    metadata
        .releases
        .values()
        .filter_map(|release| release.as_ref()?.first_file.as_ref())
        .filter_map(|file| file.upload_time)
        .min()
}
