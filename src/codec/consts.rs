//! Constants of the PBF container and its block format.
//! See https://wiki.openstreetmap.org/wiki/PBF_Format

/// Blob type of the (single, leading) file header unit.
pub const OSM_HEADER: &str = "OSMHeader";
/// Blob type of every data unit.
pub const OSM_DATA: &str = "OSMData";

/// Required feature gating the `visible` flag of entity metadata.
pub const HISTORICAL_INFORMATION: &str = "HistoricalInformation";

/// Size of the big-endian length prefix in front of each `BlobHeader`.
pub const HEADER_LEN_SIZE: usize = 4;

/// Upper bound for a serialized `BlobHeader`.
pub const MAX_HEADER_SIZE: usize = 64 * 1024;
/// Upper bound for a serialized `Blob`.
pub const MAX_BLOB_SIZE: usize = 32 * 1024 * 1024;

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

// Default Scaling Factors
pub const DEFAULT_GRANULARITY: i32 = 100;
pub const DEFAULT_DATE_GRANULARITY: i32 = 1000;
pub const NANO: f64 = 1e-9;

/// `Info.version` when the field is absent.
pub const DEFAULT_VERSION: i32 = -1;
