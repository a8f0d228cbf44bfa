use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Raw asset description as returned by the storage provider.
///
/// Fields the provider may omit are optional here; the catalog builder
/// validates on ingestion and skips records it cannot use instead of
/// trusting the provider's shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AssetRecord {
    pub public_id: Option<String>,
    #[serde(default)]
    pub bytes: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub secure_url: Option<String>,
}

/// Display-ready view of one stored file, rebuilt from the provider listing
/// on every request. `reference` is the opaque handle later used for
/// download and delete requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CatalogEntry {
    pub display_name: String,
    pub size_bytes: i64,
    pub size_formatted: String,
    pub modified_at: DateTime<Utc>,
    pub reference: String,
}

/// Aggregate numbers for the stats endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogStats {
    pub total_files: usize,
    pub total_size: String,
    pub total_size_bytes: i64,
    pub recent_uploads: usize,
}
