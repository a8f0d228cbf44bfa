use crate::models::{AssetRecord, CatalogEntry, CatalogStats};
use chrono::{DateTime, Duration, Utc};

/// Result of one catalog build: the display-ready entries plus the number of
/// provider records that had to be skipped as malformed.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
    pub skipped: usize,
}

/// Builds a deterministic, display-ready catalog from a raw provider listing.
///
/// One record maps to at most one entry. Records missing a public id, a
/// secure URL, or any usable timestamp are skipped and counted rather than
/// failing the whole listing. The result is sorted most-recently-modified
/// first, ties broken by display name.
pub fn build(records: &[AssetRecord]) -> Catalog {
    let mut entries = Vec::with_capacity(records.len());
    let mut skipped = 0;

    for record in records {
        match entry_from_record(record) {
            Some(entry) => entries.push(entry),
            None => {
                tracing::warn!(public_id = ?record.public_id, "Skipping malformed asset record");
                skipped += 1;
            }
        }
    }

    entries.sort_by(|a, b| {
        b.modified_at
            .cmp(&a.modified_at)
            .then_with(|| a.display_name.cmp(&b.display_name))
    });

    Catalog { entries, skipped }
}

fn entry_from_record(record: &AssetRecord) -> Option<CatalogEntry> {
    let public_id = record.public_id.as_deref()?;
    let reference = record.secure_url.clone()?;
    let modified_at = record.updated_at.or(record.created_at)?;

    if record.bytes < 0 {
        return None;
    }

    // Strip the provider-assigned folder prefix, keep the last path segment.
    let display_name = public_id.rsplit('/').next().unwrap_or(public_id);
    if display_name.is_empty() {
        return None;
    }

    Some(CatalogEntry {
        display_name: display_name.to_string(),
        size_bytes: record.bytes,
        size_formatted: format_file_size(record.bytes),
        modified_at,
        reference,
    })
}

/// Aggregates listing-wide numbers for the stats endpoint. "Recent" means a
/// timestamp within the 24 hours preceding `now`.
pub fn stats(records: &[AssetRecord], now: DateTime<Utc>) -> CatalogStats {
    let total_size_bytes: i64 = records.iter().map(|r| r.bytes.max(0)).sum();
    let cutoff = now - Duration::hours(24);
    let recent_uploads = records
        .iter()
        .filter_map(|r| r.updated_at.or(r.created_at))
        .filter(|ts| *ts > cutoff && *ts <= now)
        .count();

    CatalogStats {
        total_files: records.len(),
        total_size: format_file_size(total_size_bytes),
        total_size_bytes,
        recent_uploads,
    }
}

/// Converts a byte count to a human readable size ("0B", "1.5 KB", ...).
pub fn format_file_size(size_bytes: i64) -> String {
    if size_bytes <= 0 {
        return "0B".to_string();
    }

    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    let rounded = (size * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{} {}", rounded as i64, UNITS[unit])
    } else {
        format!("{} {}", rounded, UNITS[unit])
    }
}

/// Picks a display name not already present in `existing` by appending a
/// counter before the extension ("report.pdf" -> "report_1.pdf", ...).
pub fn unique_display_name(existing: &[String], candidate: &str) -> String {
    if !existing.iter().any(|n| n == candidate) {
        return candidate.to_string();
    }

    let (base, extension) = match candidate.rsplit_once('.') {
        Some((base, ext)) => (base, Some(ext)),
        None => (candidate, None),
    };

    let mut counter = 1;
    loop {
        let attempt = match extension {
            Some(ext) => format!("{}_{}.{}", base, counter, ext),
            None => format!("{}_{}", base, counter),
        };
        if !existing.iter().any(|n| *n == attempt) {
            return attempt;
        }
        counter += 1;
    }
}
