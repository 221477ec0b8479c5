//! Usage analytics over a file listing.
//!
//! Everything here is advisory: the file limit is a soft figure for
//! reporting and is never enforced by the store.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::format::format_size;
use crate::store::StoredFile;

const MIB: u64 = 1024 * 1024;

/// Usage level relative to the advisory file limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageLevel {
    Good,
    Moderate,
    High,
}

impl UsageLevel {
    fn from_percentage(percentage: f64) -> Self {
        if percentage < 50.0 {
            UsageLevel::Good
        } else if percentage < 80.0 {
            UsageLevel::Moderate
        } else {
            UsageLevel::High
        }
    }
}

/// Count of files per size bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SizeDistribution {
    /// Under 1 MiB.
    pub small: u64,
    /// 1 MiB up to 10 MiB.
    pub medium: u64,
    /// 10 MiB and above.
    pub large: u64,
}

/// Aggregate figures for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageStats {
    pub total_files: u64,
    pub total_size: u64,
    /// Human-readable total size.
    pub total_size_display: String,
    pub file_limit: u64,
    /// Share of the advisory limit in use, capped at 100.
    pub usage_percentage: f64,
    pub remaining: u64,
    pub level: UsageLevel,
    /// More than 90% of the limit is used.
    pub approaching_limit: bool,
    /// Files per top-level MIME type (`"other"` when the type is empty).
    pub by_type: BTreeMap<String, u64>,
    pub size_distribution: SizeDistribution,
    /// Files stored within the last seven days.
    pub recent_uploads: u64,
}

impl UsageStats {
    /// Compute usage figures for `files` against an advisory `file_limit`.
    pub fn compute(files: &[StoredFile], file_limit: u64, now: DateTime<Utc>) -> Self {
        let total_files = files.len() as u64;
        let total_size: u64 = files.iter().map(StoredFile::size).sum();

        let usage_percentage = if file_limit == 0 {
            100.0
        } else {
            (total_files as f64 / file_limit as f64 * 100.0).min(100.0)
        };

        let mut by_type = BTreeMap::new();
        let mut size_distribution = SizeDistribution::default();
        let week_ago = now - Duration::days(7);
        let mut recent_uploads = 0;

        for file in files {
            let major = file.content_type().split('/').next().unwrap_or_default();
            let major = if major.is_empty() { "other" } else { major };
            *by_type.entry(major.to_string()).or_insert(0) += 1;

            match file.size() {
                s if s < MIB => size_distribution.small += 1,
                s if s < 10 * MIB => size_distribution.medium += 1,
                _ => size_distribution.large += 1,
            }

            if file.uploaded_at > week_ago {
                recent_uploads += 1;
            }
        }

        Self {
            total_files,
            total_size,
            total_size_display: format_size(total_size),
            file_limit,
            usage_percentage,
            remaining: file_limit.saturating_sub(total_files),
            level: UsageLevel::from_percentage(usage_percentage),
            approaching_limit: u128::from(total_files) * 10 > u128::from(file_limit) * 9,
            by_type,
            size_distribution,
            recent_uploads,
        }
    }
}
