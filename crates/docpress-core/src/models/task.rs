use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

use super::profile::QualityProfile;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Processing,
    Complete,
    Failed,
    Deleted,
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TaskStatus::Processing => write!(f, "processing"),
            TaskStatus::Complete => write!(f, "complete"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Deleted => write!(f, "deleted"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(TaskStatus::Processing),
            "complete" => Ok(TaskStatus::Complete),
            "failed" => Ok(TaskStatus::Failed),
            "deleted" => Ok(TaskStatus::Deleted),
            _ => Err(anyhow::anyhow!("Invalid task status: {}", s)),
        }
    }
}

/// Human-readable file size, the way the result view renders it.
pub fn format_file_size(size_bytes: u64) -> String {
    if size_bytes < 1024 {
        format!("{} B", size_bytes)
    } else if size_bytes < 1024 * 1024 {
        format!("{:.1} KB", size_bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", size_bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Per-profile entry of the result descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VariantReport {
    Ready {
        profile: QualityProfile,
        filename: String,
        size: u64,
        size_formatted: String,
        compression_ratio: f64,
        download_reference: String,
    },
    Failed {
        profile: QualityProfile,
        error: String,
    },
}

impl VariantReport {
    pub fn profile(&self) -> QualityProfile {
        match self {
            VariantReport::Ready { profile, .. } => *profile,
            VariantReport::Failed { profile, .. } => *profile,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, VariantReport::Ready { .. })
    }
}

/// What the caller receives once orchestration finishes: one report per
/// profile plus the identity of the task that owns the artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub task_id: Uuid,
    pub status: TaskStatus,
    pub original_filename: String,
    pub original_size: u64,
    pub original_size_formatted: String,
    pub created_at: DateTime<Utc>,
    pub variants: Vec<VariantReport>,
}
