//! Archive domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the two time buckets receipts are filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// The current fortnight's receipts.
    Recent,
    /// The previous fortnight's receipts.
    Older,
}

impl Bucket {
    /// Directory name under the archive base, as the payroll export names it.
    pub fn remote_dir(self) -> &'static str {
        match self {
            Bucket::Recent => "recientes",
            Bucket::Older => "anteriores",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Recent => "recent",
            Bucket::Older => "older",
        }
    }

    pub const ALL: [Bucket; 2] = [Bucket::Recent, Bucket::Older];
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A receipt file in one bucket, with whatever metadata the listing gave us.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptDocument {
    pub bucket: Bucket,
    pub filename: String,
    /// National id recovered from the filename, when one could be resolved.
    pub owner_id: Option<String>,
    pub size: Option<u64>,
    pub modified: Option<DateTime<Utc>>,
}
