//! Job fair lifecycle status.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Status values stored in `job_fairs.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobFairStatus {
    Upcoming,
    Ongoing,
    Ended,
}

impl JobFairStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobFairStatus::Upcoming => "upcoming",
            JobFairStatus::Ongoing => "ongoing",
            JobFairStatus::Ended => "ended",
        }
    }
}

impl fmt::Display for JobFairStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobFairStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(JobFairStatus::Upcoming),
            "ongoing" => Ok(JobFairStatus::Ongoing),
            "ended" => Ok(JobFairStatus::Ended),
            other => Err(CoreError::Validation(format!("Unknown job fair status: {other}"))),
        }
    }
}

impl TryFrom<String> for JobFairStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
