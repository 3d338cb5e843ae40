//! Blame verdict DTOs.
//!
//! A verdict is tied 1:1 to a Judgment; recomputing replaces the previous
//! message. The image URL is attached later by a separate request.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tone of the generated blame message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Mild,
    #[default]
    Medium,
    Spicy,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Mild => "mild",
            Intensity::Medium => "medium",
            Intensity::Spicy => "spicy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mild" => Some(Intensity::Mild),
            "medium" => Some(Intensity::Medium),
            "spicy" => Some(Intensity::Spicy),
            _ => None,
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlameCreate {
    #[serde(default)]
    pub intensity: Intensity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlameVerdict {
    pub judgment_id: String,
    pub target_username: String,
    pub target_avatar: Option<String>,
    pub responsibility: u8,
    pub reason: String,
    pub message: String,
    pub intensity: Intensity,
    pub image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResponse {
    pub image_url: String,
}
