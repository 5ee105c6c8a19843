//! Media references attached to clips.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::time::TimeRange;

/// Where a clip's material comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaReference {
    /// Placeholder for media that could not be located.
    Missing {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        available_range: Option<TimeRange>,
    },

    /// A single file or URL.
    External {
        target_url: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        available_range: Option<TimeRange>,
    },

    /// Synthesized material such as color bars or a solid color.
    Generator {
        #[serde(default)]
        name: Option<String>,
        /// Kind of generator (e.g., "SMPTEBars", "SolidColor").
        generator_kind: String,
        #[serde(default)]
        available_range: Option<TimeRange>,
        #[serde(default)]
        parameters: BTreeMap<String, serde_json::Value>,
    },

    /// Numbered still frames that play back as one stream.
    ImageSequence(ImageSequenceReference),
}

/// A numbered run of image files: `<base><prefix><frame><suffix>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSequenceReference {
    pub target_url_base: String,
    pub name_prefix: String,
    pub name_suffix: String,
    pub start_frame: i64,
    #[serde(default = "default_frame_step")]
    pub frame_step: i64,
    pub rate: f64,
    /// Digits the frame number is padded to (0 = no padding).
    #[serde(default)]
    pub frame_zero_padding: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub available_range: Option<TimeRange>,
}

fn default_frame_step() -> i64 {
    1
}

impl MediaReference {
    pub fn external(target_url: impl Into<String>) -> Self {
        Self::External {
            target_url: target_url.into(),
            name: None,
            available_range: None,
        }
    }

    pub fn external_with_range(target_url: impl Into<String>, available_range: TimeRange) -> Self {
        Self::External {
            target_url: target_url.into(),
            name: None,
            available_range: Some(available_range),
        }
    }

    pub fn generator(name: impl Into<String>, generator_kind: impl Into<String>) -> Self {
        Self::Generator {
            name: Some(name.into()),
            generator_kind: generator_kind.into(),
            available_range: None,
            parameters: BTreeMap::new(),
        }
    }

    /// The range of media the reference can supply, if known.
    pub fn available_range(&self) -> Option<&TimeRange> {
        match self {
            Self::Missing {
                available_range, ..
            }
            | Self::External {
                available_range, ..
            }
            | Self::Generator {
                available_range, ..
            } => available_range.as_ref(),
            Self::ImageSequence(seq) => seq.available_range.as_ref(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Missing { name, .. }
            | Self::External { name, .. }
            | Self::Generator { name, .. } => name.as_deref(),
            Self::ImageSequence(seq) => seq.name.as_deref(),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }

    pub fn with_available_range(mut self, range: TimeRange) -> Self {
        match &mut self {
            Self::Missing {
                available_range, ..
            }
            | Self::External {
                available_range, ..
            }
            | Self::Generator {
                available_range, ..
            } => *available_range = Some(range),
            Self::ImageSequence(seq) => seq.available_range = Some(range),
        }
        self
    }
}
