//! Effects attached to clips.

use serde::{Deserialize, Serialize};

/// Discriminated union of effect types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Constant playback speed change. Negative scalars play in reverse.
    LinearTimeWarp {
        #[serde(default)]
        name: Option<String>,
        time_scalar: f64,
    },

    /// Holds the first frame of the clip for its whole duration.
    FreezeFrame {
        #[serde(default)]
        name: Option<String>,
    },

    /// Any effect the model does not interpret.
    Other {
        #[serde(default)]
        name: Option<String>,
        effect_name: String,
    },
}

impl Effect {
    pub fn time_warp(time_scalar: f64) -> Self {
        Self::LinearTimeWarp {
            name: None,
            time_scalar,
        }
    }

    pub fn freeze_frame() -> Self {
        Self::FreezeFrame { name: None }
    }

    pub fn other(effect_name: impl Into<String>) -> Self {
        Self::Other {
            name: None,
            effect_name: effect_name.into(),
        }
    }

    /// Human-readable label used in diagnostics.
    pub fn label(&self) -> &str {
        match self {
            Self::LinearTimeWarp { name, .. } => name.as_deref().unwrap_or("LinearTimeWarp"),
            Self::FreezeFrame { name } => name.as_deref().unwrap_or("FreezeFrame"),
            Self::Other { name, effect_name } => name.as_deref().unwrap_or(effect_name),
        }
    }
}
