//! Timeline item types.
//!
//! The model mirrors the shape of an editorial timeline: a [`Timeline`] owns
//! a [`Stack`] of parallel lanes, lanes are [`Track`]s (or nested stacks),
//! and tracks hold clips, gaps, transitions, and further stacks in playback
//! order.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::effect::Effect;
use crate::media::MediaReference;
use crate::time::{RationalTime, TimeRange};

/// Any node of the source object graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Item {
    Timeline(Timeline),
    Stack(Stack),
    Track(Track),
    Clip(Clip),
    Gap(Gap),
    Transition(Transition),
}

/// Kind tag of an [`Item`], used in diagnostics and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Timeline,
    Stack,
    Track,
    Clip,
    Gap,
    Transition,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Timeline => "Timeline",
            Self::Stack => "Stack",
            Self::Track => "Track",
            Self::Clip => "Clip",
            Self::Gap => "Gap",
            Self::Transition => "Transition",
        };
        f.write_str(label)
    }
}

/// Media kind carried by a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    #[default]
    Video,
    Audio,
}

/// Top-level editorial container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub global_start_time: Option<RationalTime>,

    /// Parallel lanes, bottom lane first.
    #[serde(default)]
    pub tracks: Stack,
}

/// Parallel composition of its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Stack {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub source_range: Option<TimeRange>,

    #[serde(default)]
    pub children: Vec<Item>,
}

/// Sequential composition of its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Track {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub kind: TrackKind,

    #[serde(default)]
    pub source_range: Option<TimeRange>,

    #[serde(default)]
    pub children: Vec<Item>,
}

/// A piece of media placed on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub name: String,

    #[serde(default)]
    pub source_range: Option<TimeRange>,

    #[serde(default)]
    pub media_reference: Option<MediaReference>,

    #[serde(default)]
    pub effects: Vec<Effect>,
}

/// Empty space on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    #[serde(default)]
    pub name: String,

    pub source_range: TimeRange,
}

/// A blend between the items on either side of it.
///
/// `in_offset` reaches back into the preceding item, `out_offset` forward
/// into the following one. The transition itself takes no track time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub transition_type: Option<String>,

    pub in_offset: RationalTime,

    pub out_offset: RationalTime,
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Timeline(_) => ItemKind::Timeline,
            Self::Stack(_) => ItemKind::Stack,
            Self::Track(_) => ItemKind::Track,
            Self::Clip(_) => ItemKind::Clip,
            Self::Gap(_) => ItemKind::Gap,
            Self::Transition(_) => ItemKind::Transition,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Timeline(t) => &t.name,
            Self::Stack(s) => &s.name,
            Self::Track(t) => &t.name,
            Self::Clip(c) => &c.name,
            Self::Gap(g) => &g.name,
            Self::Transition(t) => &t.name,
        }
    }

    /// Rate of the first time value found in a depth-first walk.
    pub fn first_rate(&self) -> Option<f64> {
        let own = match self {
            Self::Timeline(t) => t.global_start_time.map(|t| t.rate),
            Self::Stack(s) => s.source_range.map(|r| r.start_time.rate),
            Self::Track(t) => t.source_range.map(|r| r.start_time.rate),
            Self::Clip(c) => c.trimmed_range().map(|r| r.start_time.rate),
            Self::Gap(g) => Some(g.source_range.start_time.rate),
            Self::Transition(t) => Some(t.in_offset.rate),
        };
        if let Some(rate) = own.filter(|r| *r > 0.0) {
            return Some(rate);
        }
        match self {
            Self::Timeline(t) => t.tracks.children.iter().find_map(Item::first_rate),
            Self::Stack(s) => s.children.iter().find_map(Item::first_rate),
            Self::Track(t) => t.children.iter().find_map(Item::first_rate),
            _ => None,
        }
    }
}

impl From<Timeline> for Item {
    fn from(value: Timeline) -> Self {
        Self::Timeline(value)
    }
}

impl From<Stack> for Item {
    fn from(value: Stack) -> Self {
        Self::Stack(value)
    }
}

impl From<Track> for Item {
    fn from(value: Track) -> Self {
        Self::Track(value)
    }
}

impl From<Clip> for Item {
    fn from(value: Clip) -> Self {
        Self::Clip(value)
    }
}

impl From<Gap> for Item {
    fn from(value: Gap) -> Self {
        Self::Gap(value)
    }
}

impl From<Transition> for Item {
    fn from(value: Transition) -> Self {
        Self::Transition(value)
    }
}

impl Timeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            global_start_time: None,
            tracks: Stack::new("tracks"),
        }
    }

    /// Append a lane on top of the existing ones.
    pub fn push_track(&mut self, track: impl Into<Item>) {
        self.tracks.children.push(track.into());
    }
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, item: impl Into<Item>) {
        self.children.push(item.into());
    }
}

impl Track {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn audio(name: impl Into<String>) -> Self {
        Self {
            kind: TrackKind::Audio,
            ..Self::new(name)
        }
    }

    pub fn with_kind(mut self, kind: TrackKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn push(&mut self, item: impl Into<Item>) {
        self.children.push(item.into());
    }
}

impl Clip {
    pub fn new(name: impl Into<String>, source_range: TimeRange) -> Self {
        Self {
            name: name.into(),
            source_range: Some(source_range),
            media_reference: None,
            effects: Vec::new(),
        }
    }

    pub fn with_media(mut self, media_reference: MediaReference) -> Self {
        self.media_reference = Some(media_reference);
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// The media reference, ignoring placeholders for missing media.
    pub fn media(&self) -> Option<&MediaReference> {
        self.media_reference.as_ref().filter(|m| !m.is_missing())
    }

    /// The portion of media the clip plays: its own source range, or the
    /// whole available range of its media when it has none.
    pub fn trimmed_range(&self) -> Option<TimeRange> {
        self.source_range.or_else(|| {
            self.media_reference
                .as_ref()
                .and_then(|m| m.available_range().copied())
        })
    }
}

impl Gap {
    pub fn new(name: impl Into<String>, source_range: TimeRange) -> Self {
        Self {
            name: name.into(),
            source_range,
        }
    }

    pub fn with_duration(duration: RationalTime) -> Self {
        Self::new(
            "",
            TimeRange::new(RationalTime::new(0.0, duration.rate), duration),
        )
    }
}

impl Transition {
    pub fn new(name: impl Into<String>, in_offset: RationalTime, out_offset: RationalTime) -> Self {
        Self {
            name: name.into(),
            transition_type: None,
            in_offset,
            out_offset,
        }
    }
}
