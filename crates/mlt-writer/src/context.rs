//! State carried through one compilation.

use otmlt_timeline::RationalTime;

use crate::document::Block;
use crate::options::CompileOptions;
use crate::registry::{MediaDescriptor, ProducerRegistry};

/// Rate used when the root carries no time values at all.
pub const DEFAULT_RATE: f64 = 24.0;

/// Id of the shared solid black / silent producer.
pub const SOLID_BLACK: &str = "solid_black";

/// Non-fatal conditions met while compiling.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileWarning {
    #[error("transition '{transition}' on '{track}' has no usable neighbours")]
    DegenerateTransition { track: String, transition: String },

    #[error("transition '{transition}' on '{track}' wants {requested} frames, gets {available}")]
    InsufficientMedia {
        track: String,
        transition: String,
        requested: i64,
        available: i64,
    },

    #[error("effect '{effect}' on clip '{clip}' is not supported and was ignored")]
    UnrecognizedEffect { clip: String, effect: String },

    #[error("clip '{clip}' has neither a source range nor an available range")]
    UnboundedClip { clip: String },
}

/// Mutable state of a single compilation.
///
/// Owns the producer registry and the finished playlists/tractors in
/// dependency order. Created per document, never shared.
pub(crate) struct CompileContext<'a> {
    pub options: &'a CompileOptions,
    pub rate: f64,
    pub registry: ProducerRegistry,
    pub blocks: Vec<Block>,
    pub warnings: Vec<CompileWarning>,
}

impl<'a> CompileContext<'a> {
    pub fn new(options: &'a CompileOptions, rate: f64) -> Self {
        Self {
            options,
            rate,
            registry: ProducerRegistry::new(),
            blocks: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Whole frames at the document rate.
    pub fn frames(&self, time: &RationalTime) -> i64 {
        time.to_frames(self.rate)
    }

    pub fn warn(&mut self, warning: CompileWarning) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Producer used for backgrounds and missing transition members.
    pub fn solid_black(&mut self) -> String {
        self.registry.resolve(
            SOLID_BLACK,
            MediaDescriptor::new("black")
                .with_service("color")
                .with_property("set.test_audio", 0i64),
        )
    }

    pub fn push_block(&mut self, block: Block) {
        self.blocks.push(block);
    }
}
