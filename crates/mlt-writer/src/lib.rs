//! otmlt MLT Writer
//!
//! Compiles an editorial timeline into an MLT XML document. The timeline
//! model is richer than MLT's entity set, so the compiler synthesizes what
//! has no direct counterpart: speed-adjusted and frozen producers,
//! per-transition sub-tractors, and background tracks.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                compile_document               │
//! │  ┌─────────────────────────────────────────┐  │
//! │  │      track / stack compilation          │  │
//! │  │  ┌────────────┐ ┌──────────┐ ┌───────┐  │  │
//! │  │  │ transition │ │ effects  │ │ media │  │  │
//! │  │  └─────┬──────┘ └────┬─────┘ └───┬───┘  │  │
//! │  └────────┼─────────────┼───────────┼──────┘  │
//! │           ▼             ▼           ▼         │
//! │  ┌─────────────────────────────────────────┐  │
//! │  │   ProducerRegistry (one per document)   │  │
//! │  └─────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! The write direction is the only one: reading MLT back always fails with
//! [`OtmltError::UnsupportedOperation`].

mod context;
mod effects;
mod track;
mod transition;

pub mod document;
pub mod media;
pub mod options;
pub mod properties;
pub mod registry;

use std::path::Path;

use otmlt_common::error::{OtmltError, OtmltResult};
use otmlt_timeline::{Item, Track};

pub use context::{CompileWarning, DEFAULT_RATE, SOLID_BLACK};
pub use document::*;
pub use options::*;
pub use properties::{format_float, stringify, PropertyMap, PropertyValue};
pub use registry::{MediaDescriptor, ProducerEntity, ProducerRegistry};

use context::CompileContext;
use track::{assemble_lanes, compile_lanes, compile_track};

/// Name the adapter is registered under.
pub const FORMAT_NAME: &str = "mlt_xml";

/// Id of the top-level tractor.
pub const MAIN_TRACTOR: &str = "tractor0";

/// Id of the main background playlist.
pub const BACKGROUND: &str = "background";

/// A compiled document plus the non-fatal conditions met on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    pub document: Document,
    pub warnings: Vec<CompileWarning>,
}

/// Compile `root` into a [`Document`].
///
/// `root` must be a timeline, a track, or a clip. A clip is wrapped in an
/// unnamed track first.
pub fn compile_document(root: &Item, options: &CompileOptions) -> OtmltResult<Compilation> {
    let rate = root.first_rate().unwrap_or(DEFAULT_RATE);
    let span = tracing::info_span!("compile", root = %root.kind(), rate);
    let _guard = span.enter();

    let mut ctx = CompileContext::new(options, rate);
    let main = ctx.registry.ids_mut().claim_preferred(MAIN_TRACTOR, "tractor");
    let background = ctx.registry.ids_mut().claim_preferred(BACKGROUND, "background");

    let lanes = match root {
        Item::Timeline(timeline) => {
            compile_lanes(&mut ctx, &timeline.tracks.name, &timeline.tracks.children)?
        }
        Item::Track(track) => vec![compile_track(&mut ctx, track)?],
        Item::Clip(clip) => {
            let mut wrapper = Track::default();
            wrapper.push(clip.clone());
            vec![compile_track(&mut ctx, &wrapper)?]
        }
        Item::Stack(_) | Item::Gap(_) | Item::Transition(_) => {
            return Err(OtmltError::invalid_root(root.kind().to_string()));
        }
    };

    let main = assemble_lanes(&mut ctx, main, background, &lanes);
    let CompileContext {
        registry,
        blocks,
        warnings,
        ..
    } = ctx;

    let document = Document {
        title: Some(root.name().to_string()).filter(|n| !n.is_empty()),
        profile: Profile::new(options, rate),
        producers: registry.into_producers(),
        blocks,
        main,
    };
    tracing::info!(
        producers = document.producers.len(),
        blocks = document.blocks.len(),
        lanes = lanes.len(),
        duration = document.main.out_point + 1,
        warnings = warnings.len(),
        "Compiled MLT document"
    );

    Ok(Compilation { document, warnings })
}

/// Compile `root` straight to MLT XML text.
pub fn compile(root: &Item, options: &CompileOptions) -> OtmltResult<String> {
    compile_document(root, options)?.document.to_xml()
}

/// Reading MLT back is not supported; always fails.
pub fn read_from_string(input: &str) -> OtmltResult<Item> {
    MltXmlAdapter::default().read_from_string(input)
}

/// Reading MLT back is not supported; always fails.
pub fn read_from_file(path: impl AsRef<Path>) -> OtmltResult<Item> {
    MltXmlAdapter::default().read_from_file(path.as_ref())
}

/// An interchange format adapter.
///
/// Read methods default to the fixed unsupported-operation error.
pub trait Adapter {
    /// Registered format name.
    fn name(&self) -> &str;

    fn write_to_string(&self, root: &Item) -> OtmltResult<String>;

    fn read_from_string(&self, _input: &str) -> OtmltResult<Item> {
        Err(OtmltError::unsupported_operation(self.name(), "read_from_string"))
    }

    fn read_from_file(&self, _path: &Path) -> OtmltResult<Item> {
        Err(OtmltError::unsupported_operation(self.name(), "read_from_file"))
    }
}

/// MLT XML writer.
#[derive(Debug, Clone, Default)]
pub struct MltXmlAdapter {
    options: CompileOptions,
}

impl MltXmlAdapter {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }
}

impl Adapter for MltXmlAdapter {
    fn name(&self) -> &str {
        FORMAT_NAME
    }

    fn write_to_string(&self, root: &Item) -> OtmltResult<String> {
        compile(root, &self.options)
    }
}
