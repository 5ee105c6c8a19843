//! Transition composites.
//!
//! A transition becomes a two-lane composite played from the owning track
//! in place of the frames it borrows from its neighbours: `in_offset` frames
//! from the tail of the item before it and `out_offset` frames from the head
//! of the item after it.

use otmlt_timeline::{TrackKind, Transition};

use crate::context::{CompileContext, CompileWarning};
use crate::document::{Block, BlendOperator, CompositeEntity, CompositeLayout, TrackBinding};
use crate::properties::PropertyMap;
use crate::registry::MediaDescriptor;

/// What sits on one side of a transition.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Neighbor {
    /// A clip with known bounds; `end` is exclusive.
    Media {
        name: String,
        media: MediaDescriptor,
        start: i64,
        end: i64,
    },

    /// A nested playlist or composite; `end` is exclusive.
    Nested { id: String, start: i64, end: i64 },

    /// Nothing usable: track boundary, gap, another transition.
    Placeholder,
}

/// Result of compiling one transition.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CompiledTransition {
    pub composite: String,

    /// Frames the composite occupies on the owning track.
    pub length: i64,

    /// Frames taken from the left neighbour's tail.
    pub in_frames: i64,

    /// Frames taken from the right neighbour's head.
    pub out_frames: i64,
}

/// Blend service for a track of `kind`.
pub(crate) fn blend_service(kind: TrackKind) -> &'static str {
    match kind {
        TrackKind::Audio => "mix",
        TrackKind::Video => "luma",
    }
}

/// Emit the composite for `transition` and return how it splices into the
/// owning track.
///
/// `frames` is the `(in, out)` split actually taken from the neighbours,
/// which is the transition's offsets unless a neighbour is too short.
pub(crate) fn compile_transition(
    ctx: &mut CompileContext<'_>,
    track: &str,
    kind: TrackKind,
    transition: &Transition,
    (in_frames, out_frames): (i64, i64),
    left: &Neighbor,
    right: &Neighbor,
) -> CompiledTransition {
    let length = in_frames + out_frames;
    let composite = ctx.registry.ids_mut().claim_numbered("transition_tractor");

    if matches!(left, Neighbor::Placeholder) && matches!(right, Neighbor::Placeholder) {
        ctx.warn(CompileWarning::DegenerateTransition {
            track: track.to_string(),
            transition: transition.name.clone(),
        });
    }

    let pre = match left {
        Neighbor::Media { name, media, end, .. } => {
            let producer = ctx
                .registry
                .resolve(&format!("{name}_transition_pre"), media.clone());
            TrackBinding::span(producer, end - in_frames, end + out_frames - 1)
        }
        Neighbor::Nested { id, end, .. } => {
            TrackBinding::span(id.clone(), end - in_frames, end + out_frames - 1)
        }
        Neighbor::Placeholder => TrackBinding::span(ctx.solid_black(), 0, length - 1),
    };
    // in may go negative when the right clip has no media before its start
    let post = match right {
        Neighbor::Media {
            name, media, start, ..
        } => {
            let producer = ctx
                .registry
                .resolve(&format!("{name}_transition_post"), media.clone());
            TrackBinding::span(producer, start - in_frames, start + out_frames - 1)
        }
        Neighbor::Nested { id, start, .. } => {
            TrackBinding::span(id.clone(), start - in_frames, start + out_frames - 1)
        }
        Neighbor::Placeholder => TrackBinding::span(ctx.solid_black(), 0, length - 1),
    };

    let service = blend_service(kind);
    let mut properties = PropertyMap::new();
    if kind == TrackKind::Audio {
        properties.insert("start".to_string(), 0.0.into());
        properties.insert("end".to_string(), 1.0.into());
    }

    tracing::debug!(
        track,
        composite = %composite,
        length,
        service,
        "Compiled transition"
    );

    ctx.push_block(Block::Composite(CompositeEntity {
        id: composite.clone(),
        out_point: length - 1,
        layout: CompositeLayout::Direct,
        tracks: vec![pre, post],
        blends: vec![BlendOperator {
            service: service.to_string(),
            a_track: 0,
            b_track: 1,
            in_point: Some(0),
            out_point: Some(length - 1),
            properties,
        }],
    }));

    CompiledTransition {
        composite,
        length,
        in_frames,
        out_frames,
    }
}
