//! Track and stack compilation.
//!
//! A track becomes one playlist. A stack becomes one addressable entity:
//! its single lane's playlist, or a composite binding all of its lanes
//! over a background. Composites that merge lanes share one layout with
//! the main program (see [`assemble_lanes`]).

use otmlt_common::error::OtmltResult;
use otmlt_timeline::{Item, Stack, TimeRange, Track, TrackKind, Transition};

use crate::context::{CompileContext, CompileWarning};
use crate::document::{
    Block, BlendOperator, CompositeEntity, CompositeLayout, PlaylistEntity, PlaylistItem,
    TrackBinding,
};
use crate::effects::{compile_clip, ClipPlacement};
use crate::properties::PropertyMap;
use crate::transition::{compile_transition, Neighbor};

/// A compiled lane: the id to bind plus its length in frames.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CompiledLane {
    pub id: String,
    pub duration: i64,
    pub kind: TrackKind,
}

/// Intermediate form of one track child.
enum Slot<'a> {
    Clip(ClipPlacement),
    Nested {
        id: String,
        in_point: i64,
        out_point: i64,
    },
    Blank {
        length: i64,
    },
    Transition(&'a Transition),
    Composite {
        id: String,
        length: i64,
    },
}

impl Slot<'_> {
    fn neighbor(&self) -> Neighbor {
        match self {
            Slot::Clip(ClipPlacement {
                name,
                media,
                in_point: Some(in_point),
                out_point: Some(out_point),
                ..
            }) => Neighbor::Media {
                name: name.clone(),
                media: media.clone(),
                start: *in_point,
                end: out_point + 1,
            },
            Slot::Nested {
                id,
                in_point,
                out_point,
            } => Neighbor::Nested {
                id: id.clone(),
                start: *in_point,
                end: out_point + 1,
            },
            _ => Neighbor::Placeholder,
        }
    }

    /// Frames a transition may take from this slot; `None` when there is
    /// nothing to take from, as with another transition.
    fn available(&self) -> Option<i64> {
        match self {
            Slot::Clip(ClipPlacement {
                in_point: Some(in_point),
                out_point: Some(out_point),
                ..
            })
            | Slot::Nested {
                in_point,
                out_point,
                ..
            } => Some((out_point - in_point + 1).max(0)),
            // unbounded clips account for no frames
            Slot::Clip(_) => Some(0),
            Slot::Blank { length } => Some((*length).max(0)),
            Slot::Transition(_) | Slot::Composite { .. } => None,
        }
    }

    fn trim_tail(&mut self, frames: i64) {
        match self {
            Slot::Clip(ClipPlacement {
                out_point: Some(out_point),
                ..
            })
            | Slot::Nested { out_point, .. } => *out_point -= frames,
            Slot::Blank { length } => *length -= frames,
            _ => {}
        }
    }

    fn trim_head(&mut self, frames: i64) {
        match self {
            Slot::Clip(ClipPlacement {
                in_point: Some(in_point),
                ..
            })
            | Slot::Nested { in_point, .. } => *in_point += frames,
            Slot::Blank { length } => *length -= frames,
            _ => {}
        }
    }

    /// Playlist item for this slot; `None` once it has been trimmed away.
    fn into_item(self) -> Option<PlaylistItem> {
        match self {
            Slot::Clip(placement) => match (placement.in_point, placement.out_point) {
                (Some(i), Some(o)) if o < i => None,
                (in_point, out_point) => Some(PlaylistItem::Entry {
                    producer: placement.producer,
                    in_point,
                    out_point,
                }),
            },
            Slot::Nested {
                id,
                in_point,
                out_point,
            } => (out_point >= in_point).then(|| PlaylistItem::entry(id, in_point, out_point)),
            Slot::Blank { length } => (length > 0).then_some(PlaylistItem::Blank { length }),
            Slot::Composite { id, length } => (length > 0).then_some(PlaylistItem::Transition {
                composite: id,
                length,
            }),
            Slot::Transition(_) => None,
        }
    }
}

/// Compile a track into its own playlist.
pub(crate) fn compile_track(
    ctx: &mut CompileContext<'_>,
    track: &Track,
) -> OtmltResult<CompiledLane> {
    let id = ctx.registry.ids_mut().claim_preferred(&track.name, "playlist");
    compile_sequence(ctx, id, track.kind, &track.children)
}

/// Compile a stack into one addressable entity.
pub(crate) fn compile_stack(
    ctx: &mut CompileContext<'_>,
    stack: &Stack,
) -> OtmltResult<CompiledLane> {
    let lane_count = count_lanes(&stack.children);
    if lane_count <= 1 {
        let mut lanes = compile_lanes(ctx, &stack.name, &stack.children)?;
        return match lanes.pop() {
            Some(lane) => Ok(lane),
            None => {
                let id = ctx.registry.ids_mut().claim_preferred(&stack.name, "playlist");
                compile_sequence(ctx, id, TrackKind::Video, &[])
            }
        };
    }

    let id = ctx.registry.ids_mut().claim_preferred(&stack.name, "tractor");
    let background = ctx
        .registry
        .ids_mut()
        .claim_preferred(&format!("{id}_background"), "background");
    let lanes = compile_lanes(ctx, &stack.name, &stack.children)?;
    let composite = assemble_lanes(ctx, id, background, &lanes);
    let duration = composite.out_point + 1;
    let lane = CompiledLane {
        id: composite.id.clone(),
        duration,
        kind: TrackKind::Video,
    };
    tracing::debug!(
        stack = %stack.name,
        id = %lane.id,
        lanes = lanes.len(),
        "Compiled nested stack"
    );
    ctx.push_block(Block::Composite(composite));
    Ok(lane)
}

/// Compile the parallel children of a stack into lanes.
///
/// Tracks and stacks are lanes of their own. Anything else is gathered, in
/// order, into one implicit lane placed where the first such child sits.
pub(crate) fn compile_lanes(
    ctx: &mut CompileContext<'_>,
    name: &str,
    children: &[Item],
) -> OtmltResult<Vec<CompiledLane>> {
    let loose: Vec<Item> = children
        .iter()
        .filter(|c| !is_lane(c))
        .cloned()
        .collect();
    let implicit_name = if count_lanes(children) == 1 {
        name.to_string()
    } else {
        format!("{name}_lane")
    };

    let mut lanes = Vec::new();
    let mut implicit_done = false;
    for child in children {
        match child {
            Item::Track(track) => lanes.push(compile_track(ctx, track)?),
            Item::Stack(stack) => lanes.push(compile_stack(ctx, stack)?),
            Item::Timeline(timeline) => {
                lanes.push(compile_stack(ctx, &timeline_stack(timeline))?)
            }
            _ if !implicit_done => {
                implicit_done = true;
                let id = ctx.registry.ids_mut().claim_preferred(&implicit_name, "playlist");
                lanes.push(compile_sequence(ctx, id, TrackKind::Video, &loose)?);
            }
            _ => {}
        }
    }
    Ok(lanes)
}

/// Build a composite binding `lanes` over a background playlist.
///
/// Lane order is background, audio lanes last-to-first, then video lanes
/// first-to-last. Every lane after the background is blended onto it.
pub(crate) fn assemble_lanes(
    ctx: &mut CompileContext<'_>,
    id: String,
    background: String,
    lanes: &[CompiledLane],
) -> CompositeEntity {
    let duration = lanes.iter().map(|l| l.duration).max().unwrap_or(0);

    let solid_black = ctx.solid_black();
    let mut items = Vec::new();
    if duration > 0 {
        items.push(PlaylistItem::entry(solid_black, 0, duration - 1));
    }
    ctx.push_block(Block::Playlist(PlaylistEntity {
        id: background.clone(),
        items,
    }));

    let ordered: Vec<&CompiledLane> = lanes
        .iter()
        .filter(|l| l.kind == TrackKind::Audio)
        .rev()
        .chain(lanes.iter().filter(|l| l.kind != TrackKind::Audio))
        .collect();

    let mut tracks = vec![TrackBinding::whole(background)];
    let mut blends = Vec::new();
    for (index, lane) in ordered.into_iter().enumerate() {
        tracks.push(TrackBinding::whole(lane.id.clone()));
        blends.push(lane_blend(lane.kind, index + 1));
    }

    CompositeEntity {
        id,
        out_point: (duration - 1).max(0),
        layout: CompositeLayout::Multitrack,
        tracks,
        blends,
    }
}

fn lane_blend(kind: TrackKind, b_track: usize) -> BlendOperator {
    let mut properties = PropertyMap::new();
    let service = match kind {
        TrackKind::Audio => {
            properties.insert("sum".to_string(), 1i64.into());
            properties.insert("always_active".to_string(), 1i64.into());
            "mix"
        }
        TrackKind::Video => {
            properties.insert("always_active".to_string(), 1i64.into());
            "frei0r.cairoblend"
        }
    };
    BlendOperator {
        service: service.to_string(),
        a_track: 0,
        b_track,
        in_point: None,
        out_point: None,
        properties,
    }
}

fn compile_sequence(
    ctx: &mut CompileContext<'_>,
    id: String,
    kind: TrackKind,
    children: &[Item],
) -> OtmltResult<CompiledLane> {
    let mut slots = Vec::with_capacity(children.len());
    for child in children {
        let slot = match child {
            Item::Clip(clip) => Slot::Clip(compile_clip(ctx, clip)?),
            Item::Gap(gap) => Slot::Blank {
                length: ctx.frames(&gap.source_range.duration),
            },
            Item::Transition(transition) => Slot::Transition(transition),
            Item::Stack(stack) => {
                let lane = compile_stack(ctx, stack)?;
                nested_slot(ctx, lane, stack.source_range.as_ref())
            }
            Item::Track(track) => {
                let lane = compile_track(ctx, track)?;
                nested_slot(ctx, lane, track.source_range.as_ref())
            }
            Item::Timeline(timeline) => {
                let lane = compile_stack(ctx, &timeline_stack(timeline))?;
                nested_slot(ctx, lane, None)
            }
        };
        slots.push(slot);
    }

    splice_transitions(ctx, &id, kind, &mut slots);

    let playlist = PlaylistEntity {
        id,
        items: slots.into_iter().filter_map(Slot::into_item).collect(),
    };
    let lane = CompiledLane {
        id: playlist.id.clone(),
        duration: playlist.duration(),
        kind,
    };
    tracing::debug!(
        playlist = %lane.id,
        items = playlist.items.len(),
        duration = lane.duration,
        "Compiled playlist"
    );
    ctx.push_block(Block::Playlist(playlist));
    Ok(lane)
}

/// Replace every transition slot with its composite, trimming the
/// neighbours by the frames the composite covers.
///
/// A neighbour never gives more frames than it holds, so the lane keeps
/// the length of its items.
fn splice_transitions(
    ctx: &mut CompileContext<'_>,
    track: &str,
    kind: TrackKind,
    slots: &mut [Slot<'_>],
) {
    for index in 0..slots.len() {
        let Slot::Transition(transition) = slots[index] else {
            continue;
        };
        let before = index.checked_sub(1);
        let left = before
            .map(|i| slots[i].neighbor())
            .unwrap_or(Neighbor::Placeholder);
        let right = slots
            .get(index + 1)
            .map(Slot::neighbor)
            .unwrap_or(Neighbor::Placeholder);

        let requested_in = ctx.frames(&transition.in_offset);
        let requested_out = ctx.frames(&transition.out_offset);
        let left_available = before.and_then(|i| slots[i].available());
        let right_available = slots.get(index + 1).and_then(Slot::available);
        let in_frames = fit(ctx, track, transition, requested_in, left_available);
        let out_frames = fit(ctx, track, transition, requested_out, right_available);

        if in_frames + out_frames <= 0 {
            tracing::debug!(
                track,
                transition = %transition.name,
                "Transition covers no frames; dropped"
            );
            slots[index] = Slot::Blank { length: 0 };
            continue;
        }

        let compiled = compile_transition(
            ctx,
            track,
            kind,
            transition,
            (in_frames, out_frames),
            &left,
            &right,
        );
        if let Some(previous) = before.and_then(|i| slots.get_mut(i)) {
            previous.trim_tail(compiled.in_frames);
        }
        if let Some(next) = slots.get_mut(index + 1) {
            next.trim_head(compiled.out_frames);
        }
        slots[index] = Slot::Composite {
            id: compiled.composite,
            length: compiled.length,
        };
    }
}

/// Frames taken from one neighbour: `requested`, or all the neighbour has
/// when that is less.
fn fit(
    ctx: &mut CompileContext<'_>,
    track: &str,
    transition: &Transition,
    requested: i64,
    available: Option<i64>,
) -> i64 {
    match available {
        Some(available) if available < requested => {
            ctx.warn(CompileWarning::InsufficientMedia {
                track: track.to_string(),
                transition: transition.name.clone(),
                requested,
                available,
            });
            available
        }
        _ => requested,
    }
}

fn nested_slot<'a>(
    ctx: &CompileContext<'_>,
    lane: CompiledLane,
    range: Option<&TimeRange>,
) -> Slot<'a> {
    let (in_point, duration) = match range {
        Some(r) => (ctx.frames(&r.start_time), ctx.frames(&r.duration)),
        None => (0, lane.duration),
    };
    Slot::Nested {
        id: lane.id,
        in_point,
        out_point: in_point + duration - 1,
    }
}

fn timeline_stack(timeline: &otmlt_timeline::Timeline) -> Stack {
    let mut stack = timeline.tracks.clone();
    if !timeline.name.is_empty() {
        stack.name = timeline.name.clone();
    }
    stack
}

fn is_lane(item: &Item) -> bool {
    matches!(item, Item::Track(_) | Item::Stack(_) | Item::Timeline(_))
}

fn count_lanes(children: &[Item]) -> usize {
    let explicit = children.iter().filter(|c| is_lane(c)).count();
    let implicit = usize::from(children.iter().any(|c| !is_lane(c)));
    explicit + implicit
}
