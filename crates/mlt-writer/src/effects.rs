//! Clip compilation: base producer plus time-warp and freeze-frame
//! derivatives.

use otmlt_common::error::OtmltResult;
use otmlt_timeline::{Clip, Effect};

use crate::context::{CompileContext, CompileWarning};
use crate::media::resolve_media;
use crate::properties::format_float;
use crate::registry::MediaDescriptor;

/// Where a clip lands once media and effects are resolved.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClipPlacement {
    /// Producer the playlist entry references.
    pub producer: String,

    /// Display name of the clip's base producer.
    pub name: String,

    /// Media of the referenced producer.
    pub media: MediaDescriptor,

    pub in_point: Option<i64>,
    pub out_point: Option<i64>,
}

/// Playback change picked from a clip's effect list.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Retime {
    Warp(f64),
    Freeze,
}

/// Register the producers a clip needs and compute its entry bounds.
pub(crate) fn compile_clip(
    ctx: &mut CompileContext<'_>,
    clip: &Clip,
) -> OtmltResult<ClipPlacement> {
    let media = resolve_media(clip, ctx.options, ctx.rate)?;
    let base_id = ctx.registry.resolve(&media.name, media.descriptor.clone());

    let range = clip.trimmed_range();
    if range.is_none() {
        ctx.warn(CompileWarning::UnboundedClip {
            clip: clip.name.clone(),
        });
    }
    let start = range.map(|r| ctx.frames(&r.start_time));
    let duration = range.map(|r| ctx.frames(&r.duration));

    let placement = match pick_retime(ctx, clip) {
        None => ClipPlacement {
            producer: base_id,
            name: media.name,
            media: media.descriptor,
            in_point: start,
            out_point: start.zip(duration).map(|(s, d)| s + d - 1),
        },
        Some(Retime::Warp(scalar)) => {
            let label = format_float(scalar);
            let resource = &media.descriptor.resource;
            let mut warped = MediaDescriptor::new(format!("{label}:{resource}"))
                .with_service("timewarp")
                .with_property("warp_speed", scalar)
                .with_property("warp_resource", resource.clone());
            if let Some(d) = duration {
                let warped_length = (d as f64 / scalar.abs()).floor() as i64;
                warped = warped.with_bounds(0, warped_length - 1);
            }
            let producer = ctx
                .registry
                .resolve(&format!("{label}:{}", media.name), warped.clone());
            tracing::debug!(clip = %clip.name, producer = %producer, "Time-warped clip");

            let in_point = start.map(|s| (s as f64 / scalar.abs()).round() as i64);
            ClipPlacement {
                producer,
                name: media.name,
                media: warped,
                in_point,
                out_point: in_point.zip(duration).map(|(i, d)| i + d - 1),
            }
        }
        Some(Retime::Freeze) => {
            let held = start.unwrap_or(0);
            let start_value = range.map(|r| r.start_time.value).unwrap_or(0.0);
            let mut hold = MediaDescriptor::new(media.descriptor.resource.clone())
                .with_service("hold")
                .with_property("frame", held);
            if let Some(d) = duration {
                hold = hold.with_bounds(0, d - 1);
            }
            let producer = ctx.registry.resolve(
                &format!("{}_freeze{}", media.name, format_float(start_value)),
                hold.clone(),
            );
            tracing::debug!(
                clip = %clip.name,
                producer = %producer,
                frame = held,
                "Frozen clip"
            );

            ClipPlacement {
                producer,
                name: media.name,
                media: hold,
                in_point: duration.map(|_| 0),
                out_point: duration.map(|d| d - 1),
            }
        }
    };
    Ok(placement)
}

/// First effect that changes playback; later effects are not combined.
fn pick_retime(ctx: &mut CompileContext<'_>, clip: &Clip) -> Option<Retime> {
    for effect in &clip.effects {
        match effect {
            Effect::LinearTimeWarp { time_scalar, .. } => {
                return if *time_scalar == 0.0 {
                    Some(Retime::Freeze)
                } else if *time_scalar == 1.0 {
                    None
                } else {
                    Some(Retime::Warp(*time_scalar))
                };
            }
            Effect::FreezeFrame { .. } => return Some(Retime::Freeze),
            unrecognized @ Effect::Other { .. } => {
                ctx.warn(CompileWarning::UnrecognizedEffect {
                    clip: clip.name.clone(),
                    effect: unrecognized.label().to_string(),
                });
            }
        }
    }
    None
}
