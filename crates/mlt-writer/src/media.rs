//! Media resolution: turns a clip's media reference into a producer
//! descriptor.

use otmlt_common::error::OtmltResult;
use otmlt_timeline::{Clip, ImageSequenceReference, MediaReference, TimeRange};

use crate::options::{CompileOptions, ImageProducer};
use crate::registry::MediaDescriptor;

/// Display name and media descriptor of a clip's base producer.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMedia {
    pub name: String,
    pub descriptor: MediaDescriptor,
}

/// Resolve the producer a clip plays from.
///
/// - no reference: the clip name is the resource, no bounds
/// - external file: its URL; bounds cover the available range when known
/// - image sequence: a printf-style pattern for the configured service
/// - generator: the generator kind, nothing else is carried over
pub fn resolve_media(
    clip: &Clip,
    options: &CompileOptions,
    rate: f64,
) -> OtmltResult<ResolvedMedia> {
    let Some(reference) = clip.media() else {
        return Ok(ResolvedMedia {
            name: clip.name.clone(),
            descriptor: MediaDescriptor::new(clip.name.clone()),
        });
    };

    let resolved = match reference {
        MediaReference::External {
            target_url,
            available_range,
            ..
        } => ResolvedMedia {
            name: clip.name.clone(),
            descriptor: with_available_bounds(
                MediaDescriptor::new(target_url.clone()),
                available_range.as_ref(),
                rate,
            ),
        },
        MediaReference::ImageSequence(sequence) => {
            let producer = options.image_producer()?;
            let descriptor = MediaDescriptor::new(image_sequence_url(sequence, producer))
                .with_service(producer.service());
            ResolvedMedia {
                name: clip.name.clone(),
                descriptor: with_available_bounds(
                    descriptor,
                    sequence.available_range.as_ref(),
                    rate,
                ),
            }
        }
        MediaReference::Generator {
            name,
            generator_kind,
            ..
        } => ResolvedMedia {
            name: name
                .as_deref()
                .filter(|n| !n.is_empty())
                .unwrap_or(&clip.name)
                .to_string(),
            descriptor: MediaDescriptor::new(generator_kind.clone()),
        },
        MediaReference::Missing { .. } => ResolvedMedia {
            name: clip.name.clone(),
            descriptor: MediaDescriptor::new(clip.name.clone()),
        },
    };
    Ok(resolved)
}

/// `<base><prefix>%0<pad>d<suffix>?<start param>=<start frame>`
pub fn image_sequence_url(sequence: &ImageSequenceReference, producer: ImageProducer) -> String {
    let frame = if sequence.frame_zero_padding > 0 {
        format!("%0{}d", sequence.frame_zero_padding)
    } else {
        "%d".to_string()
    };
    format!(
        "{}{}{}{}?{}={}",
        sequence.target_url_base,
        sequence.name_prefix,
        frame,
        sequence.name_suffix,
        producer.start_parameter(),
        sequence.start_frame
    )
}

fn with_available_bounds(
    descriptor: MediaDescriptor,
    available_range: Option<&TimeRange>,
    rate: f64,
) -> MediaDescriptor {
    match available_range {
        Some(range) => descriptor.with_bounds(0, range.duration.to_frames(rate) - 1),
        None => descriptor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use otmlt_common::error::OtmltError;

    fn range(start: f64, duration: f64) -> TimeRange {
        TimeRange::from_frames(start, duration, 30.0)
    }

    fn sequence() -> ImageSequenceReference {
        ImageSequenceReference {
            target_url_base: "/path/to/files/".to_string(),
            name_prefix: "image.".to_string(),
            name_suffix: ".png".to_string(),
            start_frame: 1001,
            frame_step: 1,
            rate: 30.0,
            frame_zero_padding: 4,
            name: None,
            available_range: Some(range(0.0, 100.0)),
        }
    }

    #[test]
    fn test_no_reference_uses_clip_name() {
        let clip = Clip::new("clip2", range(0.0, 100.0));
        let resolved = resolve_media(&clip, &CompileOptions::default(), 30.0).unwrap();
        assert_eq!(resolved.name, "clip2");
        assert_eq!(resolved.descriptor.resource, "clip2");
        assert_eq!(resolved.descriptor.in_point, None);
        assert_eq!(resolved.descriptor.out_point, None);
    }

    #[test]
    fn test_external_reference_bounds_are_inclusive() {
        let clip = Clip::new("a", range(0.0, 100.0)).with_media(MediaReference::external_with_range(
            "/some/path/to/media_file.mov",
            range(0.0, 100.0),
        ));
        let resolved = resolve_media(&clip, &CompileOptions::default(), 30.0).unwrap();
        assert_eq!(resolved.descriptor.resource, "/some/path/to/media_file.mov");
        assert_eq!(resolved.descriptor.in_point, Some(0));
        assert_eq!(resolved.descriptor.out_point, Some(99));
        assert_eq!(resolved.descriptor.service, None);
    }

    #[test]
    fn test_available_range_at_other_rate_is_rescaled() {
        let available = TimeRange::from_frames(0.0, 48.0, 24.0);
        let clip = Clip::new("a", range(0.0, 10.0))
            .with_media(MediaReference::external_with_range("/a.mov", available));
        let resolved = resolve_media(&clip, &CompileOptions::default(), 30.0).unwrap();
        assert_eq!(resolved.descriptor.out_point, Some(59));
    }

    #[test]
    fn test_external_without_range_has_no_bounds() {
        let clip = Clip::new("a", range(0.0, 100.0)).with_media(MediaReference::external("/a.mov"));
        let resolved = resolve_media(&clip, &CompileOptions::default(), 30.0).unwrap();
        assert_eq!(resolved.descriptor.resource, "/a.mov");
        assert_eq!(resolved.descriptor.in_point, None);
        assert_eq!(resolved.descriptor.out_point, None);
    }

    #[test]
    fn test_image_sequence_url_per_service() {
        assert_eq!(
            image_sequence_url(&sequence(), ImageProducer::Image2),
            "/path/to/files/image.%04d.png?start_number=1001"
        );
        assert_eq!(
            image_sequence_url(&sequence(), ImageProducer::Pixbuf),
            "/path/to/files/image.%04d.png?begin=1001"
        );
        let mut unpadded = sequence();
        unpadded.frame_zero_padding = 0;
        assert_eq!(
            image_sequence_url(&unpadded, ImageProducer::Image2),
            "/path/to/files/image.%d.png?start_number=1001"
        );
    }

    #[test]
    fn test_image_sequence_sets_service() {
        let clip = Clip::new("imageseq", range(10.0, 80.0))
            .with_media(MediaReference::ImageSequence(sequence()));
        let options = CompileOptions::default().with_image_producer("pixbuf");
        let resolved = resolve_media(&clip, &options, 30.0).unwrap();
        assert_eq!(resolved.descriptor.service.as_deref(), Some("pixbuf"));
        assert_eq!(resolved.descriptor.out_point, Some(99));
    }

    #[test]
    fn test_image_sequence_rejects_unknown_service() {
        let clip = Clip::new("imageseq", range(10.0, 80.0))
            .with_media(MediaReference::ImageSequence(sequence()));
        let options = CompileOptions::default().with_image_producer("nothinhere");
        let err = resolve_media(&clip, &options, 30.0).unwrap_err();
        assert!(matches!(err, OtmltError::UnsupportedConfiguration { .. }));
    }

    #[test]
    fn test_generator_uses_reference_name_and_kind() {
        let bars = MediaReference::generator("colorbars", "SMPTEBars")
            .with_available_range(range(0.0, 50.0));
        let clip = Clip::new("generator_clip1", range(0.0, 50.0)).with_media(bars);
        let resolved = resolve_media(&clip, &CompileOptions::default(), 30.0).unwrap();
        assert_eq!(resolved.name, "colorbars");
        assert_eq!(resolved.descriptor, MediaDescriptor::new("SMPTEBars"));
    }
}
