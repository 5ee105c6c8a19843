//! Per-compilation configuration.

use std::fmt;
use std::str::FromStr;

use otmlt_common::error::{OtmltError, OtmltResult};
use serde::{Deserialize, Deserializer, Serialize};

use crate::properties::{PropertyMap, PropertyValue};

/// Frame width of the built-in profile.
pub const DEFAULT_WIDTH: u32 = 1920;

/// Frame height of the built-in profile.
pub const DEFAULT_HEIGHT: u32 = 1080;

/// Options recognized by the MLT writer.
///
/// Deserializes from the same flat key/value set the adapter accepts as
/// arguments; keys other than `width`, `height` and `image_producer` are
/// extra profile settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Output frame width. Accepts integers or numeric strings.
    #[serde(deserialize_with = "deserialize_dimension")]
    pub width: Option<u32>,

    /// Output frame height. Accepts integers or numeric strings.
    #[serde(deserialize_with = "deserialize_dimension")]
    pub height: Option<u32>,

    /// Service used for image sequences. Validated when the first image
    /// sequence is resolved.
    pub image_producer: String,

    /// Extra profile attributes, written after the defaults.
    #[serde(flatten)]
    pub profile: PropertyMap,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            image_producer: ImageProducer::default().service().to_string(),
            profile: PropertyMap::new(),
        }
    }
}

impl CompileOptions {
    /// Parse options from a JSON object.
    pub fn from_json(raw: &str) -> OtmltResult<Self> {
        let options: Self = serde_json::from_str(raw)?;
        for key in options.profile.keys() {
            check_profile_key(key)?;
        }
        Ok(options)
    }

    /// Build options from loose key/value arguments.
    pub fn from_pairs<'a, I>(pairs: I) -> OtmltResult<Self>
    where
        I: IntoIterator<Item = (&'a str, serde_json::Value)>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            match key {
                "width" => options.width = Some(dimension_from_value(key, value)?),
                "height" => options.height = Some(dimension_from_value(key, value)?),
                "image_producer" => match value {
                    serde_json::Value::String(s) => options.image_producer = s,
                    other => options.image_producer = other.to_string(),
                },
                _ => {
                    check_profile_key(key)?;
                    options
                        .profile
                        .insert(key.to_string(), PropertyValue::try_from(value)?);
                }
            }
        }
        Ok(options)
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_image_producer(mut self, service: impl Into<String>) -> Self {
        self.image_producer = service.into();
        self
    }

    /// Add an extra profile attribute. Fails when `key` cannot be written
    /// as an XML attribute name.
    pub fn with_profile_setting(
        mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> OtmltResult<Self> {
        let key = key.into();
        check_profile_key(&key)?;
        self.profile.insert(key, value.into());
        Ok(self)
    }

    pub fn width(&self) -> u32 {
        self.width.unwrap_or(DEFAULT_WIDTH)
    }

    pub fn height(&self) -> u32 {
        self.height.unwrap_or(DEFAULT_HEIGHT)
    }

    /// The configured image-sequence service, or the configuration error
    /// naming the supported ones.
    pub fn image_producer(&self) -> OtmltResult<ImageProducer> {
        self.image_producer.parse()
    }
}

/// Services able to play back numbered image files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageProducer {
    #[default]
    Image2,
    Pixbuf,
}

impl ImageProducer {
    pub const ALL: [ImageProducer; 2] = [ImageProducer::Image2, ImageProducer::Pixbuf];

    pub fn service(&self) -> &'static str {
        match self {
            Self::Image2 => "image2",
            Self::Pixbuf => "pixbuf",
        }
    }

    /// Query parameter carrying the first frame number in the resource.
    pub fn start_parameter(&self) -> &'static str {
        match self {
            Self::Image2 => "start_number",
            Self::Pixbuf => "begin",
        }
    }
}

impl fmt::Display for ImageProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service())
    }
}

impl FromStr for ImageProducer {
    type Err = OtmltError;

    fn from_str(s: &str) -> OtmltResult<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.service() == s)
            .ok_or_else(|| {
                let allowed = Self::ALL
                    .iter()
                    .map(|p| p.service())
                    .collect::<Vec<_>>()
                    .join(", ");
                OtmltError::unsupported_configuration(format!(
                    "Image producer must be one of {{{allowed}}}, not \"{s}\""
                ))
            })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Dimension {
    Int(u32),
    Text(String),
}

fn deserialize_dimension<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Dimension>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Dimension::Int(v)) => Ok(Some(v)),
        Some(Dimension::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid frame dimension \"{s}\""))),
    }
}

fn dimension_from_value(key: &str, value: serde_json::Value) -> OtmltResult<u32> {
    let parsed = match &value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        OtmltError::config(format!("{key} must be a positive integer, got {value}"))
    })
}

/// Whether `name` can stand as an attribute of the `profile` element.
///
/// Accepts XML names without namespace prefixes and without the reserved
/// `xml` start.
pub(crate) fn is_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !name.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("xml"))
}

fn check_profile_key(key: &str) -> OtmltResult<()> {
    if is_attribute_name(key) {
        Ok(())
    } else {
        Err(OtmltError::config(format!(
            "profile setting \"{key}\" is not a valid XML attribute name"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CompileOptions::default();
        assert_eq!(options.width(), 1920);
        assert_eq!(options.height(), 1080);
        assert_eq!(options.image_producer().unwrap(), ImageProducer::Image2);
    }

    #[test]
    fn test_from_json_accepts_string_dimensions_and_extras() {
        let options = CompileOptions::from_json(
            r#"{"width":"1280","height":720,"image_producer":"pixbuf","colorspace":601}"#,
        )
        .unwrap();
        assert_eq!(options.width(), 1280);
        assert_eq!(options.height(), 720);
        assert_eq!(options.image_producer().unwrap(), ImageProducer::Pixbuf);
        assert_eq!(options.profile["colorspace"], PropertyValue::Int(601));
    }

    #[test]
    fn test_from_json_rejects_non_scalar_extras() {
        assert!(CompileOptions::from_json(r#"{"tags":["a","b"]}"#).is_err());
    }

    #[test]
    fn test_from_pairs() {
        let options = CompileOptions::from_pairs([
            ("width", serde_json::json!("1920")),
            ("height", serde_json::json!(1080)),
            ("progressive", serde_json::json!(0)),
        ])
        .unwrap();
        assert_eq!(options.width, Some(1920));
        assert_eq!(options.height, Some(1080));
        assert_eq!(options.profile["progressive"], PropertyValue::Int(0));

        assert!(CompileOptions::from_pairs([("width", serde_json::json!("wide"))]).is_err());
        assert!(CompileOptions::from_pairs([("extra", serde_json::json!(null))]).is_err());
    }

    #[test]
    fn test_profile_keys_must_be_attribute_names() {
        for key in ["frame rate", "1st", "a:b", "xmlns", "", "<x>"] {
            let err = CompileOptions::from_pairs([(key, serde_json::json!(25))]).unwrap_err();
            assert!(matches!(err, OtmltError::Config { .. }), "{key:?}");
        }

        let err = CompileOptions::from_json(r#"{"frame rate":25}"#).unwrap_err();
        assert!(matches!(err, OtmltError::Config { .. }));
        assert!(err.to_string().contains("\"frame rate\""));

        assert!(CompileOptions::default()
            .with_profile_setting("frame rate", 25i64)
            .is_err());
        let options = CompileOptions::default()
            .with_profile_setting("meta.media.color_trc", 1i64)
            .unwrap();
        assert_eq!(options.profile["meta.media.color_trc"], PropertyValue::Int(1));
    }

    #[test]
    fn test_unknown_image_producer_is_deferred() {
        let options = CompileOptions::default().with_image_producer("nothinhere");
        let err = options.image_producer().unwrap_err();
        assert!(matches!(err, OtmltError::UnsupportedConfiguration { .. }));
        assert_eq!(
            err.to_string(),
            "Image producer must be one of {image2, pixbuf}, not \"nothinhere\""
        );
    }

    #[test]
    fn test_image_producer_parameters() {
        assert_eq!(ImageProducer::Image2.start_parameter(), "start_number");
        assert_eq!(ImageProducer::Pixbuf.start_parameter(), "begin");
        assert_eq!(ImageProducer::Pixbuf.to_string(), "pixbuf");
    }
}
