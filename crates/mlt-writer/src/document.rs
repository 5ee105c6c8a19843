//! The compiled entity graph and its XML serialization.
//!
//! A [`Document`] holds everything the compiler produced, in the order MLT
//! needs it: every entity is defined before anything references it.

use indexmap::IndexMap;
use otmlt_common::error::{OtmltError, OtmltResult};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::options::{is_attribute_name, CompileOptions};
use crate::properties::{format_float, stringify, PropertyMap};
use crate::registry::ProducerEntity;

/// One element of a playlist.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaylistItem {
    /// Plays `producer` (a producer, playlist, or tractor id).
    Entry {
        producer: String,
        in_point: Option<i64>,
        out_point: Option<i64>,
    },

    /// Empty space.
    Blank { length: i64 },

    /// Plays a transition composite from its first frame.
    Transition { composite: String, length: i64 },
}

impl PlaylistItem {
    pub fn entry(producer: impl Into<String>, in_point: i64, out_point: i64) -> Self {
        Self::Entry {
            producer: producer.into(),
            in_point: Some(in_point),
            out_point: Some(out_point),
        }
    }

    /// Frames this item occupies. Entries without bounds count as zero.
    pub fn length(&self) -> i64 {
        match self {
            Self::Entry {
                in_point: Some(i),
                out_point: Some(o),
                ..
            } => o - i + 1,
            Self::Entry { .. } => 0,
            Self::Blank { length } | Self::Transition { length, .. } => *length,
        }
    }
}

/// A linear track.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistEntity {
    pub id: String,
    pub items: Vec<PlaylistItem>,
}

impl PlaylistEntity {
    pub fn duration(&self) -> i64 {
        self.items.iter().map(PlaylistItem::length).sum()
    }
}

/// A lane of a composite.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackBinding {
    pub producer: String,
    pub in_point: Option<i64>,
    pub out_point: Option<i64>,
}

impl TrackBinding {
    pub fn whole(producer: impl Into<String>) -> Self {
        Self {
            producer: producer.into(),
            in_point: None,
            out_point: None,
        }
    }

    pub fn span(producer: impl Into<String>, in_point: i64, out_point: i64) -> Self {
        Self {
            producer: producer.into(),
            in_point: Some(in_point),
            out_point: Some(out_point),
        }
    }
}

/// Compositing service applied between two lanes of a composite.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendOperator {
    pub service: String,
    pub a_track: usize,
    pub b_track: usize,
    pub in_point: Option<i64>,
    pub out_point: Option<i64>,
    pub properties: PropertyMap,
}

/// How a composite lists its lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeLayout {
    /// Lanes wrapped in a `multitrack` element.
    Multitrack,
    /// Lanes as direct `track` children.
    Direct,
}

/// Lanes played in parallel (an MLT tractor).
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeEntity {
    pub id: String,
    pub out_point: i64,
    pub layout: CompositeLayout,
    pub tracks: Vec<TrackBinding>,
    pub blends: Vec<BlendOperator>,
}

/// A playlist or composite, in definition order.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Playlist(PlaylistEntity),
    Composite(CompositeEntity),
}

impl Block {
    pub fn id(&self) -> &str {
        match self {
            Self::Playlist(p) => &p.id,
            Self::Composite(c) => &c.id,
        }
    }
}

/// Output frame geometry and rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub width: u32,
    pub height: u32,
    pub frame_rate_num: i64,
    pub frame_rate_den: i64,
    pub extra: PropertyMap,
}

impl Profile {
    pub fn new(options: &CompileOptions, rate: f64) -> Self {
        let (frame_rate_num, frame_rate_den) = frame_rate_fraction(rate);
        Self {
            width: options.width(),
            height: options.height(),
            frame_rate_num,
            frame_rate_den,
            extra: options.profile.clone(),
        }
    }

    /// Attribute set of the `profile` element, defaults first.
    pub fn attributes(&self) -> IndexMap<String, String> {
        let divisor = gcd(i64::from(self.width), i64::from(self.height)).max(1);
        let fps = self.frame_rate_num as f64 / self.frame_rate_den as f64;
        let mut attributes = IndexMap::new();
        attributes.insert(
            "description".to_string(),
            format!("{}x{} {} fps", self.width, self.height, format_float(fps)),
        );
        attributes.insert("width".to_string(), self.width.to_string());
        attributes.insert("height".to_string(), self.height.to_string());
        attributes.insert("progressive".to_string(), "1".to_string());
        attributes.insert("sample_aspect_num".to_string(), "1".to_string());
        attributes.insert("sample_aspect_den".to_string(), "1".to_string());
        attributes.insert(
            "display_aspect_num".to_string(),
            (i64::from(self.width) / divisor).to_string(),
        );
        attributes.insert(
            "display_aspect_den".to_string(),
            (i64::from(self.height) / divisor).to_string(),
        );
        attributes.insert("frame_rate_num".to_string(), self.frame_rate_num.to_string());
        attributes.insert("frame_rate_den".to_string(), self.frame_rate_den.to_string());
        attributes.insert("colorspace".to_string(), "709".to_string());
        attributes.extend(stringify(&self.extra));
        attributes
    }
}

/// A complete MLT document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: Option<String>,
    pub profile: Profile,
    pub producers: Vec<ProducerEntity>,
    /// Playlists and composites, dependencies first.
    pub blocks: Vec<Block>,
    /// The top-level composite naming the whole program.
    pub main: CompositeEntity,
}

impl Document {
    pub fn playlists(&self) -> impl Iterator<Item = &PlaylistEntity> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Playlist(p) => Some(p),
            Block::Composite(_) => None,
        })
    }

    /// Every composite, the main one last.
    pub fn composites(&self) -> impl Iterator<Item = &CompositeEntity> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Composite(c) => Some(c),
                Block::Playlist(_) => None,
            })
            .chain(std::iter::once(&self.main))
    }

    pub fn playlist(&self, id: &str) -> Option<&PlaylistEntity> {
        self.playlists().find(|p| p.id == id)
    }

    pub fn composite(&self, id: &str) -> Option<&CompositeEntity> {
        self.composites().find(|c| c.id == id)
    }

    /// Render the document as indented MLT XML.
    pub fn to_xml(&self) -> OtmltResult<String> {
        let mut out = XmlOut::new();
        out.event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut root = vec![("LC_NUMERIC", "C"), ("producer", self.main.id.as_str())];
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            root.push(("title", title));
        }
        out.start("mlt", &root)?;

        let profile = self.profile.attributes();
        if let Some(bad) = profile.keys().find(|k| !is_attribute_name(k)) {
            return Err(OtmltError::xml(format!(
                "profile setting \"{bad}\" is not a valid attribute name"
            )));
        }
        let profile_attrs: Vec<(&str, &str)> = profile
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        out.empty("profile", &profile_attrs)?;

        for producer in &self.producers {
            write_producer(&mut out, producer)?;
        }
        for block in &self.blocks {
            match block {
                Block::Playlist(playlist) => write_playlist(&mut out, playlist)?,
                Block::Composite(composite) => write_composite(&mut out, composite)?,
            }
        }
        write_composite(&mut out, &self.main)?;

        out.end("mlt")?;
        out.finish()
    }
}

fn write_producer(out: &mut XmlOut, producer: &ProducerEntity) -> OtmltResult<()> {
    let media = &producer.media;
    let in_point = media.in_point.map(|v| v.to_string());
    let out_point = media.out_point.map(|v| v.to_string());
    let mut attrs = vec![("id", producer.id.as_str())];
    push_bounds(&mut attrs, &in_point, &out_point);

    out.start("producer", &attrs)?;
    out.property("resource", &media.resource)?;
    if let Some(service) = &media.service {
        out.property("mlt_service", service)?;
    }
    for (key, value) in stringify(&media.properties) {
        out.property(&key, &value)?;
    }
    out.property("title", &producer.name)?;
    out.end("producer")
}

fn write_playlist(out: &mut XmlOut, playlist: &PlaylistEntity) -> OtmltResult<()> {
    out.start("playlist", &[("id", playlist.id.as_str())])?;
    for item in &playlist.items {
        match item {
            PlaylistItem::Entry {
                producer,
                in_point,
                out_point,
            } => {
                let in_point = in_point.map(|v| v.to_string());
                let out_point = out_point.map(|v| v.to_string());
                let mut attrs = vec![("producer", producer.as_str())];
                push_bounds(&mut attrs, &in_point, &out_point);
                out.empty("entry", &attrs)?;
            }
            PlaylistItem::Blank { length } => {
                out.empty("blank", &[("length", length.to_string().as_str())])?;
            }
            PlaylistItem::Transition { composite, length } => {
                let last = (length - 1).to_string();
                out.empty(
                    "entry",
                    &[("producer", composite.as_str()), ("in", "0"), ("out", last.as_str())],
                )?;
            }
        }
    }
    out.end("playlist")
}

fn write_composite(out: &mut XmlOut, composite: &CompositeEntity) -> OtmltResult<()> {
    let last = composite.out_point.to_string();
    out.start(
        "tractor",
        &[("id", composite.id.as_str()), ("in", "0"), ("out", last.as_str())],
    )?;

    let multitrack = composite.layout == CompositeLayout::Multitrack;
    if multitrack {
        out.start("multitrack", &[])?;
    }
    for track in &composite.tracks {
        let in_point = track.in_point.map(|v| v.to_string());
        let out_point = track.out_point.map(|v| v.to_string());
        let mut attrs = vec![("producer", track.producer.as_str())];
        push_bounds(&mut attrs, &in_point, &out_point);
        out.empty("track", &attrs)?;
    }
    if multitrack {
        out.end("multitrack")?;
    }

    for blend in &composite.blends {
        let in_point = blend.in_point.map(|v| v.to_string());
        let out_point = blend.out_point.map(|v| v.to_string());
        let mut attrs = Vec::new();
        push_bounds(&mut attrs, &in_point, &out_point);
        out.start("transition", &attrs)?;
        out.property("a_track", &blend.a_track.to_string())?;
        out.property("b_track", &blend.b_track.to_string())?;
        out.property("mlt_service", &blend.service)?;
        for (key, value) in stringify(&blend.properties) {
            out.property(&key, &value)?;
        }
        out.end("transition")?;
    }
    out.end("tractor")
}

fn push_bounds<'a>(
    attrs: &mut Vec<(&'a str, &'a str)>,
    in_point: &'a Option<String>,
    out_point: &'a Option<String>,
) {
    if let Some(v) = in_point {
        attrs.push(("in", v.as_str()));
    }
    if let Some(v) = out_point {
        attrs.push(("out", v.as_str()));
    }
}

/// Thin wrapper over the quick-xml writer with error mapping.
struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> OtmltResult<()> {
        self.writer
            .write_event(event)
            .map_err(|e| OtmltError::xml(e.to_string()))
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> OtmltResult<()> {
        let mut element = BytesStart::new(name);
        for attr in attrs {
            element.push_attribute(*attr);
        }
        self.event(Event::Start(element))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> OtmltResult<()> {
        let mut element = BytesStart::new(name);
        for attr in attrs {
            element.push_attribute(*attr);
        }
        self.event(Event::Empty(element))
    }

    fn end(&mut self, name: &str) -> OtmltResult<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn property(&mut self, name: &str, value: &str) -> OtmltResult<()> {
        self.start("property", &[("name", name)])?;
        self.event(Event::Text(BytesText::new(value)))?;
        self.end("property")
    }

    fn finish(self) -> OtmltResult<String> {
        String::from_utf8(self.writer.into_inner())
            .map_err(|e| OtmltError::xml(format!("document is not valid UTF-8: {e}")))
    }
}

/// Integer fraction for a frame rate; NTSC-style rates become `n*1000/1001`.
fn frame_rate_fraction(rate: f64) -> (i64, i64) {
    if rate <= 0.0 {
        return (0, 1);
    }
    if (rate - rate.round()).abs() < 1e-6 {
        return (rate.round() as i64, 1);
    }
    let ntsc = rate * 1.001;
    if (ntsc - ntsc.round()).abs() < 1e-3 {
        return (ntsc.round() as i64 * 1000, 1001);
    }
    let num = (rate * 1000.0).round() as i64;
    let divisor = gcd(num, 1000).max(1);
    (num / divisor, 1000 / divisor)
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
