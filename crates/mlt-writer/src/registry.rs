//! Producer registry and document-wide id allocation.
//!
//! Every producer in a document goes through [`ProducerRegistry::resolve`].
//! Identical material (same display name, same media descriptor) collapses
//! onto one producer no matter how many tracks reference it. Material that
//! shares a display name but differs in media gets its own producer with an
//! id derived from the media locator.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use crate::properties::{PropertyMap, PropertyValue};

/// Normalized description of the material behind a producer.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaDescriptor {
    /// Resource locator (path, URL, generator kind, or service resource).
    pub resource: String,

    /// Explicit `mlt_service`; `None` lets the consumer pick a loader.
    pub service: Option<String>,

    /// First frame of the producer, inclusive.
    pub in_point: Option<i64>,

    /// Last frame of the producer, inclusive.
    pub out_point: Option<i64>,

    /// Service-specific properties.
    pub properties: PropertyMap,
}

impl MediaDescriptor {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            service: None,
            in_point: None,
            out_point: None,
            properties: PropertyMap::new(),
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_bounds(mut self, in_point: i64, out_point: i64) -> Self {
        self.in_point = Some(in_point);
        self.out_point = Some(out_point);
        self
    }

    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Stable hash over every field, used as the registry bucket key.
    fn fingerprint(&self) -> u64 {
        let mut canonical = String::new();
        let _ = write!(
            canonical,
            "{}\u{1f}{}\u{1f}{:?}\u{1f}{:?}",
            self.resource,
            self.service.as_deref().unwrap_or_default(),
            self.in_point,
            self.out_point
        );
        for (key, value) in &self.properties {
            let _ = write!(canonical, "\u{1f}{key}={value}");
        }
        fnv1a_64(&canonical)
    }
}

/// A producer as it will appear in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerEntity {
    /// Document-unique id.
    pub id: String,

    /// Display name; shared by producers that differ only in media.
    pub name: String,

    pub media: MediaDescriptor,
}

/// Set of ids already used in one document.
#[derive(Debug, Default)]
pub struct IdSpace {
    taken: HashSet<String>,
    counters: HashMap<String, usize>,
}

impl IdSpace {
    pub fn is_taken(&self, id: &str) -> bool {
        self.taken.contains(id)
    }

    /// Claim `id` if nobody holds it yet.
    pub fn claim(&mut self, id: &str) -> bool {
        if id.is_empty() || self.taken.contains(id) {
            return false;
        }
        self.taken.insert(id.to_string())
    }

    /// Claim the first free `<prefix><n>`, counting from zero.
    pub fn claim_numbered(&mut self, prefix: &str) -> String {
        let mut n = self.counters.get(prefix).copied().unwrap_or(0);
        loop {
            let candidate = format!("{prefix}{n}");
            n += 1;
            if self.claim(&candidate) {
                self.counters.insert(prefix.to_string(), n);
                return candidate;
            }
        }
    }

    /// Claim `preferred`, or `<preferred>_<n>` when it is taken, or
    /// `<fallback><n>` when there is no preferred name at all.
    pub fn claim_preferred(&mut self, preferred: &str, fallback: &str) -> String {
        if preferred.is_empty() {
            return self.claim_numbered(fallback);
        }
        if self.claim(preferred) {
            return preferred.to_string();
        }
        self.claim_numbered(&format!("{preferred}_"))
    }
}

/// Deduplicating store of every producer in one document.
///
/// Scoped to a single compilation; never shared between documents.
#[derive(Debug, Default)]
pub struct ProducerRegistry {
    ids: IdSpace,
    producers: Vec<ProducerEntity>,
    index: HashMap<(String, u64), Vec<usize>>,
}

impl ProducerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the producer id for `name` playing `media`, registering a new
    /// producer the first time the pair is seen.
    pub fn resolve(&mut self, name: &str, media: MediaDescriptor) -> String {
        let key = (name.to_string(), media.fingerprint());
        if let Some(existing) = self.index.get(&key).and_then(|bucket| {
            bucket
                .iter()
                .map(|&i| &self.producers[i])
                .find(|p| p.media == media)
        }) {
            tracing::debug!(id = %existing.id, "Reusing producer");
            return existing.id.clone();
        }

        let id = self.mint_id(name, &media);
        if id != name {
            tracing::debug!(
                name,
                id = %id,
                resource = %media.resource,
                "Disambiguated producer id"
            );
        }
        self.index.entry(key).or_default().push(self.producers.len());
        self.producers.push(ProducerEntity {
            id: id.clone(),
            name: name.to_string(),
            media,
        });
        id
    }

    fn mint_id(&mut self, name: &str, media: &MediaDescriptor) -> String {
        if name.is_empty() {
            return self.ids.claim_numbered("producer");
        }
        if self.ids.claim(name) {
            return name.to_string();
        }
        let modified = format!("{name}_{:08x}", fnv1a_64(&media.resource) as u32);
        if self.ids.claim(&modified) {
            return modified;
        }
        self.ids.claim_numbered(&format!("{modified}_"))
    }

    /// Id allocation shared with playlists and tractors.
    pub fn ids_mut(&mut self) -> &mut IdSpace {
        &mut self.ids
    }

    pub fn get(&self, id: &str) -> Option<&ProducerEntity> {
        self.producers.iter().find(|p| p.id == id)
    }

    pub fn into_producers(self) -> Vec<ProducerEntity> {
        self.producers
    }
}

/// FNV-1a, 64-bit.
pub(crate) fn fnv1a_64(input: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in input.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
