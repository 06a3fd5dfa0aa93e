//! Autoload metadata carried through from the lockfile
//!
//! `psr-0` and `psr-4` entries come in two shapes: a map from namespace
//! prefix to a single path, or a map from prefix to a list of paths. The
//! shape that was read is the shape that is written back.

use std::fmt;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Autoload section of a package record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Autoload {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classmap: Vec<String>,

    #[serde(
        rename = "exclude-from-classmap",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub exclude_from_classmap: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,

    #[serde(rename = "psr-0", skip_serializing_if = "Option::is_none")]
    pub psr0: Option<PathMapping>,

    #[serde(rename = "psr-4", skip_serializing_if = "Option::is_none")]
    pub psr4: Option<PathMapping>,
}

impl Autoload {
    /// True when no autoload rule is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classmap.is_empty()
            && self.exclude_from_classmap.is_empty()
            && self.files.is_empty()
            && self.psr0.is_none()
            && self.psr4.is_none()
    }
}

/// Prefix-to-path mapping, in lockfile order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMapping {
    /// Every prefix maps to exactly one path
    SinglePath(Vec<(String, String)>),
    /// Prefixes map to lists of paths
    MultiPath(Vec<(String, Vec<String>)>),
}

impl PathMapping {
    /// Number of prefixes in the mapping
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::SinglePath(entries) => entries.len(),
            Self::MultiPath(entries) => entries.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Paths registered for `prefix`, regardless of shape
    #[must_use]
    pub fn paths_for(&self, prefix: &str) -> Option<Vec<&str>> {
        match self {
            Self::SinglePath(entries) => entries
                .iter()
                .find(|(p, _)| p == prefix)
                .map(|(_, path)| vec![path.as_str()]),
            Self::MultiPath(entries) => entries
                .iter()
                .find(|(p, _)| p == prefix)
                .map(|(_, paths)| paths.iter().map(String::as_str).collect()),
        }
    }
}

impl Serialize for PathMapping {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Written back as `[]` when it was read that way
        if matches!(self, Self::MultiPath(entries) if entries.is_empty()) {
            return serializer.serialize_seq(Some(0))?.end();
        }

        let mut map = serializer.serialize_map(Some(self.len()))?;
        match self {
            Self::SinglePath(entries) => {
                for (prefix, path) in entries {
                    map.serialize_entry(prefix, path)?;
                }
            }
            Self::MultiPath(entries) => {
                for (prefix, paths) in entries {
                    map.serialize_entry(prefix, paths)?;
                }
            }
        }
        map.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PathValue {
    One(String),
    Many(Vec<String>),
}

struct PathMappingVisitor;

impl<'de> Visitor<'de> for PathMappingVisitor {
    type Value = PathMapping;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of namespace prefixes to a path or a list of paths")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries: Vec<(String, PathValue)> =
            Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((prefix, value)) = access.next_entry::<String, PathValue>()? {
            entries.push((prefix, value));
        }

        // Any list selects the multi-path shape
        let multi = entries.iter().any(|(_, v)| matches!(v, PathValue::Many(_)));
        if multi {
            Ok(PathMapping::MultiPath(
                entries
                    .into_iter()
                    .map(|(prefix, value)| match value {
                        PathValue::One(path) => (prefix, vec![path]),
                        PathValue::Many(paths) => (prefix, paths),
                    })
                    .collect(),
            ))
        } else {
            Ok(PathMapping::SinglePath(
                entries
                    .into_iter()
                    .filter_map(|(prefix, value)| match value {
                        PathValue::One(path) => Some((prefix, path)),
                        PathValue::Many(_) => None,
                    })
                    .collect(),
            ))
        }
    }

    // Empty mappings are sometimes encoded as `[]`
    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        if seq.next_element::<serde::de::IgnoredAny>()?.is_some() {
            return Err(serde::de::Error::invalid_type(
                serde::de::Unexpected::Seq,
                &self,
            ));
        }
        Ok(PathMapping::MultiPath(Vec::new()))
    }
}

impl<'de> Deserialize<'de> for PathMapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(PathMappingVisitor)
    }
}
