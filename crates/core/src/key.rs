//! Resource identity model.
//!
//! A [`ResourceKey`] answers "which resource, which version, on which base
//! location". It serializes to the canonical FHIR addressing form
//! `{base}/{type}/{id}/_history/{version}` with absent segments omitted in
//! order, and parses back losslessly for every key carrying a resource id;
//! [`ResourceKey::parse`] documents the one ambiguity left at type level.
//!
//! The resource itself owns its identity fields (`id`, `meta.versionId`); a
//! key is a derived, immutable snapshot. [`ResourceKey::from_resource`]
//! projects the current identity out of a resource, and
//! [`ResourceKey::stamp`] explicitly writes a key's fields onto one. There
//! is no hidden aliasing between the two.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::KeyError;

/// Segment marker separating the resource id from the version id in the
/// canonical URI form.
const HISTORY_SEGMENT: &str = "_history";

/// Result type for key operations.
pub type KeyResult<T> = Result<T, KeyError>;

/// Immutable identity of a resource or resource version.
///
/// Two keys are equal iff all four fields match exactly; the only
/// normalization ever applied is stripping a trailing `/` from `base` at
/// construction time.
///
/// # Example
///
/// ```
/// use ember_core::ResourceKey;
///
/// let key = ResourceKey::create_versioned("Observation", "42", "3").unwrap();
/// assert_eq!(key.to_uri_string(), "Observation/42/_history/3");
///
/// let parsed = ResourceKey::parse("Observation/42/_history/3").unwrap();
/// assert_eq!(parsed, key);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    base: Option<String>,
    type_name: String,
    resource_id: Option<String>,
    version_id: Option<String>,
}

impl ResourceKey {
    /// Creates a type-level key with no id or version, as used when a
    /// handler creates a brand-new resource.
    pub fn create(type_name: impl Into<String>) -> KeyResult<Self> {
        let type_name = type_name.into();
        if type_name.is_empty() {
            return Err(KeyError::invalid("type name must not be empty"));
        }
        Ok(Self {
            base: None,
            type_name,
            resource_id: None,
            version_id: None,
        })
    }

    /// Creates a key addressing a specific resource instance.
    pub fn create_with_id(
        type_name: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> KeyResult<Self> {
        let mut key = Self::create(type_name)?;
        let resource_id = resource_id.into();
        if resource_id.is_empty() {
            return Err(KeyError::invalid("resource id must not be empty"));
        }
        key.resource_id = Some(resource_id);
        Ok(key)
    }

    /// Creates a key addressing a specific version of a resource instance.
    ///
    /// A version id is meaningless without a resource id, so there is no
    /// constructor taking only a version; a caller that has a version but
    /// no id is in error and gets [`KeyError::InvalidKey`] from
    /// [`ResourceKey::from_resource`] instead of a silently defaulted id.
    pub fn create_versioned(
        type_name: impl Into<String>,
        resource_id: impl Into<String>,
        version_id: impl Into<String>,
    ) -> KeyResult<Self> {
        let mut key = Self::create_with_id(type_name, resource_id)?;
        let version_id = version_id.into();
        if version_id.is_empty() {
            return Err(KeyError::invalid("version id must not be empty"));
        }
        key.version_id = Some(version_id);
        Ok(key)
    }

    /// Returns a copy of this key anchored at `base`. A trailing path
    /// separator is stripped so serialization never produces `//`.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        let trimmed = base.trim_end_matches('/');
        self.base = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    /// The base location, if any. Never ends with `/`.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// The resource type name. Always non-empty.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The resource id, if assigned.
    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    /// The version id, if assigned. Present only together with a resource id.
    pub fn version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }

    /// Serializes to the canonical URI form
    /// `{base}/{type}/{id}/_history/{version}`, omitting absent segments
    /// in order.
    pub fn to_uri_string(&self) -> String {
        let mut uri = String::new();
        if let Some(base) = &self.base {
            uri.push_str(base);
            uri.push('/');
        }
        uri.push_str(&self.type_name);
        if let Some(id) = &self.resource_id {
            uri.push('/');
            uri.push_str(id);
            if let Some(version) = &self.version_id {
                uri.push('/');
                uri.push_str(HISTORY_SEGMENT);
                uri.push('/');
                uri.push_str(version);
            }
        }
        uri
    }

    /// Parses a canonical URI string back into a key.
    ///
    /// Accepts relative (`Patient/42`) and absolute
    /// (`http://host/fhir/Patient/42/_history/3`) forms. Fails with
    /// [`KeyError::MalformedIdentity`] when the string does not decompose
    /// into at most `{base}/{type}/{id}/_history/{version}` segments in
    /// that order, including a `_history` segment with no resource id in
    /// front of it.
    ///
    /// Two adjacent trailing segments that both look like type names always
    /// read as `{type}/{id}`: `http://host/R4/Patient` parses as a read of
    /// resource `Patient` on type `R4`, so a type-level key anchored at a
    /// base whose final segment is itself type-shaped does not survive a
    /// round trip. Keys carrying a resource id are unaffected.
    pub fn parse(input: &str) -> KeyResult<Self> {
        let value = input.trim();
        if value.is_empty() {
            return Err(KeyError::malformed(input, "empty string"));
        }

        // Split off the version, anchored on the last `/_history/`.
        let history_marker = format!("/{HISTORY_SEGMENT}/");
        let (path, version_id) = match value.rfind(&history_marker) {
            Some(idx) => {
                let version = &value[idx + history_marker.len()..];
                if version.is_empty() || version.contains('/') {
                    return Err(KeyError::malformed(input, "invalid version segment"));
                }
                (&value[..idx], Some(version.to_string()))
            }
            None => {
                if value.ends_with(&format!("/{HISTORY_SEGMENT}"))
                    || value == HISTORY_SEGMENT
                {
                    return Err(KeyError::malformed(input, "history segment without version"));
                }
                (value, None)
            }
        };

        // An absolute base keeps its scheme and authority intact; only the
        // path after the authority is segmented.
        let (authority, path_remainder) = match path.find("://") {
            Some(scheme_end) => {
                let after_scheme = &path[scheme_end + 3..];
                match after_scheme.find('/') {
                    Some(slash) => {
                        let authority_end = scheme_end + 3 + slash;
                        (Some(&path[..authority_end]), &path[authority_end + 1..])
                    }
                    None => {
                        return Err(KeyError::malformed(input, "no resource type segment"));
                    }
                }
            }
            None => (None, path),
        };

        let segments: Vec<&str> = path_remainder.split('/').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(KeyError::malformed(input, "empty path segment"));
        }

        // Resource types follow FHIR naming (leading uppercase ASCII).
        // Working from the right: the final segment is the type when it
        // looks like one and its predecessor does not, otherwise it is the
        // resource id and the predecessor must be the type.
        let (base_segments, type_name, resource_id) = match segments.as_slice() {
            [only] => {
                if !looks_like_type_name(only) {
                    return Err(KeyError::malformed(input, "no resource type segment"));
                }
                (&segments[..0], only.to_string(), None)
            }
            [.., prev, last] => {
                if looks_like_type_name(last) && !looks_like_type_name(prev) {
                    (
                        &segments[..segments.len() - 1],
                        last.to_string(),
                        None,
                    )
                } else if looks_like_type_name(prev) {
                    (
                        &segments[..segments.len() - 2],
                        prev.to_string(),
                        Some(last.to_string()),
                    )
                } else {
                    return Err(KeyError::malformed(input, "no resource type segment"));
                }
            }
            [] => return Err(KeyError::malformed(input, "no resource type segment")),
        };

        if version_id.is_some() && resource_id.is_none() {
            return Err(KeyError::malformed(
                input,
                "version id without a resource id",
            ));
        }

        let base = match (authority, base_segments) {
            (None, []) => None,
            (Some(authority), rest) => {
                let mut base = authority.to_string();
                for segment in rest {
                    base.push('/');
                    base.push_str(segment);
                }
                Some(base)
            }
            (None, rest) => Some(rest.join("/")),
        };

        Ok(Self {
            base,
            type_name,
            resource_id,
            version_id,
        })
    }

    /// Projects the identity currently carried by a resource.
    ///
    /// Returns `Ok(None)` for a payload with no `resourceType` (the "no key
    /// yet" state a handler may legitimately return). A `meta.versionId`
    /// with no `id` is a caller error, not a state this model can
    /// represent.
    pub fn from_resource(resource: &Value, base: Option<&str>) -> KeyResult<Option<Self>> {
        let Some(object) = resource.as_object() else {
            return Ok(None);
        };
        let Some(type_name) = object.get("resourceType").and_then(Value::as_str) else {
            return Ok(None);
        };

        let resource_id = object.get("id").and_then(Value::as_str);
        let version_id = object
            .get("meta")
            .and_then(Value::as_object)
            .and_then(|meta| meta.get("versionId"))
            .and_then(Value::as_str);

        let key = match (resource_id, version_id) {
            (Some(id), Some(version)) => Self::create_versioned(type_name, id, version)?,
            (Some(id), None) => Self::create_with_id(type_name, id)?,
            (None, None) => Self::create(type_name)?,
            (None, Some(_)) => {
                return Err(KeyError::invalid(
                    "resource carries meta.versionId without an id",
                ));
            }
        };

        Ok(Some(match base {
            Some(base) => key.with_base(base),
            None => key,
        }))
    }

    /// Writes this key's identity fields onto a resource.
    ///
    /// Sets or removes `id` and `meta.versionId` so the resource matches
    /// the key exactly; stamping the same key twice leaves the resource in
    /// an identical state. A resource whose `resourceType` disagrees with
    /// the key is rejected.
    pub fn stamp(&self, resource: &mut Value) -> KeyResult<()> {
        let Some(object) = resource.as_object_mut() else {
            return Err(KeyError::invalid("cannot stamp a non-object resource"));
        };

        if let Some(resource_type) = object.get("resourceType").and_then(Value::as_str)
            && resource_type != self.type_name
        {
            return Err(KeyError::invalid(format!(
                "key type '{}' does not match resource type '{}'",
                self.type_name, resource_type
            )));
        }

        match &self.resource_id {
            Some(id) => {
                object.insert("id".to_string(), Value::String(id.clone()));
            }
            None => {
                object.remove("id");
            }
        }

        match &self.version_id {
            Some(version) => {
                let meta = object
                    .entry("meta")
                    .or_insert_with(|| Value::Object(Map::new()));
                let Some(meta) = meta.as_object_mut() else {
                    return Err(KeyError::invalid("resource meta is not an object"));
                };
                meta.insert("versionId".to_string(), Value::String(version.clone()));
            }
            None => {
                let remove_meta = match object.get_mut("meta").and_then(Value::as_object_mut) {
                    Some(meta) => {
                        meta.remove("versionId");
                        meta.is_empty()
                    }
                    None => false,
                };
                if remove_meta {
                    object.remove("meta");
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri_string())
    }
}

/// FHIR resource type names start with an uppercase ASCII letter and are
/// alphanumeric ("Patient", "MedicationRequest").
fn looks_like_type_name(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => chars.all(|c| c.is_ascii_alphanumeric()),
        _ => false,
    }
}
