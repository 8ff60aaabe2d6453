//! # Card Template Document Model
//!
//! A single type hierarchy that is both the Rust API and the JSON wire
//! format. `Template` is constructible in Rust and deserializable from the
//! JSON documents the admin pages fetch, upload, and download.
//!
//! ```ignore
//! use cardstock::template::*;
//!
//! // JSON deserialization + normalization
//! let mut ids = FieldIdGen::new();
//! let template = Template::from_json(
//!     r#"{"front": {"items": [{"type": "text", "text": "{{name}}"}]}}"#,
//!     &mut ids,
//! )?;
//!
//! // Rust construction
//! let side = template.side(Face::Front).unwrap();
//! assert_eq!(side.items.len(), 1);
//! ```
//!
//! Normalization ensures every side has an items list and a page style,
//! assigns a unique id to every field lacking one, and fills defaulted
//! style attributes. It is idempotent: a second pass changes nothing.

mod field;

pub mod export;

pub use field::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::CardstockError;

/// Which side of the card a field lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Face {
    Front,
    Back,
}

impl Face {
    pub fn opposite(self) -> Face {
        match self {
            Face::Front => Face::Back,
            Face::Back => Face::Front,
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Face::Front => write!(f, "front"),
            Face::Back => write!(f, "back"),
        }
    }
}

/// Card-level style attributes.
///
/// A closed set of recognized keys; anything else a template carries is
/// collected during deserialization and discarded (with a log line) when
/// the template is normalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Px>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Px>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_repeat: Option<String>,
    /// Unrecognized style keys, dropped at normalization.
    #[serde(flatten)]
    unrecognized: BTreeMap<String, serde_json::Value>,
}

impl PageStyle {
    /// Drop unrecognized keys, logging each one.
    fn discard_unrecognized(&mut self) {
        for key in self.unrecognized.keys() {
            log::debug!("ignoring unrecognized page style key: {key}");
        }
        self.unrecognized.clear();
    }
}

/// One side of a card: page-level style plus an ordered list of fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Side {
    #[serde(default)]
    pub page_style: PageStyle,
    #[serde(default)]
    pub items: Vec<Field>,
}

impl Side {
    fn normalize(&mut self, ids: &mut FieldIdGen) {
        self.page_style.discard_unrecognized();
        for field in &mut self.items {
            if field.id.is_unset() {
                field.id = ids.next_id();
            }
            field.apply_defaults();
        }
    }

    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.items.iter().find(|f| f.id == id)
    }

    pub fn field_mut(&mut self, id: FieldId) -> Option<&mut Field> {
        self.items.iter_mut().find(|f| f.id == id)
    }

    pub fn contains(&self, id: FieldId) -> bool {
        self.field(id).is_some()
    }
}

/// A card template: a required front side and an optional back side.
///
/// A template is two-sided iff `back` is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub front: Side,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back: Option<Side>,
}

impl Template {
    /// An empty usable template, the fallback after a failed load.
    pub fn empty() -> Self {
        Self {
            front: Side::default(),
            back: None,
        }
    }

    /// Parse and normalize a template document.
    ///
    /// A document without a `front` side is a load failure; the caller is
    /// expected to fall back to [`Template::empty`] and surface the error.
    pub fn from_json(json: &str, ids: &mut FieldIdGen) -> Result<Self, CardstockError> {
        let mut template: Template =
            serde_json::from_str(json).map_err(|e| CardstockError::Load(e.to_string()))?;
        template.normalize(ids);
        Ok(template)
    }

    /// Assign ids to id-less fields and fill defaulted attributes.
    ///
    /// Idempotent apart from id assignment, and after a first pass no
    /// field is left without an id, so a second pass is a no-op.
    pub fn normalize(&mut self, ids: &mut FieldIdGen) {
        self.front.normalize(ids);
        if let Some(back) = &mut self.back {
            back.normalize(ids);
        }
    }

    pub fn is_two_sided(&self) -> bool {
        self.back.is_some()
    }

    pub fn side(&self, face: Face) -> Option<&Side> {
        match face {
            Face::Front => Some(&self.front),
            Face::Back => self.back.as_ref(),
        }
    }

    pub fn side_mut(&mut self, face: Face) -> Option<&mut Side> {
        match face {
            Face::Front => Some(&mut self.front),
            Face::Back => self.back.as_mut(),
        }
    }

    /// Back side, materialized on first use.
    pub fn back_mut(&mut self) -> &mut Side {
        self.back.get_or_insert_with(Side::default)
    }

    /// Locate a field by id, either side.
    pub fn find(&self, id: FieldId) -> Option<(Face, &Field)> {
        if let Some(f) = self.front.field(id) {
            return Some((Face::Front, f));
        }
        self.back
            .as_ref()
            .and_then(|s| s.field(id))
            .map(|f| (Face::Back, f))
    }

    /// Locate a field by id, either side, mutably.
    pub fn find_mut(&mut self, id: FieldId) -> Option<(Face, &mut Field)> {
        if self.front.contains(id) {
            return self.front.field_mut(id).map(|f| (Face::Front, f));
        }
        self.back
            .as_mut()
            .and_then(|s| s.field_mut(id))
            .map(|f| (Face::Back, f))
    }

    /// Total field count across both sides.
    pub fn field_count(&self) -> usize {
        self.front.items.len() + self.back.as_ref().map_or(0, |s| s.items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn two_sided_json() -> &'static str {
        r##"{
            "front": {
                "pageStyle": {"width": "204px", "height": "324px", "backgroundColor": "#ffffff"},
                "items": [
                    {"type": "text", "text": "Name:", "left": "10px", "top": "20px"},
                    {"type": "text", "text": "{{name}}", "left": "60px", "top": "20px"},
                    {"type": "image", "src": "https://photos.example/p.png", "bookmark": "photo"}
                ]
            },
            "back": {
                "items": [
                    {"type": "text", "text": "Issued by the school office"}
                ]
            }
        }"##
    }

    #[test]
    fn test_from_json_assigns_unique_ids() {
        let mut ids = FieldIdGen::new();
        let template = Template::from_json(two_sided_json(), &mut ids).unwrap();

        let mut seen = std::collections::HashSet::new();
        for field in template
            .front
            .items
            .iter()
            .chain(&template.back.as_ref().unwrap().items)
        {
            assert!(!field.id.is_unset());
            assert!(seen.insert(field.id), "duplicate id {}", field.id);
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut ids = FieldIdGen::new();
        let mut template = Template::from_json(two_sided_json(), &mut ids).unwrap();
        let once = template.clone();
        template.normalize(&mut ids);
        assert_eq!(template, once);
    }

    #[test]
    fn test_missing_front_is_load_failure() {
        let mut ids = FieldIdGen::new();
        let err = Template::from_json(r#"{"back": {"items": []}}"#, &mut ids).unwrap_err();
        assert!(matches!(err, CardstockError::Load(_)));
    }

    #[test]
    fn test_unrecognized_page_style_keys_are_dropped() {
        let mut ids = FieldIdGen::new();
        let json = r##"{
            "front": {
                "pageStyle": {"backgroundColor": "#fff", "zIndex": "3", "cursor": "grab"},
                "items": []
            }
        }"##;
        let template = Template::from_json(json, &mut ids).unwrap();
        assert_eq!(
            template.front.page_style.background_color.as_deref(),
            Some("#fff")
        );

        let out = serde_json::to_value(&template).unwrap();
        assert!(out["front"]["pageStyle"].get("zIndex").is_none());
        assert!(out["front"]["pageStyle"].get("cursor").is_none());
    }

    #[test]
    fn test_groups_default_by_heuristic() {
        let mut ids = FieldIdGen::new();
        let template = Template::from_json(two_sided_json(), &mut ids).unwrap();
        let groups: Vec<_> = template.front.items.iter().map(|f| f.group).collect();
        assert_eq!(
            groups,
            vec![Some(Group::Label), Some(Group::Value), Some(Group::Photo)]
        );
    }

    #[test]
    fn test_find_locates_fields_on_both_sides() {
        let mut ids = FieldIdGen::new();
        let template = Template::from_json(two_sided_json(), &mut ids).unwrap();
        let back_id = template.back.as_ref().unwrap().items[0].id;
        let (face, field) = template.find(back_id).unwrap();
        assert_eq!(face, Face::Back);
        assert_eq!(field.text.as_deref(), Some("Issued by the school office"));
        assert!(template.find(FieldId(999)).is_none());
    }

    #[test]
    fn test_back_mut_materializes_side() {
        let mut template = Template::empty();
        assert!(!template.is_two_sided());
        template.back_mut().items.push(Field::text("x"));
        assert!(template.is_two_sided());
        assert_eq!(template.field_count(), 1);
    }

    #[test]
    fn test_ids_survive_serialization_roundtrip() {
        let mut ids = FieldIdGen::new();
        let template = Template::from_json(two_sided_json(), &mut ids).unwrap();
        let json = serde_json::to_string(&template).unwrap();
        let restored: Template = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, template);
    }
}
