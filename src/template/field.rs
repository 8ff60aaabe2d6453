//! Field types for the card template model.
//!
//! All types derive `Serialize + Deserialize` so the same structs work for
//! fetched template JSON, snapshot persistence, and clean export. The wire
//! format is camelCase, matching the template documents the admin pages
//! exchange.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default text styling applied during normalization.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;
pub const DEFAULT_COLOR: &str = "#000000";
pub const DEFAULT_FONT_WEIGHT: &str = "normal";
pub const DEFAULT_FONT_FAMILY: &str = "Arial";

/// Default image styling applied during normalization.
pub const DEFAULT_IMAGE_SIZE: f64 = 96.0;
pub const DEFAULT_BORDER_WIDTH: f64 = 0.0;
pub const DEFAULT_BORDER_STYLE: &str = "solid";
pub const DEFAULT_BORDER_RADIUS: f64 = 0.0;

fn default_true() -> bool {
    true
}

/// A CSS pixel length.
///
/// Serializes as `"12px"`. Deserializes from a bare number, a numeric
/// string, or a `px`-suffixed string, so templates authored by hand and
/// templates produced by the editor both parse.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Px(pub f64);

impl Px {
    pub fn new(value: f64) -> Self {
        Px(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Parse a length string: `"12px"`, `"12"`, `"12.5px"`.
    pub fn parse(s: &str) -> Option<Px> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_suffix("px").unwrap_or(trimmed);
        trimmed.trim().parse::<f64>().ok().map(Px)
    }
}

impl fmt::Display for Px {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{}px", self.0 as i64)
        } else {
            write!(f, "{}px", self.0)
        }
    }
}

impl Serialize for Px {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Px {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(f64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => Ok(Px(n)),
            Raw::Str(s) => Px::parse(&s)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid length: {s:?}"))),
        }
    }
}

/// Session-stable field identifier.
///
/// Zero means "not yet assigned". Normalization assigns ids from a
/// monotonic generator; assigned ids are kept in snapshots but never
/// appear in exported templates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FieldId(pub u64);

impl FieldId {
    pub const UNSET: FieldId = FieldId(0);

    pub fn is_unset(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic field-id generator.
///
/// Ids start at 1 and are never handed out twice, including across a
/// snapshot save/restore cycle (the generator is persisted with the
/// snapshot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldIdGen {
    next: u64,
}

impl FieldIdGen {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> FieldId {
        let id = FieldId(self.next);
        self.next += 1;
        id
    }
}

impl Default for FieldIdGen {
    fn default() -> Self {
        Self::new()
    }
}

/// Field content kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Image,
}

/// Display group a field belongs to.
///
/// Groups drive bulk color edits: text groups sync `color`, the photo
/// group syncs `borderColor`. Photo fields are always images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Label,
    Value,
    Photo,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::Label => write!(f, "label"),
            Group::Value => write!(f, "value"),
            Group::Photo => write!(f, "photo"),
        }
    }
}

/// One positioned element on a card side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Internal identifier; unset ids are omitted on the wire.
    #[serde(default, skip_serializing_if = "FieldId::is_unset")]
    pub id: FieldId,
    #[serde(rename = "type")]
    pub kind: FieldKind,

    #[serde(default)]
    pub left: Px,
    #[serde(default)]
    pub top: Px,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Px>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Px>,

    /// Literal text or a `{{token}}` placeholder template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Image source: URL or inline data URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Key used by the renderer to look up per-record overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Group>,
    /// Linked fields follow their group's master color.
    #[serde(default = "default_true")]
    pub is_linked: bool,

    // Text styling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<Px>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,

    // Image styling. `border` is derived from width/style/color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<Px>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<Px>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<String>,
}

impl Field {
    /// Create a text field with content at the origin.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            id: FieldId::UNSET,
            kind: FieldKind::Text,
            left: Px::default(),
            top: Px::default(),
            width: None,
            height: None,
            text: Some(content.into()),
            src: None,
            bookmark: None,
            group: None,
            is_linked: true,
            font_size: None,
            color: None,
            font_weight: None,
            font_family: None,
            border_width: None,
            border_style: None,
            border_color: None,
            border_radius: None,
            border: None,
        }
    }

    /// Create an image field with a source at the origin.
    pub fn image(src: impl Into<String>) -> Self {
        Self {
            kind: FieldKind::Image,
            src: Some(src.into()),
            text: None,
            ..Self::text("")
        }
    }

    /// Group inferred from kind and text content: images are photos,
    /// text ending with a colon is a label, everything else a value.
    pub fn default_group(&self) -> Group {
        match self.kind {
            FieldKind::Image => Group::Photo,
            FieldKind::Text => {
                if self
                    .text
                    .as_deref()
                    .is_some_and(|t| t.trim_end().ends_with(':'))
                {
                    Group::Label
                } else {
                    Group::Value
                }
            }
        }
    }

    /// Fill missing style attributes and the display group.
    ///
    /// Already-set attributes are left alone, so running this twice is a
    /// no-op. A photo group on a text field is invalid input and falls
    /// back to the inferred group.
    pub fn apply_defaults(&mut self) {
        if self.group.is_none() || (self.group == Some(Group::Photo) && self.kind != FieldKind::Image)
        {
            self.group = Some(self.default_group());
        }

        match self.kind {
            FieldKind::Text => {
                self.font_size.get_or_insert(Px(DEFAULT_FONT_SIZE));
                self.color.get_or_insert_with(|| DEFAULT_COLOR.to_string());
                self.font_weight
                    .get_or_insert_with(|| DEFAULT_FONT_WEIGHT.to_string());
                self.font_family
                    .get_or_insert_with(|| DEFAULT_FONT_FAMILY.to_string());
            }
            FieldKind::Image => {
                self.width.get_or_insert(Px(DEFAULT_IMAGE_SIZE));
                self.height.get_or_insert(Px(DEFAULT_IMAGE_SIZE));
                self.border_width.get_or_insert(Px(DEFAULT_BORDER_WIDTH));
                self.border_style
                    .get_or_insert_with(|| DEFAULT_BORDER_STYLE.to_string());
                self.border_color
                    .get_or_insert_with(|| DEFAULT_COLOR.to_string());
                self.border_radius.get_or_insert(Px(DEFAULT_BORDER_RADIUS));
                self.sync_border();
            }
        }
    }

    /// Recompute the composite `border` string from its components.
    pub fn sync_border(&mut self) {
        let width = self.border_width.unwrap_or(Px(DEFAULT_BORDER_WIDTH));
        let style = self.border_style.as_deref().unwrap_or(DEFAULT_BORDER_STYLE);
        let color = self.border_color.as_deref().unwrap_or(DEFAULT_COLOR);
        self.border = Some(format!("{width} {style} {color}"));
    }

    /// Apply a group master color to this field's synced property.
    ///
    /// Text groups sync `color`; the photo group syncs `borderColor` and
    /// refreshes the composite `border` string.
    pub fn apply_group_color(&mut self, group: Group, value: &str) {
        match group {
            Group::Label | Group::Value => {
                self.color = Some(value.to_string());
            }
            Group::Photo => {
                self.border_color = Some(value.to_string());
                self.sync_border();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_px_parse() {
        assert_eq!(Px::parse("12px"), Some(Px(12.0)));
        assert_eq!(Px::parse("12.5px"), Some(Px(12.5)));
        assert_eq!(Px::parse(" 8 "), Some(Px(8.0)));
        assert_eq!(Px::parse("abc"), None);
    }

    #[test]
    fn test_px_display_trims_integers() {
        assert_eq!(Px(12.0).to_string(), "12px");
        assert_eq!(Px(12.5).to_string(), "12.5px");
        assert_eq!(Px(0.0).to_string(), "0px");
    }

    #[test]
    fn test_px_deserialize_number_and_string() {
        let a: Px = serde_json::from_str("12").unwrap();
        let b: Px = serde_json::from_str("\"12px\"").unwrap();
        let c: Px = serde_json::from_str("\"12\"").unwrap();
        assert_eq!(a, Px(12.0));
        assert_eq!(b, Px(12.0));
        assert_eq!(c, Px(12.0));
        assert!(serde_json::from_str::<Px>("\"wide\"").is_err());
    }

    #[test]
    fn test_field_id_gen_monotonic() {
        let mut ids = FieldIdGen::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert_eq!(a, FieldId(1));
        assert_eq!(b, FieldId(2));
        assert!(!a.is_unset());
        assert!(FieldId::UNSET.is_unset());
    }

    #[test]
    fn test_default_group_heuristic() {
        assert_eq!(Field::text("Name:").default_group(), Group::Label);
        assert_eq!(Field::text("{{name}}").default_group(), Group::Value);
        assert_eq!(Field::image("https://x/p.png").default_group(), Group::Photo);
    }

    #[test]
    fn test_apply_defaults_text() {
        let mut field = Field::text("Name:");
        field.apply_defaults();
        assert_eq!(field.group, Some(Group::Label));
        assert_eq!(field.font_size, Some(Px(DEFAULT_FONT_SIZE)));
        assert_eq!(field.color.as_deref(), Some(DEFAULT_COLOR));
        assert!(field.border.is_none());
    }

    #[test]
    fn test_apply_defaults_image_border_composite() {
        let mut field = Field::image("https://x/p.png");
        field.border_width = Some(Px(2.0));
        field.border_color = Some("#ff0000".into());
        field.apply_defaults();
        assert_eq!(field.border.as_deref(), Some("2px solid #ff0000"));
    }

    #[test]
    fn test_apply_defaults_idempotent() {
        let mut field = Field::image("https://x/p.png");
        field.apply_defaults();
        let once = field.clone();
        field.apply_defaults();
        assert_eq!(field, once);
    }

    #[test]
    fn test_photo_group_on_text_field_is_reset() {
        let mut field = Field::text("Name:");
        field.group = Some(Group::Photo);
        field.apply_defaults();
        assert_eq!(field.group, Some(Group::Label));
    }

    #[test]
    fn test_apply_group_color() {
        let mut text = Field::text("x");
        text.apply_group_color(Group::Value, "#123456");
        assert_eq!(text.color.as_deref(), Some("#123456"));

        let mut photo = Field::image("https://x/p.png");
        photo.apply_defaults();
        photo.apply_group_color(Group::Photo, "#abcdef");
        assert_eq!(photo.border_color.as_deref(), Some("#abcdef"));
        assert_eq!(photo.border.as_deref(), Some("0px solid #abcdef"));
    }

    #[test]
    fn test_field_wire_format_camel_case() {
        let json = r#"{"type": "text", "text": "Name:", "fontSize": "14px", "isLinked": false}"#;
        let field: Field = serde_json::from_str(json).unwrap();
        assert_eq!(field.kind, FieldKind::Text);
        assert_eq!(field.font_size, Some(Px(14.0)));
        assert!(!field.is_linked);

        let out = serde_json::to_value(&field).unwrap();
        assert_eq!(out["fontSize"], "14px");
        assert!(out.get("id").is_none(), "unset ids must not serialize");
    }
}
