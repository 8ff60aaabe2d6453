//! # Card Renderer / Print Compositor
//!
//! Hydrates a template against data records to produce positioned visual
//! cards, then paginates them into fixed-size print sheets.
//!
//! The pipeline is pure data up to rasterization:
//!
//! 1. [`render_card`] resolves one side of the template against one
//!    record: bookmark position overrides, `{{token}}` interpolation,
//!    image source validation.
//! 2. [`render_deck`] produces a front card and (for two-sided templates)
//!    a paired back card per record, preserving record order, and
//!    attaches the scannable identifier.
//! 3. [`paginate`] partitions the deck into sheets of ten.
//! 4. [`raster::Rasterizer`] turns cards and sheets into PNG-ready
//!    images, with photos resolved up front by [`resolve::ImageResolver`].

pub mod identifier;
pub mod interpolate;
pub mod raster;
pub mod resolve;

pub use identifier::Identifier;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::CardstockError;
use crate::template::{Face, FieldKind, PageStyle, Px, Template};

/// Default card canvas size when the page style gives no dimensions:
/// 2.125in x 3.375in portrait at 96 dpi.
pub const DEFAULT_CARD_WIDTH: f64 = 204.0;
pub const DEFAULT_CARD_HEIGHT: f64 = 324.0;

/// Cards per print sheet.
pub const CARDS_PER_SHEET: usize = 10;

/// One data record, as handed over by the data-selection screens: a flat
/// mapping of lower-cased field names to string values plus a `type`
/// discriminator (`student`, `staff`, or anything else).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    values: HashMap<String, String>,
}

impl Record {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            values: HashMap::new(),
        }
    }

    /// Insert a value; keys are stored lower-cased.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.values.insert(name.to_lowercase(), value.into());
        self
    }

    /// Look up a value by case-insensitive name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(&name.to_lowercase()).map(String::as_str)
    }

    /// All field names this record carries (excluding the `type`
    /// discriminator), in no particular order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// A text run placed on a card.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub value: String,
    pub font_size: f64,
    pub color: String,
    pub weight: String,
    pub family: String,
}

/// An image slot placed on a card. `source` is `None` when the field had
/// no acceptable source for this record (the slot renders empty).
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedImage {
    pub source: Option<String>,
    pub width: f64,
    pub height: f64,
    pub border_width: f64,
    pub border_color: String,
    pub border_radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlacedContent {
    Text(PlacedText),
    Image(PlacedImage),
}

/// One absolutely-positioned element within a card canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedElement {
    pub left: f64,
    pub top: f64,
    pub content: PlacedContent,
}

/// A fully resolved visual card.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCard {
    pub face: Face,
    pub width: f64,
    pub height: f64,
    pub page_style: PageStyle,
    pub elements: Vec<PlacedElement>,
    pub identifier: Option<Identifier>,
}

/// An ordered run of rendered cards. Rebuilt from scratch on every
/// [`render_deck`] call; there is no mid-sequence resume.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deck {
    pub cards: Vec<RenderedCard>,
}

/// One print sheet's worth of cards, in deck order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub cards: Vec<RenderedCard>,
}

/// Accept only sources the card canvas can actually show: http(s) URLs
/// and inline data URIs.
pub fn acceptable_image_source(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://") || source.starts_with("data:")
}

/// Render one side of the template against a record.
///
/// Field values resolve in three steps: bookmark position overrides
/// (`<bookmark>_left` / `<bookmark>_top` record keys), `{{token}}`
/// interpolation (missing keys become empty strings), and image source
/// lookup (`record[bookmark]`, else the field's own `src`/`text`;
/// anything that is not an http(s) URL or data URI renders as an empty
/// slot).
pub fn render_card(
    template: &Template,
    face: Face,
    record: &Record,
) -> Result<RenderedCard, CardstockError> {
    let side = template
        .side(face)
        .ok_or_else(|| CardstockError::Render(format!("template has no {face} side")))?;

    let width = side
        .page_style
        .width
        .map_or(DEFAULT_CARD_WIDTH, Px::value);
    let height = side
        .page_style
        .height
        .map_or(DEFAULT_CARD_HEIGHT, Px::value);

    let mut elements = Vec::with_capacity(side.items.len());
    for field in &side.items {
        let mut left = field.left.value();
        let mut top = field.top.value();

        // A record can carry a saved per-record position from a prior
        // drag; it overrides the field's own geometry.
        if let Some(bookmark) = &field.bookmark {
            if let Some(l) = record.get(&format!("{bookmark}_left")).and_then(Px::parse) {
                left = l.value();
            }
            if let Some(t) = record.get(&format!("{bookmark}_top")).and_then(Px::parse) {
                top = t.value();
            }
        }

        let content = match field.kind {
            FieldKind::Text => PlacedContent::Text(PlacedText {
                value: interpolate::interpolate(field.text.as_deref().unwrap_or(""), record),
                font_size: field.font_size.map_or(16.0, Px::value),
                color: field.color.clone().unwrap_or_else(|| "#000000".into()),
                weight: field.font_weight.clone().unwrap_or_else(|| "normal".into()),
                family: field.font_family.clone().unwrap_or_else(|| "Arial".into()),
            }),
            FieldKind::Image => {
                let candidate = field
                    .bookmark
                    .as_deref()
                    .and_then(|b| record.get(b))
                    .or(field.src.as_deref())
                    .or(field.text.as_deref())
                    .unwrap_or("");
                let source = if candidate.is_empty() {
                    None
                } else if acceptable_image_source(candidate) {
                    Some(candidate.to_string())
                } else {
                    log::warn!("rejecting image source {candidate:?}: not a URL or data URI");
                    None
                };
                PlacedContent::Image(PlacedImage {
                    source,
                    width: field.width.map_or(0.0, Px::value),
                    height: field.height.map_or(0.0, Px::value),
                    border_width: field.border_width.map_or(0.0, Px::value),
                    border_color: field.border_color.clone().unwrap_or_else(|| "#000000".into()),
                    border_radius: field.border_radius.map_or(0.0, Px::value),
                })
            }
        };

        elements.push(PlacedElement { left, top, content });
    }

    Ok(RenderedCard {
        face,
        width,
        height,
        page_style: side.page_style.clone(),
        elements,
        identifier: None,
    })
}

/// Attach the record's scannable identifier to a card.
pub fn append_identifier(card: &mut RenderedCard, record: &Record) {
    card.identifier = Some(identifier::for_record(record));
}

/// Render the whole deck: for every record a front card and, for
/// two-sided templates, a paired back card; record order is preserved.
/// The identifier lands on the back card when there is one, else on the
/// front.
pub fn render_deck(template: &Template, records: &[Record]) -> Result<Deck, CardstockError> {
    let mut cards = Vec::with_capacity(records.len() * 2);
    for record in records {
        let mut front = render_card(template, Face::Front, record)?;
        if template.is_two_sided() {
            let mut back = render_card(template, Face::Back, record)?;
            append_identifier(&mut back, record);
            cards.push(front);
            cards.push(back);
        } else {
            append_identifier(&mut front, record);
            cards.push(front);
        }
    }
    Ok(Deck { cards })
}

/// Partition cards into sheets of `per_sheet` (the last may be partial),
/// preserving card order across sheet boundaries.
pub fn paginate(cards: Vec<RenderedCard>, per_sheet: usize) -> Vec<Sheet> {
    let per_sheet = per_sheet.max(1);
    let mut sheets = Vec::with_capacity(cards.len().div_ceil(per_sheet));
    let mut cards = cards.into_iter();
    loop {
        let chunk: Vec<_> = cards.by_ref().take(per_sheet).collect();
        if chunk.is_empty() {
            break;
        }
        sheets.push(Sheet { cards: chunk });
    }
    sheets
}
