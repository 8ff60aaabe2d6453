//! Image resolution: downloads and decodes card photos and backgrounds.
//!
//! `ImageResolver` handles all fetching concerns so that the deck stays a
//! pure data model with no HTTP knowledge. Resolution walks the deck one
//! card at a time — a failed photo is logged and its slot stays empty,
//! and the rest of the batch carries on.

use std::collections::HashMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;

use super::{Deck, PlacedContent, RenderedCard};
use crate::error::CardstockError;

/// Decoded images keyed by their source string (URL or data URI).
#[derive(Default)]
pub struct ResolvedImages {
    images: HashMap<String, DynamicImage>,
}

impl ResolvedImages {
    pub fn get(&self, source: &str) -> Option<&DynamicImage> {
        self.images.get(source)
    }

    pub fn insert(&mut self, source: impl Into<String>, image: DynamicImage) {
        self.images.insert(source.into(), image);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Fetches and caches the external images a deck needs.
pub struct ImageResolver {
    client: reqwest::Client,
    cache: HashMap<String, DynamicImage>,
}

impl ImageResolver {
    pub fn new() -> Result<Self, CardstockError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cardstock/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CardstockError::Image(format!("HTTP client error: {e}")))?;
        Ok(Self {
            client,
            cache: HashMap::new(),
        })
    }

    /// Fetch a single source: inline data URIs decode locally, anything
    /// else downloads over HTTP. Results are cached per resolver.
    pub async fn fetch(&mut self, source: &str) -> Result<DynamicImage, CardstockError> {
        if let Some(image) = self.cache.get(source) {
            return Ok(image.clone());
        }

        let image = if source.starts_with("data:") {
            decode_data_uri(source)?
        } else {
            let response = self
                .client
                .get(source)
                .send()
                .await
                .map_err(|e| CardstockError::Image(format!("Failed to download {source}: {e}")))?;
            if !response.status().is_success() {
                return Err(CardstockError::Image(format!(
                    "Failed to download {source}: HTTP {}",
                    response.status()
                )));
            }
            let bytes = response
                .bytes()
                .await
                .map_err(|e| CardstockError::Image(format!("Failed to read image data: {e}")))?;
            image::load_from_memory(&bytes)
                .map_err(|e| CardstockError::Image(format!("Failed to decode image: {e}")))?
        };

        self.cache.insert(source.to_string(), image.clone());
        Ok(image)
    }

    /// Resolve every image a deck references, one card at a time.
    ///
    /// Failures are logged and skipped; the returned map simply lacks the
    /// failed sources, so their slots render empty.
    pub async fn resolve_deck(&mut self, deck: &Deck) -> ResolvedImages {
        let mut resolved = ResolvedImages::default();
        for (index, card) in deck.cards.iter().enumerate() {
            for source in card_sources(card) {
                if resolved.get(source).is_some() {
                    continue;
                }
                match self.fetch(source).await {
                    Ok(image) => resolved.insert(source, image),
                    Err(e) => log::warn!("card {index}: skipping image {source:?}: {e}"),
                }
            }
        }
        resolved
    }
}

/// All image sources one card references: the side background plus every
/// populated image slot.
fn card_sources(card: &RenderedCard) -> impl Iterator<Item = &str> {
    card.page_style
        .background_image
        .as_deref()
        .filter(|s| super::acceptable_image_source(s))
        .into_iter()
        .chain(card.elements.iter().filter_map(|e| match &e.content {
            PlacedContent::Image(img) => img.source.as_deref(),
            PlacedContent::Text(_) => None,
        }))
}

/// Decode an inline `data:<mime>;base64,<payload>` URI.
fn decode_data_uri(uri: &str) -> Result<DynamicImage, CardstockError> {
    let payload = uri
        .split_once("base64,")
        .map(|(_, p)| p)
        .ok_or_else(|| CardstockError::Image("unsupported data URI encoding".into()))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| CardstockError::Image(format!("invalid data URI payload: {e}")))?;
    image::load_from_memory(&bytes)
        .map_err(|e| CardstockError::Image(format!("Failed to decode image: {e}")))
}
