//! # Cardstock - ID-Card Template Engine
//!
//! Cardstock turns JSON card-layout templates into printable ID-card
//! sheets. It provides:
//!
//! - **Template model**: positioned text/image fields with defaulted
//!   styles and stable session ids
//! - **Editor session**: selection, display groups, linked master
//!   colors, pointer drags, keyed snapshot persistence
//! - **Serializer**: clean export of the selected fields, ids stripped
//! - **Renderer**: record interpolation, QR identifiers, pagination,
//!   and raster composition of A4 print sheets
//!
//! ## Quick Start
//!
//! ```no_run
//! use cardstock::editor::EditorSession;
//! use cardstock::render::{CARDS_PER_SHEET, Record, paginate, render_deck};
//! use cardstock::template::{Face, FieldIdGen, Template};
//!
//! // Load and normalize a fetched template
//! let mut ids = FieldIdGen::new();
//! let template = Template::from_json(
//!     r#"{"front": {"items": [{"type": "text", "text": "{{name}}"}]}}"#,
//!     &mut ids,
//! )?;
//!
//! // Edit it in a session (selection, colors, drags)
//! let session = EditorSession::new("student", "1", template, None);
//! let clean = session.export(&[Face::Front, Face::Back])?;
//!
//! // Hydrate against records and paginate into sheets
//! let mut record = Record::new("student");
//! record.set("name", "ASHA");
//! let deck = render_deck(session.template(), &[record])?;
//! let sheets = paginate(deck.cards, CARDS_PER_SHEET);
//!
//! # Ok::<(), cardstock::error::CardstockError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`template`] | Document model, normalization, clean export |
//! | [`editor`] | Editor session and snapshot persistence |
//! | [`render`] | Card renderer, print compositor, image resolution |
//! | [`bundle`] | CSV + PNG zip bundles |
//! | [`store`] | Keyed record-store contract, enrollment numbers |
//! | [`server`] | HTTP API for the editor and print pipeline |
//! | [`error`] | Error types |

pub mod bundle;
pub mod editor;
pub mod error;
pub mod render;
pub mod server;
pub mod store;
pub mod template;

// Re-exports for convenience
pub use editor::EditorSession;
pub use error::CardstockError;
pub use template::{Face, Field, Template};
