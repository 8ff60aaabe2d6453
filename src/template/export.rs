//! Clean template export.
//!
//! Produces the downloadable template document: only the included sides,
//! only the selected fields, no internal ids. A side left with zero
//! retained fields is omitted entirely, so the output type keeps both
//! sides optional.

use serde::Serialize;
use std::collections::BTreeSet;

use super::{Face, FieldId, Side, Template};
use crate::error::CardstockError;

/// An exported template document. Unlike [`Template`], the front side is
/// optional here: export omits any side with nothing selected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front: Option<Side>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back: Option<Side>,
}

impl CleanTemplate {
    pub fn field_count(&self) -> usize {
        self.front.as_ref().map_or(0, |s| s.items.len())
            + self.back.as_ref().map_or(0, |s| s.items.len())
    }
}

/// Export the selected fields of the included sides as a clean document.
///
/// Internal ids are stripped from every retained field. Errors when the
/// result would contain zero fields across all included sides.
pub fn export_template(
    template: &Template,
    front_selection: &BTreeSet<FieldId>,
    back_selection: &BTreeSet<FieldId>,
    sides: &[Face],
) -> Result<CleanTemplate, CardstockError> {
    let clean = CleanTemplate {
        front: sides
            .contains(&Face::Front)
            .then(|| clean_side(&template.front, front_selection))
            .flatten(),
        back: sides
            .contains(&Face::Back)
            .then(|| template.back.as_ref().and_then(|s| clean_side(s, back_selection)))
            .flatten(),
    };

    if clean.field_count() == 0 {
        return Err(CardstockError::Export("nothing to export".into()));
    }
    Ok(clean)
}

/// Retain the selected fields of one side, ids stripped. `None` when the
/// side ends up empty.
fn clean_side(side: &Side, selection: &BTreeSet<FieldId>) -> Option<Side> {
    let mut side = side.clone();
    side.items.retain(|f| selection.contains(&f.id));
    for field in &mut side.items {
        field.id = FieldId::UNSET;
    }
    (!side.items.is_empty()).then_some(side)
}
