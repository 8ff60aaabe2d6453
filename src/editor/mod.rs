//! # Editor Session
//!
//! One object owning the whole working state of the template editor: the
//! normalized template, per-side selection sets, display-group master
//! colors, drag state, and the field-id generator. Every mutating
//! operation saves a snapshot afterwards (when a store is attached), so a
//! reload restores the in-progress edit rather than the last-fetched
//! template.
//!
//! ```ignore
//! use cardstock::editor::EditorSession;
//! use cardstock::template::{Face, Group, Template};
//!
//! let mut session = EditorSession::new("student", "1", template, None);
//! session.set_master_color(Group::Label, "#aa0000");
//! session.begin_drag(Face::Front, id, (5.0, 5.0))?;
//! session.update_drag((30.0, 45.0));
//! session.end_drag();
//! let clean = session.export(&[Face::Front, Face::Back])?;
//! ```

pub mod snapshot;

pub use snapshot::{Snapshot, SnapshotStore};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::CardstockError;
use crate::template::export::{CleanTemplate, export_template};
use crate::template::{Face, Field, FieldId, FieldIdGen, FieldKind, Group, Px, Template};

/// Per-side sets of visible (selected) field ids.
///
/// Selections only ever reference ids currently present in the template;
/// removals and side moves prune stale entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionState {
    front: BTreeSet<FieldId>,
    back: BTreeSet<FieldId>,
}

impl SelectionState {
    pub fn side(&self, face: Face) -> &BTreeSet<FieldId> {
        match face {
            Face::Front => &self.front,
            Face::Back => &self.back,
        }
    }

    fn side_mut(&mut self, face: Face) -> &mut BTreeSet<FieldId> {
        match face {
            Face::Front => &mut self.front,
            Face::Back => &mut self.back,
        }
    }

    pub fn is_selected(&self, face: Face, id: FieldId) -> bool {
        self.side(face).contains(&id)
    }

    fn prune(&mut self, template: &Template) {
        self.front.retain(|id| template.front.contains(*id));
        match &template.back {
            Some(side) => self.back.retain(|id| side.contains(*id)),
            None => self.back.clear(),
        }
    }
}

/// Collapse/expand flags for the editor's side panels. Pure bookkeeping,
/// persisted with snapshots and never exported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiState {
    #[serde(default)]
    pub collapsed: BTreeMap<String, bool>,
}

/// An in-progress pointer drag. Exactly one may exist at a time.
#[derive(Debug, Clone, PartialEq)]
struct DragState {
    face: Face,
    field: FieldId,
    start: (f64, f64),
    pointer_start: (f64, f64),
    pointer: (f64, f64),
}

impl DragState {
    /// Current position, floored at zero on both axes.
    fn position(&self) -> (Px, Px) {
        let left = (self.start.0 + self.pointer.0 - self.pointer_start.0).max(0.0);
        let top = (self.start.1 + self.pointer.1 - self.pointer_start.1).max(0.0);
        (Px(left), Px(top))
    }
}

/// The template editor's working state.
pub struct EditorSession {
    id_type: String,
    template_type: String,
    template: Template,
    selection: SelectionState,
    ui: UiState,
    masters: BTreeMap<Group, String>,
    ids: FieldIdGen,
    drag: Option<DragState>,
    store: Option<SnapshotStore>,
}

impl EditorSession {
    /// Start a session from a freshly fetched template.
    ///
    /// The template is normalized with a fresh id generator and every
    /// field starts selected (visible).
    pub fn new(
        id_type: impl Into<String>,
        template_type: impl Into<String>,
        mut template: Template,
        store: Option<SnapshotStore>,
    ) -> Self {
        let mut ids = FieldIdGen::new();
        template.normalize(&mut ids);

        let mut selection = SelectionState::default();
        selection.front = template.front.items.iter().map(|f| f.id).collect();
        if let Some(back) = &template.back {
            selection.back = back.items.iter().map(|f| f.id).collect();
        }

        let session = Self {
            id_type: id_type.into(),
            template_type: template_type.into(),
            template,
            selection,
            ui: UiState::default(),
            masters: BTreeMap::new(),
            ids,
            drag: None,
            store,
        };
        session.persist();
        session
    }

    /// Resume a session from a stored snapshot.
    pub fn restore(snapshot: Snapshot, store: Option<SnapshotStore>) -> Self {
        let mut session = Self {
            id_type: snapshot.id_type,
            template_type: snapshot.template_type,
            template: snapshot.template,
            selection: snapshot.selection,
            ui: snapshot.ui,
            masters: BTreeMap::new(),
            ids: snapshot.ids,
            drag: None,
            store,
        };
        session.selection.prune(&session.template);
        session
    }

    pub fn id_type(&self) -> &str {
        &self.id_type
    }

    pub fn template_type(&self) -> &str {
        &self.template_type
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    /// Last-set master color for a group, if any.
    pub fn master_color(&self, group: Group) -> Option<&str> {
        self.masters.get(&group).map(String::as_str)
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Mark a field visible. `false` when the id is not on that side.
    pub fn select(&mut self, face: Face, id: FieldId) -> bool {
        let present = self.template.side(face).is_some_and(|s| s.contains(id));
        if !present {
            return false;
        }
        self.selection.side_mut(face).insert(id);
        self.persist();
        true
    }

    /// Hide a field. `false` when it was not selected.
    pub fn deselect(&mut self, face: Face, id: FieldId) -> bool {
        let removed = self.selection.side_mut(face).remove(&id);
        if removed {
            self.persist();
        }
        removed
    }

    pub fn select_all(&mut self, face: Face) {
        let ids: BTreeSet<_> = self
            .template
            .side(face)
            .map(|s| s.items.iter().map(|f| f.id).collect())
            .unwrap_or_default();
        *self.selection.side_mut(face) = ids;
        self.persist();
    }

    pub fn clear_all(&mut self, face: Face) {
        self.selection.side_mut(face).clear();
        self.persist();
    }

    pub fn is_selected(&self, face: Face, id: FieldId) -> bool {
        self.selection.is_selected(face, id)
    }

    // ------------------------------------------------------------------
    // Grouping and colors
    // ------------------------------------------------------------------

    /// Reassign a field's display group. Does not move it between sides.
    /// The photo group only accepts image fields.
    pub fn set_group(&mut self, id: FieldId, group: Group) -> Result<(), CardstockError> {
        let (_, field) = self
            .template
            .find_mut(id)
            .ok_or_else(|| CardstockError::Editor(format!("no field with id {id}")))?;
        if group == Group::Photo && field.kind != FieldKind::Image {
            return Err(CardstockError::Editor(
                "only image fields can join the photo group".into(),
            ));
        }
        field.group = Some(group);
        self.persist();
        Ok(())
    }

    /// Set a group's master color and push it to every linked member on
    /// both sides. Re-applying the same value changes nothing further.
    pub fn set_master_color(&mut self, group: Group, value: &str) {
        self.masters.insert(group, value.to_string());

        let sides = std::iter::once(&mut self.template.front).chain(self.template.back.as_mut());
        for side in sides {
            for field in &mut side.items {
                if field.group == Some(group) && field.is_linked {
                    field.apply_group_color(group, value);
                }
            }
        }
        self.persist();
    }

    /// Link or unlink a field from its group master. Relinking alone does
    /// not rewrite the color; the next master sync recaptures the field.
    pub fn set_linked(&mut self, id: FieldId, linked: bool) -> bool {
        let Some((_, field)) = self.template.find_mut(id) else {
            return false;
        };
        field.is_linked = linked;
        self.persist();
        true
    }

    /// Explicit per-field color edit. Overrides the synced value without
    /// clearing the link flag, so a later master sync takes over again.
    pub fn set_color(&mut self, id: FieldId, value: &str) -> bool {
        let Some((_, field)) = self.template.find_mut(id) else {
            return false;
        };
        match field.kind {
            FieldKind::Text => field.color = Some(value.to_string()),
            FieldKind::Image => {
                field.border_color = Some(value.to_string());
                field.sync_border();
            }
        }
        self.persist();
        true
    }

    /// Edit a field's text content (and, via the label heuristic, nothing
    /// else; the group stays as assigned).
    pub fn set_text(&mut self, id: FieldId, text: &str) -> bool {
        let Some((_, field)) = self.template.find_mut(id) else {
            return false;
        };
        field.text = Some(text.to_string());
        self.persist();
        true
    }

    // ------------------------------------------------------------------
    // Side moves
    // ------------------------------------------------------------------

    /// Move a field to the opposite side, migrating its selection
    /// membership. A move onto a missing back side materializes it.
    /// No-op (`false`) when the id is not on `face`.
    pub fn move_to_opposite_side(&mut self, face: Face, id: FieldId) -> bool {
        let Some(side) = self.template.side_mut(face) else {
            return false;
        };
        let Some(pos) = side.items.iter().position(|f| f.id == id) else {
            return false;
        };
        let field = side.items.remove(pos);
        let was_selected = self.selection.side_mut(face).remove(&id);

        match face.opposite() {
            Face::Front => self.template.front.items.push(field),
            Face::Back => self.template.back_mut().items.push(field),
        }
        if was_selected {
            self.selection.side_mut(face.opposite()).insert(id);
        }
        if self.drag.as_ref().is_some_and(|d| d.field == id) {
            self.drag = None;
        }
        self.persist();
        true
    }

    /// Append a new field to a side, selected by default.
    pub fn add_field(&mut self, face: Face, mut field: Field) -> FieldId {
        field.id = self.ids.next_id();
        field.apply_defaults();
        let id = field.id;
        match face {
            Face::Front => self.template.front.items.push(field),
            Face::Back => self.template.back_mut().items.push(field),
        }
        self.selection.side_mut(face).insert(id);
        self.persist();
        id
    }

    /// Remove a field from a side, pruning its selection entry.
    pub fn remove_field(&mut self, face: Face, id: FieldId) -> bool {
        let Some(side) = self.template.side_mut(face) else {
            return false;
        };
        let Some(pos) = side.items.iter().position(|f| f.id == id) else {
            return false;
        };
        side.items.remove(pos);
        self.selection.side_mut(face).remove(&id);
        if self.drag.as_ref().is_some_and(|d| d.field == id) {
            self.drag = None;
        }
        self.persist();
        true
    }

    // ------------------------------------------------------------------
    // Drag
    // ------------------------------------------------------------------

    /// Start dragging a field. Drags capture the pointer exclusively: a
    /// second `begin_drag` before `end_drag` is refused.
    pub fn begin_drag(
        &mut self,
        face: Face,
        id: FieldId,
        pointer: (f64, f64),
    ) -> Result<(), CardstockError> {
        if self.drag.is_some() {
            return Err(CardstockError::Editor("a drag is already in progress".into()));
        }
        let field = self
            .template
            .side(face)
            .and_then(|s| s.field(id))
            .ok_or_else(|| CardstockError::Editor(format!("no field {id} on {face} side")))?;
        self.drag = Some(DragState {
            face,
            field: id,
            start: (field.left.0, field.top.0),
            pointer_start: pointer,
            pointer,
        });
        Ok(())
    }

    /// Update the pointer position; returns the clamped preview position.
    pub fn update_drag(&mut self, pointer: (f64, f64)) -> Option<(Px, Px)> {
        let drag = self.drag.as_mut()?;
        drag.pointer = pointer;
        Some(drag.position())
    }

    /// Commit the drag: write the clamped position into the template and
    /// save a snapshot. Returns the final position.
    pub fn end_drag(&mut self) -> Option<(Px, Px)> {
        let drag = self.drag.take()?;
        let (left, top) = drag.position();
        if let Some(field) = self
            .template
            .side_mut(drag.face)
            .and_then(|s| s.field_mut(drag.field))
        {
            field.left = left;
            field.top = top;
        }
        self.persist();
        Some((left, top))
    }

    pub fn drag_in_progress(&self) -> bool {
        self.drag.is_some()
    }

    // ------------------------------------------------------------------
    // UI bookkeeping
    // ------------------------------------------------------------------

    pub fn set_collapsed(&mut self, panel: &str, collapsed: bool) {
        self.ui.collapsed.insert(panel.to_string(), collapsed);
        self.persist();
    }

    // ------------------------------------------------------------------
    // Export and persistence
    // ------------------------------------------------------------------

    /// Export the selected fields of the included sides as a clean
    /// template document.
    pub fn export(&self, sides: &[Face]) -> Result<CleanTemplate, CardstockError> {
        export_template(
            &self.template,
            self.selection.side(Face::Front),
            self.selection.side(Face::Back),
            sides,
        )
    }

    /// The template as currently visible on screen: only selected fields,
    /// front side always present.
    pub fn visible_template(&self) -> Template {
        let mut template = self.template.clone();
        template
            .front
            .items
            .retain(|f| self.selection.front.contains(&f.id));
        if let Some(back) = &mut template.back {
            back.items.retain(|f| self.selection.back.contains(&f.id));
        }
        template
    }

    /// The full working state, including internal bookkeeping.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            id_type: self.id_type.clone(),
            template_type: self.template_type.clone(),
            template: self.template.clone(),
            selection: self.selection.clone(),
            ui: self.ui.clone(),
            ids: self.ids.clone(),
        }
    }

    /// Save the working state to the attached store, if any. Storage
    /// failures are logged, never fatal to the edit in progress.
    fn persist(&self) {
        if let Some(store) = &self.store
            && let Err(e) = store.save(&self.snapshot())
        {
            log::warn!("failed to save editor snapshot: {e}");
        }
    }
}
