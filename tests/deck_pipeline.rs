//! # Deck Pipeline Tests
//!
//! End-to-end coverage of the template-to-print pipeline: fetch-shaped
//! JSON in, editor edits, clean export, re-import, deck rendering, and
//! pagination.

use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

use cardstock::editor::{EditorSession, SnapshotStore};
use cardstock::render::{CARDS_PER_SHEET, PlacedContent, Record, paginate, render_deck};
use cardstock::template::export::export_template;
use cardstock::template::{Face, FieldId, FieldIdGen, Group, Px, Template};

const TEMPLATE_JSON: &str = r##"{
    "front": {
        "pageStyle": {"width": "204px", "height": "324px", "backgroundColor": "#ffffff"},
        "items": [
            {"type": "text", "text": "Student Name:", "left": "10px", "top": "40px"},
            {"type": "text", "text": "{{name}}", "left": "110px", "top": "40px", "bookmark": "name"},
            {"type": "text", "text": "Class:", "left": "10px", "top": "70px"},
            {"type": "text", "text": "{{class}}", "left": "110px", "top": "70px"},
            {"type": "image", "src": "https://photos.example/placeholder.png",
             "bookmark": "photo", "left": "60px", "top": "120px",
             "width": "84px", "height": "96px", "borderWidth": "1px"}
        ]
    },
    "back": {
        "items": [
            {"type": "text", "text": "If found, return to the school office.", "left": "10px", "top": "10px"}
        ]
    }
}"##;

fn student(name: &str, class: &str) -> Record {
    let mut record = Record::new("student");
    record.set("name", name);
    record.set("class", class);
    record
}

fn full_selection(template: &Template) -> (BTreeSet<FieldId>, BTreeSet<FieldId>) {
    let front = template.front.items.iter().map(|f| f.id).collect();
    let back = template
        .back
        .as_ref()
        .map(|s| s.items.iter().map(|f| f.id).collect())
        .unwrap_or_default();
    (front, back)
}

#[test]
fn edited_template_exports_cleanly_and_reimports() {
    let mut ids = FieldIdGen::new();
    let template = Template::from_json(TEMPLATE_JSON, &mut ids).unwrap();
    let mut session = EditorSession::new("student", "1", template, None);

    // Bulk-edit label colors and reposition the name field.
    session.set_master_color(Group::Label, "#aa0000");
    let name_id = session.template().front.items[1].id;
    session.begin_drag(Face::Front, name_id, (0.0, 0.0)).unwrap();
    session.update_drag((10.0, -50.0));
    session.end_drag();

    let clean = session.export(&[Face::Front, Face::Back]).unwrap();
    let json = serde_json::to_string(&clean).unwrap();

    // Re-import: the edits survive, the ids do not.
    let mut ids = FieldIdGen::new();
    let reimported = Template::from_json(&json, &mut ids).unwrap();
    let name_field = &reimported.front.items[1];
    assert_eq!(name_field.left, Px(120.0));
    assert_eq!(name_field.top, Px(0.0)); // clamped, never negative
    let label_field = &reimported.front.items[0];
    assert_eq!(label_field.color.as_deref(), Some("#aa0000"));

    // Round-trip stability: export of the re-import matches.
    let (front, back) = full_selection(&reimported);
    let clean2 = export_template(&reimported, &front, &back, &[Face::Front, Face::Back]).unwrap();
    assert_eq!(clean2, clean);
}

#[test]
fn snapshot_restores_in_progress_edits_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());

    let mut ids = FieldIdGen::new();
    let template = Template::from_json(TEMPLATE_JSON, &mut ids).unwrap();
    let (name_id, class_label_id) = {
        let mut session =
            EditorSession::new("student", "1", template, Some(store.clone()));
        let name_id = session.template().front.items[1].id;
        let class_label_id = session.template().front.items[2].id;
        session.deselect(Face::Front, class_label_id);
        session.begin_drag(Face::Front, name_id, (0.0, 0.0)).unwrap();
        session.update_drag((5.0, 8.0));
        session.end_drag();
        (name_id, class_label_id)
    };

    // The wrong selection key forces a fresh fetch.
    assert!(store.load("staff", "1").is_none());

    // The matching key restores the edit in progress.
    let snapshot = store.load("student", "1").unwrap();
    let session = EditorSession::restore(snapshot, Some(store));
    let field = session.template().front.field(name_id).unwrap();
    assert_eq!((field.left, field.top), (Px(115.0), Px(48.0)));
    assert!(!session.is_selected(Face::Front, class_label_id));
}

#[test]
fn deck_of_23_records_paginates_in_order() {
    // One-sided template: one card per record.
    let mut ids = FieldIdGen::new();
    let template = Template::from_json(
        r#"{"front": {"items": [{"type": "text", "text": "{{name}}"}]}}"#,
        &mut ids,
    )
    .unwrap();

    let records: Vec<Record> = (0..23)
        .map(|i| student(&format!("Student {i}"), "7B"))
        .collect();
    let deck = render_deck(&template, &records).unwrap();
    assert_eq!(deck.cards.len(), 23);

    let sheets = paginate(deck.cards, CARDS_PER_SHEET);
    let sizes: Vec<_> = sheets.iter().map(|s| s.cards.len()).collect();
    assert_eq!(sizes, vec![10, 10, 3]);

    let names: Vec<String> = sheets
        .iter()
        .flat_map(|sheet| &sheet.cards)
        .map(|card| match &card.elements[0].content {
            PlacedContent::Text(t) => t.value.clone(),
            other => panic!("expected text, got {other:?}"),
        })
        .collect();
    let expected: Vec<String> = (0..23).map(|i| format!("Student {i}")).collect();
    assert_eq!(names, expected);
}

#[test]
fn two_sided_deck_interpolates_and_tags_backs() {
    let mut ids = FieldIdGen::new();
    let template = Template::from_json(TEMPLATE_JSON, &mut ids).unwrap();

    let records = vec![student("ASHA", "7B"), student("RAVI", "7C")];
    let deck = render_deck(&template, &records).unwrap();
    assert_eq!(deck.cards.len(), 4);

    let front = &deck.cards[0];
    let value = match &front.elements[1].content {
        PlacedContent::Text(t) => t.value.clone(),
        other => panic!("expected text, got {other:?}"),
    };
    assert_eq!(value, "ASHA");
    assert!(front.identifier.is_none());
    assert!(deck.cards[1].identifier.is_some());

    // Missing record keys render as empty strings, not errors.
    let sparse = vec![Record::new("student")];
    let deck = render_deck(&template, &sparse).unwrap();
    match &deck.cards[0].elements[1].content {
        PlacedContent::Text(t) => assert_eq!(t.value, ""),
        other => panic!("expected text, got {other:?}"),
    }
}

#[test]
fn export_with_nothing_selected_is_refused() {
    let mut ids = FieldIdGen::new();
    let template = Template::from_json(TEMPLATE_JSON, &mut ids).unwrap();
    let mut session = EditorSession::new("student", "1", template, None);
    session.clear_all(Face::Front);
    session.clear_all(Face::Back);
    assert!(session.export(&[Face::Front, Face::Back]).is_err());
}
