//! Scannable card identifiers.
//!
//! Recognized record types get a QR payload encoding their key fields as
//! `Label: value` lines; anything else gets a visible placeholder marker
//! instead of a generated code.

use super::Record;

/// The identifier attached to a card.
#[derive(Debug, Clone, PartialEq)]
pub enum Identifier {
    /// QR payload for a recognized record type.
    Code(String),
    /// Placeholder marker for unrecognized record types.
    Placeholder,
}

/// Build the identifier for a record.
///
/// `student` records encode name + admission number; `staff` records
/// encode employee id + name. Missing values encode as empty, which keeps
/// the payload scannable rather than failing the card.
pub fn for_record(record: &Record) -> Identifier {
    match record.kind.as_str() {
        "student" => Identifier::Code(format!(
            "Name: {}\nAdmission No: {}",
            record.get("name").unwrap_or(""),
            record.get("admission_no").unwrap_or(""),
        )),
        "staff" => Identifier::Code(format!(
            "Employee ID: {}\nName: {}",
            record.get("employee_id").unwrap_or(""),
            record.get("name").unwrap_or(""),
        )),
        _ => Identifier::Placeholder,
    }
}
