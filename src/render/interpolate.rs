//! `{{token}}` interpolation against a data record.
//!
//! Unlike template *variables* in a document builder, card text resolves
//! every placeholder: a token with no matching record key becomes an
//! empty string rather than surviving verbatim, so a half-filled record
//! prints a blank instead of `{{admission_no}}`.

use super::Record;

/// Replace every `{{name}}` token with the record's value for `name`
/// (case-insensitive), or an empty string when the record has no such
/// key. An unterminated `{{` is left as literal text.
pub fn interpolate(text: &str, record: &Record) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let token = after[..end].trim();
                out.push_str(record.get(token).unwrap_or(""));
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record {
        let mut r = Record::new("student");
        r.set("name", "ASHA");
        r.set("class", "7B");
        r
    }

    #[test]
    fn test_replaces_known_tokens() {
        assert_eq!(interpolate("{{name}}", &record()), "ASHA");
        assert_eq!(
            interpolate("{{name}} / {{class}}", &record()),
            "ASHA / 7B"
        );
    }

    #[test]
    fn test_missing_tokens_become_empty() {
        assert_eq!(interpolate("{{father_name}}", &record()), "");
        assert_eq!(interpolate("[{{father_name}}]", &record()), "[]");
    }

    #[test]
    fn test_literal_text_passes_through() {
        assert_eq!(interpolate("Student ID Card", &record()), "Student ID Card");
        assert_eq!(interpolate("", &record()), "");
    }

    #[test]
    fn test_token_names_are_case_insensitive_and_trimmed() {
        assert_eq!(interpolate("{{ NAME }}", &record()), "ASHA");
    }

    #[test]
    fn test_unterminated_token_is_literal() {
        assert_eq!(interpolate("oops {{name", &record()), "oops {{name");
    }

    #[test]
    fn test_adjacent_tokens() {
        assert_eq!(interpolate("{{name}}{{class}}", &record()), "ASHA7B");
    }
}
