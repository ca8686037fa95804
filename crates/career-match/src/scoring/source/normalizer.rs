/// Strips byte-order marks and zero-width spaces and collapses inner whitespace,
/// keeping the original casing so names still match the user's display names.
pub(crate) fn clean_name(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Header key used for case-insensitive column alias lookups.
pub(crate) fn header_key(value: &str) -> String {
    clean_name(value).to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_name_preserves_case_and_collapses_whitespace() {
        assert_eq!(clean_name("\u{feff}Near   Vision "), "Near Vision");
    }

    #[test]
    fn header_key_is_lowercase() {
        assert_eq!(header_key(" Target_Occupation"), "target_occupation");
    }
}
