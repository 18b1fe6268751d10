//! Sector name normalization.
//!
//! The canonical directory matches on the trimmed value with its original
//! casing. Every other comparison (hash input, override and catalog keys,
//! containment) uses the upper-cased trimmed value produced here.

/// Trimmed name, or `None` if the input is empty or all whitespace.
#[inline]
pub fn trimmed(raw: &str) -> Option<&str> {
    let t = raw.trim();
    (!t.is_empty()).then_some(t)
}

/// Upper-cased trimmed comparison key. Blank input yields an empty string;
/// callers that need to reject blanks use [`comparison_key`].
#[inline]
pub fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Comparison key, `None` for blank input.
#[inline]
pub fn comparison_key(raw: &str) -> Option<String> {
    trimmed(raw).map(str::to_uppercase)
}

/// Bidirectional substring containment on two comparison keys.
#[inline]
pub fn contains_either_way(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_input_has_no_key() {
        assert_eq!(trimmed(""), None);
        assert_eq!(trimmed(" \t\n"), None);
        assert_eq!(comparison_key("   "), None);
    }

    #[test]
    fn test_case_and_padding_variants_share_a_key() {
        let keys: Vec<String> = ["UTI 1", "uti 1", " UTI 1 ", "Uti 1\t"]
            .iter()
            .map(|s| normalize(s))
            .collect();
        assert!(keys.iter().all(|k| k == "UTI 1"));
    }

    #[test]
    fn test_uppercase_handles_accents() {
        assert_eq!(normalize(" emergência "), "EMERGÊNCIA");
    }

    #[test]
    fn test_containment_is_bidirectional() {
        assert!(contains_either_way("CDC - CENTRO DE DIAGNÓSTICO", "CDC"));
        assert!(contains_either_way("CDC", "CDC - CENTRO DE DIAGNÓSTICO"));
        assert!(!contains_either_way("RADIOLOGIA", "UTI"));
    }
}
