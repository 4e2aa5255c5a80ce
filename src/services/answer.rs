/// Whether `submitted` matches `expected`, ignoring surrounding whitespace and letter case.
///
/// Two blank strings match each other; a blank submission never matches a non-blank answer.
pub fn matches(expected: &str, submitted: &str) -> bool {
    normalize(expected) == normalize(submitted)
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_case_and_surrounding_whitespace() {
        assert!(matches("Paris", " paris "));
        assert!(matches("New York", "NEW YORK\n"));
    }

    #[test]
    fn rejects_partial_or_extended_answers() {
        assert!(!matches("Paris", "paris2"));
        assert!(!matches("Paris", "par"));
        assert!(!matches("New York", "NewYork"));
    }

    #[test]
    fn blank_handling() {
        assert!(matches("", ""));
        assert!(matches("", "   "));
        assert!(!matches("Paris", ""));
    }

    #[test]
    fn non_ascii_letters_are_case_folded() {
        assert!(matches("Zürich", "ZÜRICH"));
    }
}
