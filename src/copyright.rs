//! Copyright line derivation.
//!
//! The year portion always follows the wall clock at resolution time, so the
//! string is never stored in settings.

use chrono::{Datelike, Local};

/// Current year according to the local clock.
pub fn current_year() -> i32 {
    Local::now().year()
}

/// Builds the copyright line shown in the generated documentation.
///
/// With no first year, or when the first year is the current one, the result
/// is `"{year}, {author}"`. Any other first year yields a range
/// `"{first}-{year}, {author}"`.
pub fn derive_copyright(first_year: Option<i32>, current_year: i32, author: &str) -> String {
    match first_year {
        Some(first) if first != current_year => {
            format!("{}-{}, {}", first, current_year, author)
        }
        _ => format!("{}, {}", current_year, author),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_year_equals_current() {
        assert_eq!(derive_copyright(Some(2020), 2020, "Example"), "2020, Example");
    }

    #[test]
    fn test_range_after_first_year() {
        assert_eq!(
            derive_copyright(Some(2020), 2024, "Example"),
            "2020-2024, Example"
        );
    }

    #[test]
    fn test_no_first_year() {
        assert_eq!(derive_copyright(None, 2031, "QuantAQ, Inc."), "2031, QuantAQ, Inc.");
    }

    #[test]
    fn test_clock_before_first_year_still_ranges() {
        assert_eq!(derive_copyright(Some(2020), 2019, "A"), "2020-2019, A");
    }

    #[test]
    fn test_current_year_is_plausible() {
        assert!(current_year() >= 2020);
    }
}
