//! Edit-distance matching for exercise names.
//!
//! Both inputs are lower-cased before comparison and measured in Unicode
//! scalar values, so "Bench" and "bénch" are one substitution apart.

/// Default number of edits two names may differ by and still match.
pub const DEFAULT_FUZZY_TOLERANCE: usize = 2;

/// Levenshtein distance between `a` and `b`, ignoring case.
///
/// Plain (m+1)x(n+1) dynamic-programming table with no early exit.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let (m, n) = (a.len(), b.len());

    let mut table = vec![vec![0usize; n + 1]; m + 1];
    for (i, row) in table.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in table[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=m {
        for j in 1..=n {
            let substitution = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            table[i][j] = (table[i - 1][j] + 1)
                .min(table[i][j - 1] + 1)
                .min(table[i - 1][j - 1] + substitution);
        }
    }

    table[m][n]
}

/// Whether `a` and `b` are within `tolerance` edits of each other.
pub fn is_fuzzy_match(a: &str, b: &str, tolerance: usize) -> bool {
    levenshtein_distance(a, b) <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kitten_sitting() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_identity() {
        for s in ["", "a", "deadlift", "Romanian Deadlift", "café"] {
            assert_eq!(levenshtein_distance(s, s), 0, "d({s:?}, {s:?})");
        }
    }

    #[test]
    fn test_symmetry() {
        let pairs = [
            ("bench", "bnech"),
            ("squat", "squats"),
            ("", "row"),
            ("pull up", "pullup"),
            ("lunge", "plank"),
        ];
        for (a, b) in pairs {
            assert_eq!(levenshtein_distance(a, b), levenshtein_distance(b, a));
        }
    }

    #[test]
    fn test_empty_against_word() {
        assert_eq!(levenshtein_distance("", "curl"), 4);
        assert_eq!(levenshtein_distance("curl", ""), 4);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(levenshtein_distance("BENCH", "bench"), 0);
        assert_eq!(levenshtein_distance("Deadlift", "deadLIFT"), 0);
    }

    #[test]
    fn test_unicode_counts_chars() {
        assert_eq!(levenshtein_distance("cafe", "café"), 1);
    }

    #[test]
    fn test_fuzzy_tolerance_boundary() {
        assert!(is_fuzzy_match("bench", "bnech", DEFAULT_FUZZY_TOLERANCE));
        assert!(!is_fuzzy_match("bench", "xxxxx", DEFAULT_FUZZY_TOLERANCE));
        assert!(is_fuzzy_match("row", "rows", 1));
        assert!(!is_fuzzy_match("row", "rowing", 2));
    }

    #[test]
    fn test_agrees_with_strsim() {
        let words = [
            "bench press",
            "incline bench",
            "squat",
            "front squat",
            "deadlift",
            "pull-up",
            "chin-up",
            "",
        ];
        for a in words {
            for b in words {
                assert_eq!(
                    levenshtein_distance(a, b),
                    strsim::levenshtein(a, b),
                    "{a:?} vs {b:?}"
                );
            }
        }
    }
}
