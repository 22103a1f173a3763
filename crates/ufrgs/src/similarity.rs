//! String similarity for course-name matching.
//!
//! The enrollment page and the course selector render the same program name
//! with independent formatting ("Eng. de Computação" vs "Engenharia de
//! Computação"), so the selector option is picked by similarity rather than
//! equality.

/// Similarity ratio between two strings in `[0.0, 1.0]`.
///
/// Gestalt pattern matching: find the longest common substring, recurse on
/// the pieces to its left and right, and score `2*M / (len_a + len_b)` where
/// `M` is the total number of matched characters. Case-sensitive; callers
/// normalize case themselves.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let matched = matching_chars(&a, &b);
    2.0 * matched as f64 / (a.len() + b.len()) as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (a_start, b_start, len) = longest_common_substring(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..a_start], &b[..b_start])
        + matching_chars(&a[a_start + len..], &b[b_start + len..])
}

/// Returns `(start_in_a, start_in_b, length)` of the longest common
/// substring, preferring the earliest occurrence on ties.
fn longest_common_substring(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    // Rolling row: lengths[j] = match length ending at a[i], b[j-1]
    let mut lengths = vec![0usize; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        let mut prev = 0;
        for (j, &cb) in b.iter().enumerate() {
            let current = lengths[j + 1];
            if ca == cb {
                let len = prev + 1;
                lengths[j + 1] = len;
                if len > best.2 {
                    best = (i + 1 - len, j + 1 - len, len);
                }
            } else {
                lengths[j + 1] = 0;
            }
            prev = current;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical() {
        assert!((ratio("abcdef", "abcdef") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint() {
        assert_eq!(ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_both_empty() {
        assert_eq!(ratio("", ""), 1.0);
    }

    #[test]
    fn test_one_empty() {
        assert_eq!(ratio("abc", ""), 0.0);
    }

    #[test]
    fn test_partial_overlap() {
        // "abcd" vs "bcde": common "bcd", 2*3/8
        assert!((ratio("abcd", "bcde") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_abbreviation_beats_different_program() {
        let name = "eng. de computação";
        let a = ratio(name, "engenharia de computação");
        let b = ratio(name, "ciência da computação");
        assert!(a > b);
    }
}
