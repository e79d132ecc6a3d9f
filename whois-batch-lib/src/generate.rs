//! Lucky-number prefix generation.
//!
//! Builds a dictionary of "lucky" numeric prefixes from the digits
//! `0 1 2 3 6 8 9` in lengths 6 down to 4. Three shapes are produced:
//!
//! - repeated digits: `888888`, `0000`
//! - ascending runs that wrap from 9 to 0 and never touch 4 or 7: `890123`
//! - two-digit splits, first half one digit and second half another: `888666`
//!
//! The result is deduplicated and ordered longest first, then by numeric
//! value descending.
//!
//! # Examples
//!
//! ```
//! use whois_batch_lib::generate::generate_lucky_numbers;
//!
//! let numbers = generate_lucky_numbers(3);
//! assert_eq!(numbers, vec!["999999", "999888", "999666"]);
//! ```

use crate::error::LookupError;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::info;

/// Digits a lucky number may be built from.
pub const LUCKY_DIGITS: [char; 7] = ['0', '1', '2', '3', '6', '8', '9'];

/// Digits that must never appear in an ascending run.
const UNLUCKY_DIGITS: [char; 2] = ['4', '7'];

/// Default dictionary size.
pub const DEFAULT_LUCKY_LIMIT: usize = 1000;

const MIN_LEN: usize = 4;
const MAX_LEN: usize = 6;

/// Ascending run of `len` digits starting at `start`, wrapping 9 to 0.
///
/// Returns `None` as soon as an unlucky digit would be emitted.
fn ascending_run(start: char, len: usize) -> Option<String> {
    let mut digit = start.to_digit(10)?;
    let mut run = String::with_capacity(len);

    for _ in 0..len {
        let c = char::from_digit(digit, 10)?;
        if UNLUCKY_DIGITS.contains(&c) {
            return None;
        }
        run.push(c);
        digit = (digit + 1) % 10;
    }

    Some(run)
}

/// Generate up to `limit` lucky numbers, best first.
pub fn generate_lucky_numbers(limit: usize) -> Vec<String> {
    let mut numbers = BTreeSet::new();

    for len in (MIN_LEN..=MAX_LEN).rev() {
        for &digit in &LUCKY_DIGITS {
            numbers.insert(digit.to_string().repeat(len));

            if let Some(run) = ascending_run(digit, len) {
                numbers.insert(run);
            }

            for &second in LUCKY_DIGITS.iter().filter(|&&d| d != digit) {
                let head = len / 2;
                let mut split = digit.to_string().repeat(head);
                split.push_str(&second.to_string().repeat(len - head));
                numbers.insert(split);
            }
        }
    }

    // Equal lengths compare lexicographically the same as numerically.
    let mut numbers: Vec<String> = numbers.into_iter().collect();
    numbers.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| b.cmp(a)));
    numbers.truncate(limit);
    numbers
}

/// Write the lucky-number dictionary to `path`, one number per line.
///
/// Returns how many numbers were written.
pub fn write_lucky_numbers<P: AsRef<Path>>(path: P, limit: usize) -> Result<usize, LookupError> {
    let path = path.as_ref();
    let numbers = generate_lucky_numbers(limit);

    let mut content = numbers.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }

    fs::write(path, content).map_err(|e| {
        LookupError::file_error(
            path.to_string_lossy(),
            format!("Failed to write lucky numbers: {}", e),
        )
    })?;

    info!(path = %path.display(), count = numbers.len(), "wrote lucky-number dictionary");
    Ok(numbers.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascending_run() {
        assert_eq!(ascending_run('8', 6).as_deref(), Some("890123"));
        assert_eq!(ascending_run('0', 4).as_deref(), Some("0123"));
        assert_eq!(ascending_run('0', 5), None); // reaches 4
        assert_eq!(ascending_run('6', 4), None); // reaches 7
        assert_eq!(ascending_run('1', 4), None);
    }

    #[test]
    fn test_full_dictionary_size() {
        // 21 repeated + 126 splits + 6 runs
        let numbers = generate_lucky_numbers(DEFAULT_LUCKY_LIMIT);
        assert_eq!(numbers.len(), 153);
    }

    #[test]
    fn test_contains_every_shape() {
        let numbers = generate_lucky_numbers(DEFAULT_LUCKY_LIMIT);
        for expected in ["888888", "0000", "890123", "90123", "8901", "0123", "888666", "00666"] {
            assert!(numbers.contains(&expected.to_string()), "missing {}", expected);
        }
        // odd lengths put the shorter block first
        assert!(!numbers.contains(&"00066".to_string()));
    }

    #[test]
    fn test_ordering_longest_then_largest() {
        let numbers = generate_lucky_numbers(DEFAULT_LUCKY_LIMIT);
        assert_eq!(numbers.first().map(String::as_str), Some("999999"));
        assert_eq!(numbers.last().map(String::as_str), Some("0000"));

        for pair in numbers.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                a.len() > b.len()
                    || (a.len() == b.len()
                        && a.parse::<u64>().unwrap() > b.parse::<u64>().unwrap()),
                "{} should sort before {}",
                a,
                b
            );
        }
    }

    #[test]
    fn test_no_unlucky_digits() {
        for number in generate_lucky_numbers(DEFAULT_LUCKY_LIMIT) {
            assert!(!number.contains('4') && !number.contains('7'), "{}", number);
            assert!((MIN_LEN..=MAX_LEN).contains(&number.len()));
        }
    }

    #[test]
    fn test_limit_truncates() {
        assert_eq!(generate_lucky_numbers(10).len(), 10);
        assert!(generate_lucky_numbers(0).is_empty());
    }

    #[test]
    fn test_write_lucky_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lucky_numbers.txt");

        let written = write_lucky_numbers(&path, 5).unwrap();
        assert_eq!(written, 5);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, generate_lucky_numbers(5));
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("lucky.txt");
        assert!(matches!(
            write_lucky_numbers(&path, 5),
            Err(LookupError::FileError { .. })
        ));
    }
}
