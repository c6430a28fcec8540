//! Appendix labels.
//!
//! Each project gets one label, numbered with the Russian alphabet as digits
//! in bijective base 32: `А`, `Б`, …, `Я`, `АА`, `АБ`, …

use once_cell::sync::Lazy;

/// Letters used as label digits, in order.
pub const ALPHABET: &str = "АБВГДЕЖЗИЙКЛМНОПРСТУФХЦЧШЩЪЫЬЭЮЯ";

static DIGITS: Lazy<Vec<char>> = Lazy::new(|| ALPHABET.chars().collect());

/// Returns the label for a 0-based index.
#[must_use]
pub fn index_to_label(index: usize) -> String {
    let base = DIGITS.len();
    let mut n = index;
    let mut chars = Vec::new();

    loop {
        chars.push(DIGITS[n % base]);
        if n < base {
            break;
        }
        n = n / base - 1;
    }

    chars.iter().rev().collect()
}

/// Returns the 0-based index of a label, or `None` if it is not a label.
#[must_use]
pub fn label_to_index(label: &str) -> Option<usize> {
    if label.is_empty() {
        return None;
    }

    let base = DIGITS.len();
    let mut value = 0usize;
    for ch in label.chars() {
        let digit = DIGITS.iter().position(|&d| d == ch)?;
        value = value.checked_mul(base)?.checked_add(digit + 1)?;
    }
    Some(value - 1)
}

/// Consecutive labels, one per project.
#[derive(Debug, Clone)]
pub struct LabelSequence {
    next: usize,
}

impl LabelSequence {
    /// Starts at `А`.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Starts at the given label, or `None` if it is not a label.
    #[must_use]
    pub fn starting_at(label: &str) -> Option<Self> {
        label_to_index(label).map(|next| Self { next })
    }
}

impl Default for LabelSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for LabelSequence {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let label = index_to_label(self.next);
        self.next += 1;
        Some(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_alphabet_has_32_letters() {
        assert_eq!(DIGITS.len(), 32);
    }

    #[test]
    fn test_single_letter_labels() {
        assert_eq!(index_to_label(0), "А");
        assert_eq!(index_to_label(1), "Б");
        assert_eq!(index_to_label(31), "Я");
    }

    #[test]
    fn test_multi_letter_labels() {
        assert_eq!(index_to_label(32), "АА");
        assert_eq!(index_to_label(33), "АБ");
        assert_eq!(index_to_label(63), "АЯ");
        assert_eq!(index_to_label(64), "БА");
        assert_eq!(index_to_label(32 + 32 * 32), "ААА");
    }

    #[test]
    fn test_label_to_index_inverts() {
        for index in [0, 1, 31, 32, 33, 500, 1055, 1056, 40_000] {
            assert_eq!(label_to_index(&index_to_label(index)), Some(index));
        }
    }

    #[test]
    fn test_label_to_index_rejects_foreign_characters() {
        assert_eq!(label_to_index(""), None);
        assert_eq!(label_to_index("A"), None); // Latin A
        assert_eq!(label_to_index("Аё"), None);
    }

    #[test]
    fn test_sequence_labels_are_distinct() {
        let labels: Vec<String> = LabelSequence::new().take(100).collect();
        let unique: HashSet<&String> = labels.iter().collect();

        assert_eq!(unique.len(), 100);
        assert_eq!(labels[0], "А");
        assert_eq!(labels[32], "АА");
    }

    #[test]
    fn test_sequence_starting_at() {
        let labels: Vec<String> = LabelSequence::starting_at("Ю").unwrap().take(3).collect();
        assert_eq!(labels, vec!["Ю", "Я", "АА"]);

        assert!(LabelSequence::starting_at("Z").is_none());
    }
}
