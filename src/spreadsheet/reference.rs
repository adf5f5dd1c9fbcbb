//! Conversions between A1-style cell references and numeric coordinates.
//!
//! Column letters form a base-26 numeral without a zero digit: `A` = 1 … `Z` = 26,
//! `AA` = 27, `AZ` = 52, `BA` = 53. Public functions work on 1-based numbers;
//! the `*_index` helpers used by the package reader work on 0-based indexes.

/// Converts column letters (case-insensitive) to a 1-based column number.
///
/// Returns `None` for an empty input, a non-letter character, or overflow.
pub fn column_name_to_number(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0usize, |number, letter| {
        if !letter.is_ascii_alphabetic() {
            return None;
        }
        let digit = (letter.to_ascii_uppercase() as usize) - ('A' as usize) + 1;
        number.checked_mul(26)?.checked_add(digit)
    })
}

/// Converts a 1-based column number to upper-case column letters.
///
/// Returns an empty string for `0`, which has no column name.
pub fn number_to_column_name(number: usize) -> String {
    let mut number = number;
    let mut letters = Vec::new();
    while number > 0 {
        number -= 1;
        letters.push((b'A' + (number % 26) as u8) as char);
        number /= 26;
    }
    letters.iter().rev().collect()
}

/// Converts a 1-based row and column to an A1-style reference such as `B7`.
pub fn cell_reference(row: usize, column: usize) -> String {
    format!("{}{}", number_to_column_name(column), row)
}

/// Splits an A1-style reference into its letter run and digit run.
pub(crate) fn split_reference(reference: &str) -> (&str, &str) {
    let index = reference
        .find(|character: char| !character.is_ascii_alphabetic())
        .unwrap_or(reference.len());
    reference.split_at(index)
}

/// Converts an A1-style reference (`$` anchors ignored) to 0-based `(row, col)` indexes.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.replace('$', "");
    let (letters, digits) = split_reference(&reference);
    let col = column_name_to_number(letters)?;
    let row = row_to_number(digits)?;
    Some((row - 1, col - 1))
}

/// Converts 0-based `(row, col)` indexes to an A1-style reference.
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    cell_reference(row + 1, col + 1)
}

/// Parses a 1-based row number; rejects empty, non-digit and zero values.
pub(crate) fn row_to_number(digits: &str) -> Option<usize> {
    if digits.is_empty() || !digits.chars().all(|character| character.is_ascii_digit()) {
        return None;
    }
    digits.parse::<usize>().ok().filter(|row| *row > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_to_numbers() {
        assert_eq!(column_name_to_number("A"), Some(1));
        assert_eq!(column_name_to_number("Z"), Some(26));
        assert_eq!(column_name_to_number("AA"), Some(27));
        assert_eq!(column_name_to_number("AZ"), Some(52));
        assert_eq!(column_name_to_number("BA"), Some(53));
        assert_eq!(column_name_to_number("ZZ"), Some(702));
        assert_eq!(column_name_to_number("AAA"), Some(703));
        assert_eq!(column_name_to_number("XFD"), Some(16_384));
        assert_eq!(column_name_to_number("ba"), Some(53));
    }

    #[test]
    fn invalid_column_letters() {
        assert_eq!(column_name_to_number(""), None);
        assert_eq!(column_name_to_number("A1"), None);
        assert_eq!(column_name_to_number("$A"), None);
    }

    #[test]
    fn numbers_to_column_letters() {
        assert_eq!(number_to_column_name(1), "A");
        assert_eq!(number_to_column_name(26), "Z");
        assert_eq!(number_to_column_name(27), "AA");
        assert_eq!(number_to_column_name(52), "AZ");
        assert_eq!(number_to_column_name(53), "BA");
        assert_eq!(number_to_column_name(702), "ZZ");
        assert_eq!(number_to_column_name(703), "AAA");
        assert_eq!(number_to_column_name(0), "");
    }

    #[test]
    fn column_round_trip() {
        for letters in ["A", "m", "Z", "aa", "Az", "BA", "ZY", "ZZ", "AAA", "xfd"] {
            let number = column_name_to_number(letters).unwrap();
            assert_eq!(number_to_column_name(number), letters.to_ascii_uppercase());
        }
        for number in 1..=2_000 {
            assert_eq!(column_name_to_number(&number_to_column_name(number)), Some(number));
        }
    }

    #[test]
    fn references_to_indexes() {
        assert_eq!(reference_to_index("A1"), Some((0, 0)));
        assert_eq!(reference_to_index("B7"), Some((6, 1)));
        assert_eq!(reference_to_index("$AA$10"), Some((9, 26)));
        assert_eq!(reference_to_index("A0"), None);
        assert_eq!(reference_to_index("A"), None);
        assert_eq!(reference_to_index("12"), None);
        assert_eq!(index_to_reference(9, 26), "AA10");
        assert_eq!(cell_reference(2, 4), "D2");
    }
}
