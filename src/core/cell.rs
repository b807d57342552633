//! Cell token codec for the 120x50 grid plane.
//!
//! A cell token is a 4-character `CCNN` address: a base-26 two-letter column
//! in `AA..=EP` (120 columns, 0-indexed) and a zero-padded row in `00..=49`.
//! Parsing rejects out-of-range tokens outright; nothing is ever clamped.

use crate::core::error::CarapaceError;

/// Number of distinct columns per layer plane (`AA` through `EP`).
pub const COLUMN_COUNT: u32 = 120;

/// Number of distinct rows per layer plane (`00` through `49`).
pub const ROW_COUNT: u32 = 50;

/// Parse a `CCNN` cell token into its column code and row number.
///
/// Errors are raised at the point of parsing:
/// - `InvalidCellFormat` when the token is not exactly 4 characters
/// - `InvalidColumn` when the letter pair falls outside `AA..=EP`
/// - `InvalidRow` when the numeric suffix is missing or outside `00..=49`
pub fn parse_cell(token: &str) -> Result<(String, u32), CarapaceError> {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() != 4 {
        return Err(CarapaceError::InvalidCellFormat(token.to_string()));
    }

    let column: String = chars[0..2].iter().collect();
    column_to_index(&column)?;

    let row_part: String = chars[2..4].iter().collect();
    if !chars[2..4].iter().all(|c| c.is_ascii_digit()) {
        return Err(CarapaceError::InvalidRow(row_part));
    }
    let row: u32 = row_part
        .parse()
        .map_err(|_| CarapaceError::InvalidRow(row_part.clone()))?;
    if row >= ROW_COUNT {
        return Err(CarapaceError::InvalidRow(row_part));
    }

    Ok((column, row))
}

/// Convert a two-letter column code to its 0-based index.
pub fn column_to_index(column: &str) -> Result<u32, CarapaceError> {
    let chars: Vec<char> = column.chars().collect();
    if chars.len() != 2 || !chars.iter().all(|c| c.is_ascii_uppercase()) {
        return Err(CarapaceError::InvalidColumn(column.to_string()));
    }
    let index = (chars[0] as u32 - 'A' as u32) * 26 + (chars[1] as u32 - 'A' as u32);
    if index >= COLUMN_COUNT {
        return Err(CarapaceError::InvalidColumn(column.to_string()));
    }
    Ok(index)
}

/// Convert a 0-based column index back to its two-letter code.
pub fn index_to_column(index: u32) -> Result<String, CarapaceError> {
    if index >= COLUMN_COUNT {
        return Err(CarapaceError::InvalidColumn(index.to_string()));
    }
    let first = char::from(b'A' + (index / 26) as u8);
    let second = char::from(b'A' + (index % 26) as u8);
    Ok(format!("{}{}", first, second))
}
