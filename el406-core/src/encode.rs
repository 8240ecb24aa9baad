//! Mask and selection encoders
//!
//! Step payloads carry three different selection encodings:
//! - a 48-bit well/column mask, 1 = selected
//! - an inverted row-group mask, 0 = selected
//! - plain 1-indexed column numbers converted to mask indices
//!
//! The inversion is a firmware quirk, not a convention of this crate.

use crate::error::{Error, Result};

/// Mask width in bytes
pub const WELL_MASK_LEN: usize = 6;

/// Encode well indices into the 48-bit little-endian well mask.
///
/// `None` selects everything, an empty slice selects nothing. Indices
/// run 0 to 47, bit `index % 8` of byte `index / 8`.
///
/// # Examples
///
/// ```
/// use el406_core::encode;
///
/// assert_eq!(encode::well_mask(None).unwrap(), [0xFF; 6]);
/// assert_eq!(encode::well_mask(Some(&[0, 9])).unwrap(), [0x01, 0x02, 0, 0, 0, 0]);
/// ```
pub fn well_mask(wells: Option<&[u8]>) -> Result<[u8; WELL_MASK_LEN]> {
    let Some(wells) = wells else {
        return Ok([0xFF; WELL_MASK_LEN]);
    };

    let mut mask = [0u8; WELL_MASK_LEN];
    for &well in wells {
        if well > 47 {
            return Err(Error::WellIndexOutOfRange(well));
        }
        mask[well as usize / 8] |= 1 << (well % 8);
    }

    Ok(mask)
}

/// Encode a 1-indexed column selection into the well mask.
///
/// Columns are bounded by the plate format's column count and map to
/// 0-indexed mask positions. `None` selects all columns.
pub fn column_mask(columns: Option<&[u8]>, max_columns: u8) -> Result<[u8; WELL_MASK_LEN]> {
    let Some(columns) = columns else {
        return well_mask(None);
    };

    let mut indices = Vec::with_capacity(columns.len());
    for &column in columns {
        if column < 1 || column > max_columns {
            return Err(Error::ColumnOutOfRange {
                column,
                max_columns,
            });
        }
        indices.push(column - 1);
    }

    well_mask(Some(&indices))
}

/// Encode a 1-indexed row-group selection into the inverted row mask.
///
/// 0 = selected, 1 = deselected, opposite of the well mask. Only the
/// lower `row_groups` bits are meaningful; unused bits stay zero.
/// `None` selects every row group.
///
/// # Examples
///
/// ```
/// use el406_core::encode;
///
/// assert_eq!(encode::inverted_row_mask(None, 4).unwrap(), 0x00);
/// assert_eq!(encode::inverted_row_mask(Some(&[1]), 4).unwrap(), 0x0E);
/// ```
pub fn inverted_row_mask(rows: Option<&[u8]>, row_groups: u8) -> Result<u8> {
    let Some(rows) = rows else {
        return Ok(0x00);
    };

    let mut mask = ((1u16 << row_groups) - 1) as u8;
    for &row in rows {
        if row < 1 || row > row_groups {
            return Err(Error::RowOutOfRange { row, row_groups });
        }
        mask &= !(1 << (row - 1));
    }

    Ok(mask)
}
