//! Notice/legend rows that are not schedule data.

use certnorm_dates::has_absolute_date;
use certnorm_shared::Tokens;

use crate::rounds::has_round;

/// Whether a row is a banner.
///
/// A row is a banner when its first cell matches `first_cell_contains` (and
/// not `first_cell_excludes`), or its full text matches `contains_any`. Rows
/// carrying a round token or an absolute date are never banners.
pub fn is_banner_row(cells: &[String], tokens: &Tokens) -> bool {
    let full = cells.join(" ");
    let first = cells.first().map(String::as_str).unwrap_or_default();

    let first_cell_hit = tokens.banner.first_cell_contains.is_match(first)
        && !tokens.banner.first_cell_excludes.is_match(first);
    let any_hit = tokens.banner.contains_any.is_match(&full);
    if !first_cell_hit && !any_hit {
        return false;
    }

    !(has_round(&full) || has_absolute_date(&full))
}
