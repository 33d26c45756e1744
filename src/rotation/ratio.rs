use super::types::{RatioLabel, RatioSelection};

/// Ratio label for point `point_index` (0-based) in auto mode.
///
/// Point 0 plays `base`; afterwards the label changes every two points,
/// giving base, flip, flip, base, base, flip, flip, ...
pub fn auto_ratio(point_index: usize, base: RatioLabel) -> RatioLabel {
    if point_index == 0 {
        return base;
    }
    let k = point_index.div_ceil(2);
    if k % 2 == 1 {
        base.flip()
    } else {
        base
    }
}

/// Resolves the ratio selection for the point about to be played.
///
/// `history_len` is the number of confirmed points, which is also the index
/// of the next one.
pub fn resolve_ratio(
    selection: RatioSelection,
    history_len: usize,
    auto_base: RatioLabel,
) -> RatioLabel {
    match selection {
        RatioSelection::Fixed(label) => label,
        RatioSelection::Auto => auto_ratio(history_len, auto_base),
    }
}
