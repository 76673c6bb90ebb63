//! Handicap stroke allocation over a course's stroke indexes.

/// Number of strokes a player receives on a single hole.
///
/// Every hole grants the Euclidean quotient of `course_handicap / hole_count`;
/// the remainder is spread one stroke at a time over the hardest holes, where
/// stroke index 1 ranks hardest. Euclidean division keeps the plus-handicap
/// case symmetric: a negative course handicap gives strokes back to the
/// course on the easiest holes, and the per-hole values always sum to the
/// course handicap exactly.
pub fn strokes_received(stroke_index: u8, course_handicap: i32, hole_count: u8) -> i32 {
    let holes = i32::from(hole_count);
    let base = course_handicap.div_euclid(holes);
    let extra = course_handicap.rem_euclid(holes);
    if i32::from(stroke_index) <= extra {
        base + 1
    } else {
        base
    }
}

/// Course handicap from a handicap index and the tee's rating/slope.
///
/// Standard rating adjustment, rounded to the nearest integer. Nine-hole
/// rounds play off half the index before the tee adjustment.
pub fn course_handicap(
    handicap_index: f32,
    slope_rating: u16,
    course_rating: f32,
    par_total: u16,
    hole_count: u8,
) -> i32 {
    let index = if hole_count == 9 {
        handicap_index / 2.0
    } else {
        handicap_index
    };
    (index * f32::from(slope_rating) / 113.0 + (course_rating - f32::from(par_total))).round()
        as i32
}
