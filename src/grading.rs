//! Institutional grading policy: letter grades, grade points, and the
//! percentage bands used to derive a letter from a numeric score.
//!
//! Grade points feed the GPA aggregate, so [`points_for`] is total: an
//! unrecognized letter contributes 0.0 rather than failing the grading
//! transaction it runs inside.

/// Grade points awarded for a letter grade.
///
/// A+ and A both carry 4.0; there is no A+ bonus.
pub fn points_for(letter: &str) -> f64 {
    match letter {
        "A+" | "A" => 4.0,
        "A-" => 3.7,
        "B+" => 3.3,
        "B" => 3.0,
        "B-" => 2.7,
        "C+" => 2.3,
        "C" => 2.0,
        "C-" => 1.7,
        "D" => 1.0,
        _ => 0.0,
    }
}

/// Letter grade for a percentage score, per the institutional scale.
///
/// The scale is a ladder of lower bounds, so scores falling between two
/// published bands (e.g. 94.995) resolve to the band below the next
/// threshold. Anything under 50 is an F, including negative or NaN input.
pub fn letter_for_percentage(pct: f64) -> &'static str {
    if pct >= 95.0 {
        "A+"
    } else if pct >= 90.0 {
        "A"
    } else if pct >= 85.0 {
        "A-"
    } else if pct >= 80.0 {
        "B+"
    } else if pct >= 75.0 {
        "B"
    } else if pct >= 70.0 {
        "B-"
    } else if pct >= 65.0 {
        "C+"
    } else if pct >= 60.0 {
        "C"
    } else if pct >= 55.0 {
        "C-"
    } else if pct >= 50.0 {
        "D"
    } else {
        "F"
    }
}
