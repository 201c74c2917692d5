//! Character-class weighted size estimator.

/// Weight of one wide-script character relative to a narrow one.
pub const WIDE_CHAR_WEIGHT: u32 = 4;

/// Divisor applied to the weighted character total.
///
/// With narrow weight 1 and divisor 4 this lands near the familiar
/// four-characters-per-unit heuristic for Latin text.
pub const CALIBRATION_DIVISOR: u32 = 4;

/// Whether a character belongs to a wide script.
///
/// Covers CJK ideographs (including extension A), hiragana, katakana,
/// hangul syllables and jamo, CJK symbols/punctuation, and full-width
/// forms.
#[must_use]
pub fn is_wide_char(c: char) -> bool {
    matches!(c,
        '\u{1100}'..='\u{11FF}'   // hangul jamo
        | '\u{3000}'..='\u{303F}' // CJK symbols and punctuation
        | '\u{3040}'..='\u{30FF}' // hiragana + katakana
        | '\u{3400}'..='\u{4DBF}' // CJK extension A
        | '\u{4E00}'..='\u{9FFF}' // CJK unified ideographs
        | '\u{AC00}'..='\u{D7AF}' // hangul syllables
        | '\u{F900}'..='\u{FAFF}' // CJK compatibility ideographs
        | '\u{FF00}'..='\u{FFEF}' // full-width forms
    )
}

/// Estimate the unit cost of a piece of text.
///
/// Pure and deterministic: `estimate("") == 0`, and appending characters
/// never decreases the result.
#[must_use]
pub fn estimate(text: &str) -> u32 {
    let weighted: u32 = text
        .chars()
        .map(|c| if is_wide_char(c) { WIDE_CHAR_WEIGHT } else { 1 })
        .sum();
    weighted / CALIBRATION_DIVISOR
}
