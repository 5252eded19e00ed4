use super::*;

#[test]
fn separators_are_stripped() {
    assert_eq!(timer_glyphs("01:23:45"), ['0', '1', '2', '3', '4', '5']);
}

#[test]
fn short_input_pads_with_zero() {
    assert_eq!(timer_glyphs("12"), ['1', '2', '0', '0', '0', '0']);
    assert_eq!(timer_glyphs(""), ['0'; 6]);
    assert_eq!(timer_glyphs(":::"), ['0'; 6]);
}

#[test]
fn long_input_is_truncated() {
    assert_eq!(timer_glyphs("1234567890"), ['1', '2', '3', '4', '5', '6']);
    assert_eq!(timer_glyphs("100:00:00"), ['1', '0', '0', '0', '0', '0']);
}

#[test]
fn only_colon_counts_as_separator() {
    assert_eq!(timer_glyphs("12.34.56"), ['1', '2', '.', '3', '4', '.']);
}

#[test]
fn focus_timer_formats_hours_minutes_seconds() {
    assert_eq!(format_focus_timer(0), "00:00:00");
    assert_eq!(format_focus_timer(59), "00:00:59");
    assert_eq!(format_focus_timer(3_661), "01:01:01");
    assert_eq!(format_focus_timer(360_000), "100:00:00");
}
