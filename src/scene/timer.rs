pub const TIMER_DIGITS: usize = 6;
pub const TIMER_SEPARATOR: char = ':';

/// Six glyphs for the timer planes: separators dropped, extra characters cut, gaps padded with `'0'`.
pub fn timer_glyphs(display: &str) -> [char; TIMER_DIGITS] {
    let mut out = ['0'; TIMER_DIGITS];
    for (slot, ch) in out
        .iter_mut()
        .zip(display.chars().filter(|c| *c != TIMER_SEPARATOR))
    {
        *slot = ch;
    }
    out
}

/// `HH:MM:SS` for an elapsed focus session; hours keep counting past 99.
pub fn format_focus_timer(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
#[path = "../../tests/unit/scene/timer.rs"]
mod tests;
