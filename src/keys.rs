//! WebDriver key codes (Private Use Area characters defined by W3C WebDriver).

pub const NULL: char = '\u{E000}';
pub const BACKSPACE: char = '\u{E003}';
pub const TAB: char = '\u{E004}';
pub const ENTER: char = '\u{E007}';
pub const SHIFT: char = '\u{E008}';
pub const CONTROL: char = '\u{E009}';
pub const ALT: char = '\u{E00A}';
pub const ESCAPE: char = '\u{E00C}';
pub const SPACE: char = '\u{E00D}';
pub const END: char = '\u{E010}';
pub const HOME: char = '\u{E011}';
pub const ARROW_LEFT: char = '\u{E012}';
pub const ARROW_UP: char = '\u{E013}';
pub const ARROW_RIGHT: char = '\u{E014}';
pub const ARROW_DOWN: char = '\u{E015}';
pub const DELETE: char = '\u{E017}';

/// `key` repeated `times` times, ready for `send_keys`.
pub fn repeat(key: char, times: usize) -> String {
    std::iter::repeat(key).take(times).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_keys() {
        let tabs = repeat(TAB, 7);
        assert_eq!(tabs.chars().count(), 7);
        assert!(tabs.chars().all(|c| c == TAB));
        assert!(repeat(ENTER, 0).is_empty());
    }
}
