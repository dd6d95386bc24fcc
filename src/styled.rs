//! Plain text plus a set of half-open style ranges over it.
//!
//! Offsets are counted in characters, not bytes. Ranges of the same kind are
//! kept merged and sorted, and colors never overlap each other, so two
//! values with the same effective styling compare equal.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl TextColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        TextColor { r, g, b }
    }
}

/// Colors offered by the editor, in picker order.
pub const PALETTE: [(&str, TextColor); 8] = [
    ("black", TextColor::new(0x00, 0x00, 0x00)),
    ("red", TextColor::new(0xFF, 0x00, 0x00)),
    ("blue", TextColor::new(0x00, 0x00, 0xFF)),
    ("green", TextColor::new(0x00, 0xFF, 0x00)),
    ("yellow", TextColor::new(0xFF, 0xFF, 0x00)),
    ("purple", TextColor::new(0x9C, 0x27, 0xB0)),
    ("orange", TextColor::new(0xFF, 0x98, 0x00)),
    ("pink", TextColor::new(0xE9, 0x1E, 0x63)),
];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid color: {0:?} (expected #RRGGBB)")]
pub struct ColorParseError(String);

impl FromStr for TextColor {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        match hex.len() {
            6 => {
                let value = u32::from_str_radix(hex, 16).map_err(|_| err())?;
                Ok(TextColor::new(
                    (value >> 16) as u8,
                    (value >> 8) as u8,
                    value as u8,
                ))
            }
            3 => {
                let digits: Vec<u8> = hex
                    .chars()
                    .filter_map(|c| c.to_digit(16))
                    .map(|d| d as u8 * 17)
                    .collect();
                Ok(TextColor::new(digits[0], digits[1], digits[2]))
            }
            _ => Err(err()),
        }
    }
}

impl fmt::Display for TextColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleKind {
    Bold,
    Italic,
    Foreground(TextColor),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyledRange {
    pub start: usize,
    pub end: usize,
    pub kind: StyleKind,
}

impl StyledRange {
    pub fn new(kind: StyleKind, start: usize, end: usize) -> Self {
        StyledRange { start, end, kind }
    }

    fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }
}

/// Effective styling of a single position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveStyles {
    pub bold: bool,
    pub italic: bool,
    pub color: Option<TextColor>,
}

impl ActiveStyles {
    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && self.color.is_none()
    }
}

/// A maximal stretch of text with uniform styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleRun {
    pub start: usize,
    pub end: usize,
    pub style: ActiveStyles,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StyleError {
    #[error("invalid range {start}..{end} for text of length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledText {
    text: String,
    len: usize,
    ranges: Vec<StyledRange>,
}

impl StyledText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let len = text.chars().count();
        StyledText {
            text,
            len,
            ranges: Vec::new(),
        }
    }

    /// Builds a value by applying `ranges` in order, so later colors win
    /// where colors overlap.
    pub fn from_parts(
        text: impl Into<String>,
        ranges: impl IntoIterator<Item = StyledRange>,
    ) -> Result<Self, StyleError> {
        let mut styled = StyledText::new(text);
        for range in ranges {
            styled.apply_style(range.kind, range.start, range.end)?;
        }
        Ok(styled)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn ranges(&self) -> &[StyledRange] {
        &self.ranges
    }

    pub fn ranges_of(&self, kind: StyleKind) -> impl Iterator<Item = &StyledRange> + '_ {
        self.ranges.iter().filter(move |r| r.kind == kind)
    }

    /// Bold and italic are an idempotent union. A color first clears every
    /// other color from `[start, end)`.
    pub fn apply_style(
        &mut self,
        kind: StyleKind,
        start: usize,
        end: usize,
    ) -> Result<(), StyleError> {
        if !self.check_range(start, end)? {
            return Ok(());
        }
        if let StyleKind::Foreground(_) = kind {
            self.subtract(|k| matches!(k, StyleKind::Foreground(_)), start, end);
        }
        self.ranges.push(StyledRange::new(kind, start, end));
        self.normalize();
        Ok(())
    }

    /// Removes `kind` from exactly `[start, end)`, splitting ranges that
    /// straddle either boundary.
    pub fn remove_style(
        &mut self,
        kind: StyleKind,
        start: usize,
        end: usize,
    ) -> Result<(), StyleError> {
        if !self.check_range(start, end)? {
            return Ok(());
        }
        self.subtract(|k| *k == kind, start, end);
        self.normalize();
        Ok(())
    }

    /// Removes any foreground color from `[start, end)`.
    pub fn clear_color(&mut self, start: usize, end: usize) -> Result<(), StyleError> {
        if !self.check_range(start, end)? {
            return Ok(());
        }
        self.subtract(|k| matches!(k, StyleKind::Foreground(_)), start, end);
        self.normalize();
        Ok(())
    }

    /// True when every offset of a non-empty `[start, end)` carries `kind`.
    pub fn is_style_active_throughout(
        &self,
        kind: StyleKind,
        start: usize,
        end: usize,
    ) -> Result<bool, StyleError> {
        if !self.check_range(start, end)? {
            return Ok(false);
        }
        Ok(self
            .ranges_of(kind)
            .any(|r| r.start <= start && r.end >= end))
    }

    /// Fully active turns off, anything else turns on. Returns whether the
    /// style is active over the range afterwards.
    pub fn toggle_style(
        &mut self,
        kind: StyleKind,
        start: usize,
        end: usize,
    ) -> Result<bool, StyleError> {
        if !self.check_range(start, end)? {
            return Ok(false);
        }
        if self.is_style_active_throughout(kind, start, end)? {
            self.remove_style(kind, start, end)?;
            Ok(false)
        } else {
            self.apply_style(kind, start, end)?;
            Ok(true)
        }
    }

    pub fn styles_at(&self, pos: usize) -> ActiveStyles {
        let mut styles = ActiveStyles::default();
        for range in self.ranges.iter().filter(|r| r.contains(pos)) {
            match range.kind {
                StyleKind::Bold => styles.bold = true,
                StyleKind::Italic => styles.italic = true,
                StyleKind::Foreground(color) => styles.color = Some(color),
            }
        }
        styles
    }

    pub fn runs(&self) -> Vec<StyleRun> {
        if self.len == 0 {
            return Vec::new();
        }
        let mut bounds = vec![0, self.len];
        for range in &self.ranges {
            bounds.push(range.start);
            bounds.push(range.end);
        }
        bounds.sort_unstable();
        bounds.dedup();

        let mut runs: Vec<StyleRun> = Vec::new();
        for pair in bounds.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let style = self.styles_at(start);
            match runs.last_mut() {
                Some(last) if last.style == style && last.end == start => last.end = end,
                _ => runs.push(StyleRun { start, end, style }),
            }
        }
        runs
    }

    /// Slice of the text between two character offsets.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let from = self.byte_index(start.min(self.len));
        let to = self.byte_index(end.min(self.len));
        &self.text[from..to.max(from)]
    }

    /// Ranges starting at or after `at` move right. A range with
    /// `start < at <= end` grows, so text typed at the end of a styled run
    /// inherits its style.
    pub fn insert_text(&mut self, at: usize, text: &str) -> Result<(), StyleError> {
        if at > self.len {
            return Err(StyleError::InvalidRange {
                start: at,
                end: at,
                len: self.len,
            });
        }
        let added = text.chars().count();
        if added == 0 {
            return Ok(());
        }
        let byte = self.byte_index(at);
        self.text.insert_str(byte, text);
        self.len += added;
        for range in &mut self.ranges {
            if range.start >= at {
                range.start += added;
                range.end += added;
            } else if range.end >= at {
                range.end += added;
            }
        }
        self.normalize();
        Ok(())
    }

    pub fn delete_text(&mut self, start: usize, end: usize) -> Result<(), StyleError> {
        if !self.check_range(start, end)? {
            return Ok(());
        }
        let from = self.byte_index(start);
        let to = self.byte_index(end);
        self.text.replace_range(from..to, "");
        let removed = end - start;
        self.len -= removed;

        let map = |pos: usize| {
            if pos <= start {
                pos
            } else if pos <= end {
                start
            } else {
                pos - removed
            }
        };
        for range in &mut self.ranges {
            range.start = map(range.start);
            range.end = map(range.end);
        }
        self.normalize();
        Ok(())
    }

    /// Ok(false) for an empty in-bounds range, error when out of bounds or
    /// inverted.
    fn check_range(&self, start: usize, end: usize) -> Result<bool, StyleError> {
        if start > end || end > self.len {
            return Err(StyleError::InvalidRange {
                start,
                end,
                len: self.len,
            });
        }
        Ok(start < end)
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len())
    }

    fn subtract<F>(&mut self, matches: F, start: usize, end: usize)
    where
        F: Fn(&StyleKind) -> bool,
    {
        let mut kept = Vec::with_capacity(self.ranges.len() + 1);
        for range in self.ranges.drain(..) {
            if !matches(&range.kind) || range.end <= start || range.start >= end {
                kept.push(range);
                continue;
            }
            if range.start < start {
                kept.push(StyledRange::new(range.kind, range.start, start));
            }
            if range.end > end {
                kept.push(StyledRange::new(range.kind, end, range.end));
            }
        }
        self.ranges = kept;
    }

    fn normalize(&mut self) {
        self.ranges.retain(|r| r.start < r.end);
        self.ranges
            .sort_by(|a, b| (a.kind, a.start, a.end).cmp(&(b.kind, b.start, b.end)));
        let mut merged: Vec<StyledRange> = Vec::with_capacity(self.ranges.len());
        for range in self.ranges.drain(..) {
            match merged.last_mut() {
                Some(last) if last.kind == range.kind && range.start <= last.end => {
                    last.end = last.end.max(range.end);
                }
                _ => merged.push(range),
            }
        }
        self.ranges = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: TextColor = TextColor::new(0xFF, 0, 0);
    const BLUE: TextColor = TextColor::new(0, 0, 0xFF);

    fn spans(text: &StyledText, kind: StyleKind) -> Vec<(usize, usize)> {
        text.ranges_of(kind).map(|r| (r.start, r.end)).collect()
    }

    #[test]
    fn apply_then_query_is_active_for_every_range() {
        let base = StyledText::new("abcdefg");
        for start in 0..base.len() {
            for end in start + 1..=base.len() {
                for kind in [StyleKind::Bold, StyleKind::Italic, StyleKind::Foreground(RED)] {
                    let mut text = base.clone();
                    text.apply_style(StyleKind::Italic, 1, 3).unwrap();
                    text.apply_style(kind, start, end).unwrap();
                    assert!(text.is_style_active_throughout(kind, start, end).unwrap());
                }
            }
        }
    }

    #[test]
    fn remove_clears_range_and_keeps_outside() {
        for start in 0..8 {
            for end in start + 1..=8 {
                let mut text = StyledText::new("abcdefgh");
                text.apply_style(StyleKind::Bold, 0, 8).unwrap();
                text.remove_style(StyleKind::Bold, start, end).unwrap();
                assert!(!text
                    .is_style_active_throughout(StyleKind::Bold, start, end)
                    .unwrap());
                for pos in 0..8 {
                    let inside = pos >= start && pos < end;
                    assert_eq!(text.styles_at(pos).bold, !inside, "pos {pos}");
                }
            }
        }
    }

    #[test]
    fn remove_splits_bold_and_leaves_italic() {
        let mut text = StyledText::new("0123456789");
        text.apply_style(StyleKind::Bold, 0, 10).unwrap();
        text.apply_style(StyleKind::Italic, 3, 6).unwrap();
        text.remove_style(StyleKind::Bold, 3, 6).unwrap();
        assert_eq!(spans(&text, StyleKind::Bold), vec![(0, 3), (6, 10)]);
        assert_eq!(spans(&text, StyleKind::Italic), vec![(3, 6)]);
    }

    #[test]
    fn typing_at_end_of_bold_run_inherits_bold() {
        let mut text = StyledText::new("hello");
        text.apply_style(StyleKind::Bold, 0, 5).unwrap();
        text.insert_text(5, "!!").unwrap();
        assert_eq!(text.text(), "hello!!");
        assert_eq!(spans(&text, StyleKind::Bold), vec![(0, 7)]);
    }

    #[test]
    fn insert_shifts_ranges_at_or_after_position() {
        let mut text = StyledText::new("abcdef");
        text.apply_style(StyleKind::Italic, 2, 4).unwrap();
        text.insert_text(2, "XY").unwrap();
        assert_eq!(text.text(), "abXYcdef");
        assert_eq!(spans(&text, StyleKind::Italic), vec![(4, 6)]);

        text.insert_text(5, "z").unwrap();
        assert_eq!(spans(&text, StyleKind::Italic), vec![(4, 7)]);
    }

    #[test]
    fn insert_handles_multibyte_text() {
        let mut text = StyledText::new("日本語");
        text.apply_style(StyleKind::Bold, 1, 2).unwrap();
        text.insert_text(1, "ü").unwrap();
        assert_eq!(text.text(), "日ü本語");
        assert_eq!(spans(&text, StyleKind::Bold), vec![(2, 3)]);
        assert_eq!(text.slice(2, 3), "本");
    }

    #[test]
    fn delete_clips_shifts_and_drops() {
        let mut text = StyledText::new("0123456789");
        text.apply_style(StyleKind::Bold, 0, 2).unwrap();
        text.apply_style(StyleKind::Italic, 3, 5).unwrap();
        text.apply_style(StyleKind::Foreground(RED), 4, 8).unwrap();
        text.apply_style(StyleKind::Foreground(BLUE), 8, 10).unwrap();
        text.delete_text(3, 6).unwrap();

        assert_eq!(text.text(), "0126789");
        assert_eq!(spans(&text, StyleKind::Bold), vec![(0, 2)]);
        assert!(spans(&text, StyleKind::Italic).is_empty());
        assert_eq!(spans(&text, StyleKind::Foreground(RED)), vec![(3, 5)]);
        assert_eq!(spans(&text, StyleKind::Foreground(BLUE)), vec![(5, 7)]);
    }

    #[test]
    fn delete_joins_split_ranges() {
        let mut text = StyledText::new("0123456789");
        text.apply_style(StyleKind::Bold, 0, 3).unwrap();
        text.apply_style(StyleKind::Bold, 6, 10).unwrap();
        text.delete_text(3, 6).unwrap();
        assert_eq!(spans(&text, StyleKind::Bold), vec![(0, 7)]);
    }

    #[test]
    fn color_overwrites_intersecting_colors() {
        let mut text = StyledText::new("0123456789");
        text.apply_style(StyleKind::Foreground(RED), 0, 10).unwrap();
        text.apply_style(StyleKind::Bold, 2, 5).unwrap();
        text.apply_style(StyleKind::Foreground(BLUE), 3, 6).unwrap();

        assert_eq!(
            spans(&text, StyleKind::Foreground(RED)),
            vec![(0, 3), (6, 10)]
        );
        assert_eq!(spans(&text, StyleKind::Foreground(BLUE)), vec![(3, 6)]);
        assert_eq!(
            text.styles_at(4),
            ActiveStyles {
                bold: true,
                italic: false,
                color: Some(BLUE),
            }
        );
    }

    #[test]
    fn bold_is_idempotent() {
        let mut once = StyledText::new("abcdef");
        once.apply_style(StyleKind::Bold, 1, 4).unwrap();
        let mut twice = once.clone();
        twice.apply_style(StyleKind::Bold, 1, 4).unwrap();
        twice.apply_style(StyleKind::Bold, 2, 3).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn toggle_removes_only_when_fully_active() {
        let mut text = StyledText::new("abcdef");
        text.apply_style(StyleKind::Bold, 0, 3).unwrap();

        assert!(text.toggle_style(StyleKind::Bold, 1, 5).unwrap());
        assert_eq!(spans(&text, StyleKind::Bold), vec![(0, 5)]);

        assert!(!text.toggle_style(StyleKind::Bold, 1, 5).unwrap());
        assert_eq!(spans(&text, StyleKind::Bold), vec![(0, 1)]);
    }

    #[test]
    fn empty_range_is_noop_and_bad_range_errors() {
        let mut text = StyledText::new("abc");
        text.apply_style(StyleKind::Bold, 2, 2).unwrap();
        assert!(text.ranges().is_empty());
        assert!(!text.is_style_active_throughout(StyleKind::Bold, 1, 1).unwrap());

        let err = text.apply_style(StyleKind::Bold, 2, 4).unwrap_err();
        assert_eq!(
            err,
            StyleError::InvalidRange {
                start: 2,
                end: 4,
                len: 3
            }
        );
        assert!(text.remove_style(StyleKind::Italic, 2, 1).is_err());
        assert!(text.insert_text(4, "x").is_err());
        assert!(text.delete_text(0, 9).is_err());

        let mut empty = StyledText::new("");
        assert!(empty.apply_style(StyleKind::Bold, 0, 1).is_err());
        assert!(empty.runs().is_empty());
    }

    #[test]
    fn runs_cover_text_and_merge_identical_neighbours() {
        let mut text = StyledText::new("abcdefgh");
        text.apply_style(StyleKind::Bold, 2, 4).unwrap();
        text.apply_style(StyleKind::Bold, 4, 6).unwrap();
        text.apply_style(StyleKind::Italic, 5, 7).unwrap();

        let runs: Vec<(usize, usize, bool, bool)> = text
            .runs()
            .iter()
            .map(|r| (r.start, r.end, r.style.bold, r.style.italic))
            .collect();
        assert_eq!(
            runs,
            vec![
                (0, 2, false, false),
                (2, 5, true, false),
                (5, 6, true, true),
                (6, 7, false, true),
                (7, 8, false, false),
            ]
        );
    }

    #[test]
    fn from_parts_applies_in_order() {
        let text = StyledText::from_parts(
            "abcdef",
            [
                StyledRange::new(StyleKind::Foreground(RED), 0, 6),
                StyledRange::new(StyleKind::Foreground(BLUE), 2, 4),
            ],
        )
        .unwrap();
        assert_eq!(text.styles_at(3).color, Some(BLUE));
        assert_eq!(text.styles_at(5).color, Some(RED));
    }

    #[test]
    fn parses_and_prints_colors() {
        assert_eq!("#ff6b6b".parse::<TextColor>().unwrap(), TextColor::new(0xFF, 0x6B, 0x6B));
        assert_eq!("#0f0".parse::<TextColor>().unwrap(), TextColor::new(0, 0xFF, 0));
        assert_eq!(TextColor::new(0x9C, 0x27, 0xB0).to_string(), "#9C27B0");
        assert!("red".parse::<TextColor>().is_err());
        assert!("#12345".parse::<TextColor>().is_err());
        assert!("#GGGGGG".parse::<TextColor>().is_err());
    }
}
