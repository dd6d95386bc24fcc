//! Editing session state for the TUI: a single-line input field and a
//! styled body with a cursor and an optional selection.

use crate::model::{Note, TagId};
use crate::styled::{StyleError, StyleKind, StyledText, PALETTE};

/// Single-line input with a byte cursor, optionally capped in characters.
#[derive(Clone, Debug, Default)]
pub struct FieldValue {
    pub value: String,
    cursor: usize,
    max_chars: Option<usize>,
}

impl FieldValue {
    pub fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
            max_chars: None,
        }
    }

    pub fn capped(value: &str, max_chars: usize) -> Self {
        FieldValue {
            max_chars: Some(max_chars),
            ..FieldValue::new(value)
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = prev_char(self.cursor, &self.value);
    }

    pub fn move_right(&mut self) {
        self.cursor = next_char(self.cursor, &self.value);
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_char(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    /// Returns false when the cap would be exceeded.
    pub fn insert_char(&mut self, ch: char) -> bool {
        if ch == '\n' {
            return false;
        }
        if let Some(max) = self.max_chars {
            if self.value.chars().count() >= max {
                return false;
            }
        }
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        true
    }

    pub fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EditorField {
    Title,
    Body,
    Tag,
}

/// A note being created (`note_id == None`) or edited.
pub struct Editor {
    pub note_id: Option<i64>,
    pub title: FieldValue,
    pub tag_id: Option<TagId>,
    pub field: EditorField,
    body: StyledText,
    cursor: usize,
    anchor: Option<usize>,
    color_step: usize,
}

impl Editor {
    pub fn new(max_title: usize, tag_id: Option<TagId>) -> Self {
        Editor {
            note_id: None,
            title: FieldValue::capped("", max_title),
            tag_id,
            field: EditorField::Title,
            body: StyledText::default(),
            cursor: 0,
            anchor: None,
            color_step: 0,
        }
    }

    pub fn from_note(note: &Note, max_title: usize) -> Self {
        let body = note.body();
        Editor {
            note_id: Some(note.id),
            title: FieldValue::capped(&note.title, max_title.max(note.title.chars().count())),
            tag_id: note.tag_id,
            field: EditorField::Title,
            cursor: body.len(),
            body,
            anchor: None,
            color_step: 0,
        }
    }

    pub fn body(&self) -> &StyledText {
        &self.body
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn next_field(&mut self) {
        self.field = match self.field {
            EditorField::Title => EditorField::Body,
            EditorField::Body => EditorField::Tag,
            EditorField::Tag => EditorField::Title,
        };
    }

    pub fn prev_field(&mut self) {
        self.field = match self.field {
            EditorField::Title => EditorField::Tag,
            EditorField::Body => EditorField::Title,
            EditorField::Tag => EditorField::Body,
        };
    }

    /// Selected `[start, end)`, if non-empty.
    pub fn selection(&self) -> Option<(usize, usize)> {
        let anchor = self.anchor?;
        let (start, end) = if anchor <= self.cursor {
            (anchor, self.cursor)
        } else {
            (self.cursor, anchor)
        };
        (start < end).then_some((start, end))
    }

    pub fn insert(&mut self, text: &str) -> Result<(), StyleError> {
        self.delete_selection()?;
        self.body.insert_text(self.cursor, text)?;
        self.cursor += text.chars().count();
        Ok(())
    }

    pub fn backspace(&mut self) -> Result<(), StyleError> {
        if self.delete_selection()? || self.cursor == 0 {
            return Ok(());
        }
        self.body.delete_text(self.cursor - 1, self.cursor)?;
        self.cursor -= 1;
        Ok(())
    }

    pub fn delete_forward(&mut self) -> Result<(), StyleError> {
        if self.delete_selection()? || self.cursor >= self.body.len() {
            return Ok(());
        }
        self.body.delete_text(self.cursor, self.cursor + 1)
    }

    fn delete_selection(&mut self) -> Result<bool, StyleError> {
        let Some((start, end)) = self.selection() else {
            self.anchor = None;
            return Ok(false);
        };
        self.body.delete_text(start, end)?;
        self.cursor = start;
        self.anchor = None;
        Ok(true)
    }

    pub fn move_left(&mut self, extend: bool) {
        self.begin_move(extend);
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self, extend: bool) {
        self.begin_move(extend);
        self.cursor = (self.cursor + 1).min(self.body.len());
    }

    pub fn move_up(&mut self, extend: bool) {
        self.begin_move(extend);
        let starts = line_starts(self.body.text());
        let (line, col) = locate(&starts, self.cursor);
        if line > 0 {
            self.cursor = self.column_in_line(&starts, line - 1, col);
        }
    }

    pub fn move_down(&mut self, extend: bool) {
        self.begin_move(extend);
        let starts = line_starts(self.body.text());
        let (line, col) = locate(&starts, self.cursor);
        if line + 1 < starts.len() {
            self.cursor = self.column_in_line(&starts, line + 1, col);
        }
    }

    pub fn home(&mut self, extend: bool) {
        self.begin_move(extend);
        let starts = line_starts(self.body.text());
        let (line, _) = locate(&starts, self.cursor);
        self.cursor = starts[line];
    }

    pub fn end(&mut self, extend: bool) {
        self.begin_move(extend);
        let starts = line_starts(self.body.text());
        let (line, _) = locate(&starts, self.cursor);
        self.cursor = self.line_end(&starts, line);
    }

    /// Toggles bold or italic over the selection. `None` without a
    /// selection.
    pub fn toggle(&mut self, kind: StyleKind) -> Result<Option<bool>, StyleError> {
        match self.selection() {
            Some((start, end)) => self.body.toggle_style(kind, start, end).map(Some),
            None => Ok(None),
        }
    }

    /// Paints the selection with the next palette color; the step after the
    /// last color clears it again. Returns the color name applied.
    pub fn cycle_color(&mut self) -> Result<Option<&'static str>, StyleError> {
        let Some((start, end)) = self.selection() else {
            return Ok(None);
        };
        let step = self.color_step % (PALETTE.len() + 1);
        self.color_step = step + 1;
        match PALETTE.get(step) {
            Some((name, color)) => {
                self.body
                    .apply_style(StyleKind::Foreground(*color), start, end)?;
                Ok(Some(name))
            }
            None => {
                self.body.clear_color(start, end)?;
                Ok(Some("none"))
            }
        }
    }

    fn begin_move(&mut self, extend: bool) {
        if extend {
            self.anchor.get_or_insert(self.cursor);
        } else {
            self.anchor = None;
        }
    }

    fn line_end(&self, starts: &[usize], line: usize) -> usize {
        starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.body.len())
    }

    fn column_in_line(&self, starts: &[usize], line: usize, col: usize) -> usize {
        (starts[line] + col).min(self.line_end(starts, line))
    }
}

/// Character offsets at which each line begins.
fn line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (idx, ch) in text.chars().enumerate() {
        if ch == '\n' {
            starts.push(idx + 1);
        }
    }
    starts
}

fn locate(starts: &[usize], cursor: usize) -> (usize, usize) {
    let line = starts
        .iter()
        .rposition(|start| *start <= cursor)
        .unwrap_or(0);
    (line, cursor - starts[line])
}

fn prev_char(cursor: usize, text: &str) -> usize {
    text[..cursor]
        .char_indices()
        .next_back()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_char(cursor: usize, text: &str) -> usize {
    text[cursor..]
        .chars()
        .next()
        .map(|ch| cursor + ch.len_utf8())
        .unwrap_or(cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup;

    fn typed(text: &str) -> Editor {
        let mut editor = Editor::new(20, None);
        editor.insert(text).unwrap();
        editor
    }

    #[test]
    fn field_respects_cap_and_multibyte_cursor() {
        let mut field = FieldValue::capped("", 3);
        assert!(field.insert_char('é'));
        assert!(field.insert_char('b'));
        field.move_left();
        field.move_left();
        assert!(field.insert_char('a'));
        assert!(!field.insert_char('z'));
        assert_eq!(field.value, "aéb");
        field.move_right();
        field.backspace();
        assert_eq!(field.value, "ab");
        assert_eq!(field.with_caret(), "a▌b");
    }

    #[test]
    fn shift_selection_drives_bold_toggle() {
        let mut editor = typed("hello world");
        editor.home(false);
        for _ in 0..5 {
            editor.move_right(true);
        }
        assert_eq!(editor.selection(), Some((0, 5)));
        assert_eq!(editor.toggle(StyleKind::Bold).unwrap(), Some(true));
        assert_eq!(markup::encode(editor.body()), "<b>hello</b> world");

        assert_eq!(editor.toggle(StyleKind::Bold).unwrap(), Some(false));
        assert!(editor.body().ranges().is_empty());

        editor.move_right(false);
        assert_eq!(editor.selection(), None);
        assert_eq!(editor.toggle(StyleKind::Italic).unwrap(), None);
    }

    #[test]
    fn typing_after_styled_run_inherits_style() {
        let mut editor = typed("hello");
        editor.home(false);
        editor.end(true);
        editor.toggle(StyleKind::Bold).unwrap();
        editor.end(false);
        editor.insert("!!").unwrap();
        assert_eq!(editor.body().text(), "hello!!");
        assert!(editor
            .body()
            .is_style_active_throughout(StyleKind::Bold, 0, 7)
            .unwrap());
    }

    #[test]
    fn typing_replaces_selection() {
        let mut editor = typed("abcdef");
        editor.move_left(true);
        editor.move_left(true);
        editor.insert("X").unwrap();
        assert_eq!(editor.body().text(), "abcdX");
        assert_eq!(editor.cursor(), 5);
        editor.backspace().unwrap();
        editor.home(false);
        editor.delete_forward().unwrap();
        assert_eq!(editor.body().text(), "bcd");
    }

    #[test]
    fn vertical_moves_clamp_to_line_length() {
        let mut editor = typed("long line\nab\nthird");
        editor.move_up(false);
        assert_eq!(editor.cursor(), 12);
        editor.move_up(false);
        assert_eq!(editor.cursor(), 2);
        editor.move_down(false);
        editor.move_down(false);
        assert_eq!(editor.cursor(), 15);
    }

    #[test]
    fn color_cycle_walks_palette_then_clears() {
        let mut editor = typed("paint");
        editor.home(false);
        editor.end(true);
        assert_eq!(editor.cycle_color().unwrap(), Some("black"));
        assert_eq!(editor.cycle_color().unwrap(), Some("red"));
        assert_eq!(
            markup::encode(editor.body()),
            "<span style=\"color:#FF0000;\">paint</span>"
        );
        for _ in 2..PALETTE.len() {
            editor.cycle_color().unwrap();
        }
        assert_eq!(editor.cycle_color().unwrap(), Some("none"));
        assert!(editor.body().ranges().is_empty());
    }

    #[test]
    fn from_note_loads_styled_body() {
        let now = chrono::Utc::now();
        let note = Note {
            id: 7,
            title: "Styled".into(),
            content: "plain".into(),
            formatted_content: "<i>plain</i>".into(),
            tag_id: Some(2),
            created_at: now,
            modified_at: now,
        };
        let editor = Editor::from_note(&note, 20);
        assert_eq!(editor.note_id, Some(7));
        assert_eq!(editor.tag_id, Some(2));
        assert_eq!(editor.cursor(), 5);
        assert!(editor
            .body()
            .is_style_active_throughout(StyleKind::Italic, 0, 5)
            .unwrap());
    }
}
