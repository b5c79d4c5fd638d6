use std::sync::Arc;

use crate::ansi;
use crate::screen::Screen;

/// The in-progress command line: a text buffer plus a char-offset cursor,
/// kept in sync with what is painted on the terminal. All cursor arithmetic
/// is wrap-aware: a buffer longer than the viewport spans several terminal
/// rows, and the prompt's last line occupies the left margin of the first.
pub struct LineEditor {
    screen: Arc<dyn Screen>,
    text: String,
    /// Char offset into `text`, always within `[0, text.chars().count()]`.
    cursor: usize,
    /// Length of the prompt's last line; fixed margin on the first row.
    prompt_len: usize,
}

fn is_printable(c: char) -> bool {
    ('\u{20}'..='\u{7e}').contains(&c) || c >= '\u{a0}'
}

impl LineEditor {
    pub fn new(screen: Arc<dyn Screen>) -> Self {
        Self {
            screen,
            text: String::new(),
            cursor: 0,
            prompt_len: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn set_prompt_len(&mut self, len: usize) {
        self.prompt_len = len;
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_at(&self, chars: usize) -> usize {
        self.text
            .char_indices()
            .nth(chars)
            .map(|(index, _)| index)
            .unwrap_or(self.text.len())
    }

    /// Emits the escape sequence taking the terminal cursor from one buffer
    /// offset to another, accounting for line wrap and the prompt margin.
    fn write_move(&self, from: usize, to: usize) {
        if from == to {
            return;
        }
        let columns = self.screen.columns().max(1);
        let from_row = (from + self.prompt_len) / columns;
        let from_col = (from + self.prompt_len) % columns;
        let to_row = (to + self.prompt_len) / columns;
        let to_col = (to + self.prompt_len) % columns;
        let sequence = ansi::cursor_move(
            to_col as i32 - from_col as i32,
            to_row as i32 - from_row as i32,
        );
        if !sequence.is_empty() {
            self.screen.write(&sequence);
        }
    }

    /// Splices `input` in at the cursor. Only the new text and the old tail
    /// are repainted; the cursor ends up just after the inserted text.
    /// Control characters are dropped silently.
    pub fn insert(&mut self, input: &str) {
        let printable: String = input.chars().filter(|c| is_printable(*c)).collect();
        if printable.is_empty() {
            return;
        }
        let at = self.byte_at(self.cursor);
        let tail = self.text[at..].to_string();
        self.text.insert_str(at, &printable);

        self.screen.write(&printable);
        if !tail.is_empty() {
            self.screen.write(&tail);
        }

        self.cursor += printable.chars().count();
        let painted_end = self.cursor + tail.chars().count();
        self.write_move(painted_end, self.cursor);
    }

    /// Removes the character just before the cursor, shifting the tail left
    /// on screen and blanking the vacated trailing cell. No-op at offset 0.
    pub fn delete_back(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let target = self.cursor - 1;
        self.write_move(self.cursor, target);

        let at = self.byte_at(target);
        self.text.remove(at);
        let tail = self.text[at..].to_string();

        if !tail.is_empty() {
            self.screen.write(&tail);
        }
        self.screen.write(" ");

        self.cursor = target;
        self.write_move(target + tail.chars().count() + 1, target);
    }

    /// Moves the cursor `count` chars (negative = left), clamped to the
    /// buffer. Returns the actually applied delta; a fully clamped or zero
    /// move writes nothing.
    pub fn move_cursor(&mut self, count: isize) -> isize {
        let len = self.char_len() as isize;
        let target = (self.cursor as isize + count).clamp(0, len);
        let applied = target - self.cursor as isize;
        if applied == 0 {
            return 0;
        }
        self.write_move(self.cursor, target as usize);
        self.cursor = target as usize;
        applied
    }

    pub fn move_to_end(&mut self) {
        let len = self.char_len() as isize;
        self.move_cursor(len - self.cursor as isize);
    }

    /// Swaps the whole displayed line for `new_text`: the old content is
    /// overwritten with spaces, then the replacement is painted with the
    /// cursor at its end. Used by history recall.
    pub fn replace(&mut self, new_text: &str) {
        let old_len = self.char_len();
        self.write_move(self.cursor, 0);
        if old_len > 0 {
            self.screen.write(&" ".repeat(old_len));
            self.write_move(old_len, 0);
        }
        self.text.clear();
        self.cursor = 0;
        self.insert(new_text);
    }

    /// Resets the buffer without touching the screen.
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::CaptureScreen;

    fn editor_with(columns: usize, prompt_len: usize) -> (LineEditor, Arc<CaptureScreen>) {
        let screen = Arc::new(CaptureScreen::new(columns));
        let mut editor = LineEditor::new(screen.clone());
        editor.set_prompt_len(prompt_len);
        (editor, screen)
    }

    #[test]
    fn test_insert_appends_and_tracks_cursor() {
        let (mut editor, screen) = editor_with(80, 2);
        for c in ["b", "o", "o", "k"] {
            editor.insert(c);
        }
        assert_eq!(editor.text(), "book");
        assert_eq!(editor.cursor(), 4);
        assert_eq!(screen.contents(), "book");
    }

    #[test]
    fn test_insert_filters_control_characters() {
        let (mut editor, _screen) = editor_with(80, 2);
        editor.insert("a\u{7}b\u{1b}c");
        assert_eq!(editor.text(), "abc");

        editor.insert("\u{3}");
        assert_eq!(editor.text(), "abc");
    }

    #[test]
    fn test_insert_accepts_latin1_supplement() {
        let (mut editor, _screen) = editor_with(80, 2);
        editor.insert("zürich");
        assert_eq!(editor.text(), "zürich");
        assert_eq!(editor.cursor(), 6);
    }

    #[test]
    fn test_insert_in_middle_repaints_tail_only() {
        let (mut editor, screen) = editor_with(80, 2);
        editor.insert("held");
        editor.move_cursor(-1);
        editor.insert("l");
        assert_eq!(editor.text(), "helld");
        // After "held" and a one-left move, the insert paints "l" plus the
        // old tail "d", then moves one column back.
        let contents = screen.contents();
        assert!(contents.ends_with("ld\x1b[1D"));
        assert_eq!(editor.cursor(), 4);
    }

    #[test]
    fn test_delete_back_at_start_is_noop() {
        let (mut editor, screen) = editor_with(80, 2);
        editor.delete_back();
        assert_eq!(editor.text(), "");
        assert_eq!(screen.contents(), "");
    }

    #[test]
    fn test_delete_back_in_middle_shifts_tail() {
        let (mut editor, screen) = editor_with(80, 2);
        editor.insert("abcd");
        editor.move_cursor(-2);
        editor.delete_back();
        assert_eq!(editor.text(), "acd");
        assert_eq!(editor.cursor(), 1);
        // Tail "cd" repainted, vacated cell blanked, cursor restored.
        assert!(screen.contents().ends_with("cd \x1b[3D"));
    }

    #[test]
    fn test_move_cursor_clamps_both_ends() {
        let (mut editor, _screen) = editor_with(80, 2);
        editor.insert("abcde");

        assert_eq!(editor.move_cursor(-1000), -5);
        assert_eq!(editor.cursor(), 0);

        assert_eq!(editor.move_cursor(1000), 5);
        assert_eq!(editor.cursor(), 5);

        assert_eq!(editor.move_cursor(0), 0);
        assert_eq!(editor.cursor(), 5);
    }

    #[test]
    fn test_zero_move_writes_nothing() {
        let (mut editor, screen) = editor_with(80, 2);
        editor.insert("ab");
        let before = screen.contents();
        editor.move_cursor(0);
        assert_eq!(screen.contents(), before);
    }

    #[test]
    fn test_move_cursor_crosses_wrapped_rows() {
        // 10 columns, prompt "$ " (2 chars): 20 chars of text end on row 2.
        let (mut editor, screen) = editor_with(10, 2);
        editor.insert("aaaaaaaaaaaaaaaaaaaa");
        assert_eq!(editor.cursor(), 20);

        // Offset 20 sits at row 2 col 2; offset 5 at row 0 col 7.
        editor.move_cursor(-15);
        assert!(screen.contents().ends_with("\x1b[5C\x1b[2A"));
        assert_eq!(editor.cursor(), 5);

        editor.move_cursor(15);
        assert!(screen.contents().ends_with("\x1b[5D\x1b[2B"));
    }

    #[test]
    fn test_replace_blanks_old_content() {
        let (mut editor, screen) = editor_with(80, 2);
        editor.insert("flights");
        editor.replace("help");
        assert_eq!(editor.text(), "help");
        assert_eq!(editor.cursor(), 4);
        let contents = screen.contents();
        // Seven spaces cover the old text before the replacement is painted.
        assert!(contents.contains("       "));
        assert!(contents.ends_with("help"));
    }

    #[test]
    fn test_clear_resets_without_painting() {
        let (mut editor, screen) = editor_with(80, 2);
        editor.insert("abc");
        let before = screen.contents();
        editor.clear();
        assert_eq!(editor.text(), "");
        assert_eq!(editor.cursor(), 0);
        assert_eq!(screen.contents(), before);
    }
}
