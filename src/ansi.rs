//! Raw ANSI escape sequences for cursor movement and screen clearing.
//!
//! Pure functions with no state; every caller gets a fresh string to hand
//! to the screen.

const ESC: &str = "\x1b[";

/// Builds a sequence moving the cursor `dx` columns (negative = left) and
/// `dy` rows (negative = up). Zero deltas contribute nothing, so a (0, 0)
/// move yields an empty string.
pub fn cursor_move(dx: i32, dy: i32) -> String {
    let mut sequence = String::new();
    if dx < 0 {
        sequence.push_str(&format!("{}{}D", ESC, -dx));
    } else if dx > 0 {
        sequence.push_str(&format!("{}{}C", ESC, dx));
    }
    if dy < 0 {
        sequence.push_str(&format!("{}{}A", ESC, -dy));
    } else if dy > 0 {
        sequence.push_str(&format!("{}{}B", ESC, dy));
    }
    sequence
}

pub fn cursor_save() -> String {
    format!("{}s", ESC)
}

pub fn cursor_restore() -> String {
    format!("{}u", ESC)
}

/// Erases the visible screen and the scrollback, then homes the cursor.
pub fn clear_screen() -> String {
    format!("{esc}2J{esc}3J{esc}H", esc = ESC)
}
