//! Vertical layout cursor.
//!
//! The cursor is a plain value threaded through the layout routine. It knows
//! nothing about draw operations; the caller opens a new page whenever
//! [`PageCursor::ensure_room`] reports a break.

/// Current vertical position (mm from the top edge) and page index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageCursor {
    y: f32,
    page: usize,
    top_margin: f32,
}

impl PageCursor {
    /// Start on page 0 at `start_y`; later pages start at `top_margin`.
    pub fn new(start_y: f32, top_margin: f32) -> Self {
        Self {
            y: start_y,
            page: 0,
            top_margin,
        }
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    /// 0-indexed page the cursor is on.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn advance(&mut self, dy: f32) {
        self.y += dy;
    }

    /// Move down by `lines` lines of `line_height` plus `spacing`.
    pub fn advance_lines(&mut self, lines: usize, line_height: f32, spacing: f32) {
        self.y += lines as f32 * line_height + spacing;
    }

    /// `true` once the cursor has moved past `threshold`.
    pub fn needs_break(&self, threshold: f32) -> bool {
        self.y > threshold
    }

    /// Move to the top of the next page.
    pub fn break_page(&mut self) {
        self.page += 1;
        self.y = self.top_margin;
    }

    /// Break the page if the cursor is past `threshold`. Returns `true` when a
    /// new page was started.
    pub fn ensure_room(&mut self, threshold: f32) -> bool {
        if self.needs_break(threshold) {
            self.break_page();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_by_wrapped_lines() {
        let mut c = PageCursor::new(100.0, 20.0);
        c.advance_lines(3, 5.0, 4.0);
        assert_eq!(c.y(), 119.0);
        assert_eq!(c.page(), 0);
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut c = PageCursor::new(280.0, 20.0);
        assert!(!c.ensure_room(280.0));
        c.advance(0.5);
        assert!(c.ensure_room(280.0));
        assert_eq!(c.page(), 1);
        assert_eq!(c.y(), 20.0);
    }

    #[test]
    fn block_threshold_trips_before_item_threshold() {
        let c = PageCursor::new(260.0, 20.0);
        assert!(c.needs_break(250.0));
        assert!(!c.needs_break(280.0));
    }

    #[test]
    fn consecutive_breaks_count_pages() {
        let mut c = PageCursor::new(0.0, 20.0);
        c.break_page();
        c.break_page();
        assert_eq!(c.page(), 2);
        assert_eq!(c.y(), 20.0);
    }
}
