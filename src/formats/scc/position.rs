use crate::error::{CaptionError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }
}

pub const FALLBACK_POSITION: Position = Position::new(14, 0);

pub const MAX_COLUMN: u8 = 31;

/// A PAC on the next row is a line break; any other move is a repositioning.
/// Flags stay raised until the consumer acknowledges them.
#[derive(Debug, Clone, Default)]
pub struct PositionTracker {
    /// First entry anchors the caption, last entry is the cursor row.
    positions: Vec<Position>,
    fallback: Option<Position>,
    break_required: bool,
    repositioning_required: bool,
    /// Column requested by the PAC that caused the pending line break.
    last_column: Option<u8>,
}

impl PositionTracker {
    pub fn strict() -> Self {
        Self::default()
    }

    /// Falls back to row 14, column 0 when no PAC has been seen.
    pub fn with_default() -> Self {
        Self {
            fallback: Some(FALLBACK_POSITION),
            ..Self::default()
        }
    }

    pub fn update_positioning(&mut self, new: Position) {
        let new = Position::new(new.row, new.col.min(MAX_COLUMN));
        let Some(current) = self.positions.last().copied() else {
            self.positions = vec![new];
            return;
        };

        let col = if self.break_required {
            self.last_column.unwrap_or(current.col)
        } else {
            current.col
        };
        let is_tab_offset = new.row == current.row
            && (col.saturating_add(1)..=col.saturating_add(3)).contains(&new.col);

        if new.row == current.row + 1 {
            self.positions.push(Position::new(new.row, current.col));
            self.break_required = true;
            self.last_column = Some(new.col);
        } else if self.break_required && is_tab_offset {
            // indentation of the row we just broke onto
        } else if new != current {
            self.positions = vec![new];
            self.repositioning_required = true;
            self.break_required = false;
            self.last_column = None;
        }
    }

    pub fn tab_offset(&mut self, columns: u8) {
        let Some(cursor) = self.cursor() else {
            return;
        };
        let col = if self.break_required {
            self.last_column.unwrap_or(cursor.col)
        } else {
            cursor.col
        };
        self.update_positioning(Position::new(cursor.row, col.saturating_add(columns)));
    }

    /// Drops a pending line break and anchors at the row it points to.
    /// Used when the break arrives before the caption has any text.
    pub fn restart_at_cursor(&mut self) {
        if !self.break_required {
            return;
        }
        let Some(cursor) = self.positions.last().copied() else {
            return;
        };
        let col = self.last_column.unwrap_or(cursor.col);
        self.positions = vec![Position::new(cursor.row, col)];
        self.break_required = false;
        self.last_column = None;
    }

    /// Anchor position of the caption currently being built.
    pub fn current_position(&self) -> Result<Position> {
        if let Some(p) = self.positions.first() {
            return Ok(*p);
        }
        self.fallback.ok_or_else(|| {
            CaptionError::Syntax("no Preamble Address Code (PAC) was provided".to_string())
        })
    }

    fn cursor(&self) -> Option<Position> {
        self.positions.last().copied().or(self.fallback)
    }

    pub fn is_repositioning_required(&self) -> bool {
        self.repositioning_required
    }

    pub fn acknowledge_position_changed(&mut self) {
        self.repositioning_required = false;
    }

    pub fn is_linebreak_required(&self) -> bool {
        self.break_required
    }

    pub fn acknowledge_linebreak_consumed(&mut self) {
        self.break_required = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_pac_bootstraps_without_flags() {
        let mut t = PositionTracker::strict();
        t.update_positioning(Position::new(14, 0));
        assert_eq!(t.current_position().unwrap(), Position::new(14, 0));
        assert!(!t.is_linebreak_required());
        assert!(!t.is_repositioning_required());
    }

    #[test]
    fn next_row_is_a_line_break() {
        let mut t = PositionTracker::strict();
        t.update_positioning(Position::new(14, 0));
        t.update_positioning(Position::new(15, 8));
        assert!(t.is_linebreak_required());
        assert!(!t.is_repositioning_required());
        assert_eq!(t.current_position().unwrap(), Position::new(14, 0));
        t.acknowledge_linebreak_consumed();
        assert!(!t.is_linebreak_required());
    }

    #[test]
    fn other_moves_reposition() {
        for target in [Position::new(13, 0), Position::new(14, 8), Position::new(2, 0)] {
            let mut t = PositionTracker::strict();
            t.update_positioning(Position::new(14, 0));
            t.update_positioning(target);
            assert!(t.is_repositioning_required(), "{target:?}");
            assert_eq!(t.current_position().unwrap(), target);
            t.acknowledge_position_changed();
            assert!(!t.is_repositioning_required());
        }
    }

    #[test]
    fn same_position_is_a_no_op() {
        let mut t = PositionTracker::strict();
        t.update_positioning(Position::new(15, 0));
        t.update_positioning(Position::new(15, 0));
        assert!(!t.is_repositioning_required());
        assert!(!t.is_linebreak_required());
    }

    #[test]
    fn tab_offset_after_break_is_ignored() {
        let mut t = PositionTracker::strict();
        t.update_positioning(Position::new(14, 4));
        t.update_positioning(Position::new(15, 4));
        t.tab_offset(2);
        assert!(t.is_linebreak_required());
        assert!(!t.is_repositioning_required());
    }

    #[test]
    fn tab_offsets_stop_at_the_last_column() {
        let mut t = PositionTracker::strict();
        t.update_positioning(Position::new(15, 0));
        for _ in 0..200 {
            t.tab_offset(3);
        }
        assert_eq!(t.current_position().unwrap(), Position::new(15, MAX_COLUMN));

        t.update_positioning(Position::new(14, 0));
        t.update_positioning(Position::new(15, 30));
        t.tab_offset(3);
        assert!(t.is_linebreak_required());
    }

    #[test]
    fn restart_turns_a_break_into_a_new_anchor() {
        let mut t = PositionTracker::strict();
        t.update_positioning(Position::new(14, 0));
        t.update_positioning(Position::new(15, 4));
        t.restart_at_cursor();
        assert!(!t.is_linebreak_required());
        assert!(!t.is_repositioning_required());
        assert_eq!(t.current_position().unwrap(), Position::new(15, 4));
    }

    #[test]
    fn strict_tracker_needs_a_pac() {
        let t = PositionTracker::strict();
        assert!(matches!(t.current_position(), Err(CaptionError::Syntax(_))));
    }

    #[test]
    fn default_tracker_falls_back() {
        let t = PositionTracker::with_default();
        assert_eq!(t.current_position().unwrap(), FALLBACK_POSITION);
    }
}
