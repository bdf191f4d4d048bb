use crate::diff::{Collection, DiffMap};
use crate::ui::layout::LogicalLines;

/// Terminal dimensions; the last row is reserved for the status line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreenSize {
    pub rows: u16,
    pub columns: u16,
    /// Rows available for diff content: `rows - 1`
    pub visible_lines: usize,
}

impl ScreenSize {
    pub fn new(rows: u16, columns: u16) -> Self {
        ScreenSize {
            rows,
            columns,
            visible_lines: rows.saturating_sub(1) as usize,
        }
    }
}

/// First visible screen row: a logical line and a screen line within it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollPosition {
    pub logical_line: usize,
    pub screen_line: usize,
}

impl ScrollPosition {
    /// Offset in screen lines from the top of `lines`
    pub fn to_absolute(self, lines: &LogicalLines) -> usize {
        let before: usize = lines
            .lines()
            .iter()
            .take(self.logical_line)
            .map(|l| l.screen_lines.len())
            .sum();
        before + self.screen_line
    }

    /// Position of screen line `offset`, clamped to the last logical line
    pub fn from_absolute(mut offset: usize, lines: &LogicalLines) -> Self {
        for (i, line) in lines.lines().iter().enumerate() {
            let n = line.screen_lines.len();
            if offset < n {
                return ScrollPosition { logical_line: i, screen_line: offset };
            }
            offset -= n;
        }
        ScrollPosition {
            logical_line: lines.len().saturating_sub(1),
            screen_line: 0,
        }
    }

    /// Pull the position back inside `lines` after a re-layout changed wrapping,
    /// no further down than the start of the last full page of `visible_lines`.
    pub fn clamped(self, lines: &LogicalLines, visible_lines: usize) -> Self {
        let inside = match lines.lines().get(self.logical_line) {
            Some(line) => ScrollPosition {
                logical_line: self.logical_line,
                screen_line: self.screen_line.min(line.screen_lines.len().saturating_sub(1)),
            },
            None => ScrollPosition::from_absolute(usize::MAX, lines),
        };
        let max = lines.total_screen_lines().saturating_sub(visible_lines);
        let offset = inside.to_absolute(lines);
        if offset > max {
            ScrollPosition::from_absolute(max, lines)
        } else {
            inside
        }
    }
}

/// Added/removed line totals over the whole comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub added_count: usize,
    pub removed_count: usize,
}

impl Statistics {
    /// The collection's own counts plus every patch's counts
    pub fn compute(collection: &Collection, diff_map: &DiffMap) -> Self {
        diff_map.values().fold(
            Statistics {
                added_count: collection.added_count,
                removed_count: collection.removed_count,
            },
            |acc, patch| Statistics {
                added_count: acc.added_count + patch.added_count,
                removed_count: acc.removed_count + patch.removed_count,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::Patch;
    use crate::ui::layout::{LineKind, LogicalLine};

    fn lines(heights: &[usize]) -> LogicalLines {
        LogicalLines::new(
            heights
                .iter()
                .map(|&n| LogicalLine::new(LineKind::Row, vec![String::new(); n]))
                .collect(),
        )
    }

    #[test]
    fn visible_lines_is_rows_minus_one() {
        for rows in 1..200u16 {
            assert_eq!(ScreenSize::new(rows, 80).visible_lines, rows as usize - 1);
        }
        assert_eq!(ScreenSize::new(0, 80).visible_lines, 0);
    }

    #[test]
    fn absolute_offsets_round_trip_through_positions() {
        let l = lines(&[2, 3, 1]);
        let pos = ScrollPosition { logical_line: 1, screen_line: 2 };
        assert_eq!(pos.to_absolute(&l), 4);
        assert_eq!(ScrollPosition::from_absolute(4, &l), pos);
        assert_eq!(
            ScrollPosition::from_absolute(5, &l),
            ScrollPosition { logical_line: 2, screen_line: 0 }
        );
    }

    #[test]
    fn from_absolute_past_the_end_clamps_to_last_line() {
        let l = lines(&[2, 3]);
        assert_eq!(
            ScrollPosition::from_absolute(99, &l),
            ScrollPosition { logical_line: 1, screen_line: 0 }
        );
        assert_eq!(ScrollPosition::from_absolute(3, &lines(&[])), ScrollPosition::default());
    }

    #[test]
    fn clamped_keeps_position_inside_rewrapped_lines() {
        let l = lines(&[2, 1]);
        let pos = ScrollPosition { logical_line: 0, screen_line: 5 };
        assert_eq!(pos.clamped(&l, 1), ScrollPosition { logical_line: 0, screen_line: 1 });
        let gone = ScrollPosition { logical_line: 7, screen_line: 0 };
        assert_eq!(gone.clamped(&l, 1), ScrollPosition { logical_line: 1, screen_line: 0 });
    }

    #[test]
    fn clamped_never_leaves_blank_rows_below_the_content() {
        // 2 + 3 + 1 + 4 = 10 screen lines, 4 visible: last page starts at 6
        let l = lines(&[2, 3, 1, 4]);
        let bottom = ScrollPosition { logical_line: 3, screen_line: 3 };
        assert_eq!(bottom.clamped(&l, 4), ScrollPosition { logical_line: 3, screen_line: 0 });
        let mid = ScrollPosition { logical_line: 1, screen_line: 1 };
        assert_eq!(mid.clamped(&l, 4), mid);
        // everything fits: back to the top
        assert_eq!(bottom.clamped(&l, 20), ScrollPosition::default());
    }

    #[test]
    fn statistics_sum_collection_and_patches() {
        let mut collection = Collection::new();
        collection.added_count = 2;
        collection.removed_count = 1;
        let mut map = DiffMap::new();
        map.insert("a".into(), Patch { hunks: vec![], added_count: 3, removed_count: 0 });
        map.insert("b".into(), Patch { hunks: vec![], added_count: 0, removed_count: 4 });

        let stats = Statistics::compute(&collection, &map);
        assert_eq!(stats, Statistics { added_count: 5, removed_count: 5 });
    }
}
