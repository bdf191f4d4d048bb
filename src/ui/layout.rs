use super::styles::{self, paint, Tone};
use super::utils::{hard_wrap, pad, sanitize};
use crate::config::DiffConfig;
use crate::diff::{patch_key, Cell, Change, Collection, DiffMap, Patch, Row, RowType};

/// What a logical line represents
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineKind {
    Title,
    HunkTitle,
    Row,
    Message,
    Spacer,
}

/// One logical line, pre-wrapped into screen lines of the layout width
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalLine {
    pub kind: LineKind,
    pub screen_lines: Vec<String>,
}

impl LogicalLine {
    pub fn new(kind: LineKind, screen_lines: Vec<String>) -> Self {
        LogicalLine { kind, screen_lines }
    }
}

/// The screen-ready rendering of a comparison at one column width
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogicalLines {
    lines: Vec<LogicalLine>,
}

impl LogicalLines {
    pub fn new(lines: Vec<LogicalLine>) -> Self {
        LogicalLines { lines }
    }

    pub fn lines(&self) -> &[LogicalLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_screen_lines(&self) -> usize {
        self.lines.iter().map(|l| l.screen_lines.len()).sum()
    }
}

/// Lay out `collection` and its patches side by side for a terminal `columns` wide.
/// Changed pairs without a patch (binary content) get a one-line message.
pub fn render(
    collection: &Collection,
    diff_map: &DiffMap,
    columns: usize,
    config: &DiffConfig,
) -> LogicalLines {
    let mut builder = Builder {
        out: Vec::new(),
        width: columns.max(2),
        config,
    };

    if collection.is_empty() {
        builder.message("No differences found", Tone::Context);
        return LogicalLines::new(builder.out);
    }

    for (i, entry) in collection.iter().enumerate() {
        if i > 0 {
            builder.spacer();
        }
        builder.title(&format!("{} {}", entry.change.symbol(), entry.name));
        match &entry.change {
            Change::Changed(right) => match diff_map.get(&patch_key(&entry.path, right)) {
                Some(patch) if patch.hunks.is_empty() => {
                    builder.message("Files differ only in line endings", Tone::Context)
                }
                Some(patch) => builder.patch(patch),
                None => builder.message("Binary files differ", Tone::Context),
            },
            Change::Added => builder.message("File added", Tone::Added),
            Change::Removed => builder.message("File removed", Tone::Removed),
            Change::Renamed(_) => builder.message("Renamed, content unchanged", Tone::Context),
        }
    }
    LogicalLines::new(builder.out)
}

struct Builder<'a> {
    out: Vec<LogicalLine>,
    width: usize,
    config: &'a DiffConfig,
}

impl Builder<'_> {
    fn full_width(&mut self, kind: LineKind, text: &str, tone: Tone) {
        let (fg, bg) = styles::text(&self.config.colors, tone);
        let text = sanitize(text, self.config.tab_width as usize);
        let lines = hard_wrap(&text, self.width)
            .iter()
            .map(|chunk| paint(chunk, fg, bg))
            .collect();
        self.out.push(LogicalLine::new(kind, lines));
    }

    fn title(&mut self, text: &str) {
        self.full_width(LineKind::Title, &format!(" {}", text), Tone::Title);
    }

    fn message(&mut self, text: &str, tone: Tone) {
        self.full_width(LineKind::Message, &format!("  {}", text), tone);
    }

    fn spacer(&mut self) {
        self.out.push(LogicalLine::new(LineKind::Spacer, vec![" ".repeat(self.width)]));
    }

    fn patch(&mut self, patch: &Patch) {
        let left_width = self.width / 2;
        let right_width = self.width - left_width;
        let digits = patch.max_line_number().max(1).to_string().len();
        for hunk in &patch.hunks {
            self.full_width(LineKind::HunkTitle, &format!(" {}", hunk.header()), Tone::Hunk);
            for row in &hunk.rows {
                let lines = self.row(row, digits, left_width, right_width);
                self.out.push(LogicalLine::new(LineKind::Row, lines));
            }
        }
    }

    fn row(&self, row: &Row, digits: usize, left_width: usize, right_width: usize) -> Vec<String> {
        let (left_tone, right_tone) = match row.row_type {
            RowType::Context => (Tone::Context, Tone::Context),
            RowType::Delete => (Tone::Removed, Tone::Filler),
            RowType::Add => (Tone::Filler, Tone::Added),
            RowType::Change => (Tone::Removed, Tone::Added),
        };
        let mut left = self.side(row.left.as_ref(), left_tone, digits, left_width);
        let mut right = self.side(row.right.as_ref(), right_tone, digits, right_width);

        let height = left.len().max(right.len());
        let blank_left = self.side_blank(left_tone, digits, left_width);
        let blank_right = self.side_blank(right_tone, digits, right_width);
        left.resize(height, blank_left);
        right.resize(height, blank_right);

        left.into_iter().zip(right).map(|(l, r)| l + &r).collect()
    }

    /// Margin and text split of one side: (margin width, text width)
    fn split(digits: usize, width: usize) -> (usize, usize) {
        let margin = (digits + 1).min(width.saturating_sub(1));
        (margin, width - margin)
    }

    fn side(&self, cell: Option<&Cell>, tone: Tone, digits: usize, width: usize) -> Vec<String> {
        let Some(cell) = cell else {
            return vec![self.side_blank(tone, digits, width)];
        };
        let colors = &self.config.colors;
        let (margin_width, text_width) = Self::split(digits, width);
        let (mfg, mbg) = styles::margin(colors, tone);
        let (tfg, tbg) = styles::text(colors, tone);

        let content = sanitize(&cell.content, self.config.tab_width as usize);
        hard_wrap(&content, text_width)
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                let number = if i == 0 {
                    format!("{:>w$} ", cell.num, w = margin_width.saturating_sub(1))
                } else {
                    String::new()
                };
                let number: String = pad(&number, margin_width).chars().take(margin_width).collect();
                paint(&number, mfg, mbg) + &paint(chunk, tfg, tbg)
            })
            .collect()
    }

    fn side_blank(&self, tone: Tone, digits: usize, width: usize) -> String {
        let colors = &self.config.colors;
        let (margin_width, text_width) = Self::split(digits, width);
        let (mfg, mbg) = styles::margin(colors, tone);
        let (tfg, tbg) = styles::text(colors, tone);
        paint(&" ".repeat(margin_width), mfg, mbg) + &paint(&" ".repeat(text_width), tfg, tbg)
    }
}
