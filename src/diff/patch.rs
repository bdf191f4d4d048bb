use super::text::read_text;
use anyhow::Result;
use similar::{DiffTag, TextDiff};
use std::collections::HashMap;

/// One file pair to be line-diffed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffJob {
    pub left: String,
    pub right: String,
}

impl DiffJob {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        DiffJob { left: left.into(), right: right.into() }
    }

    pub fn key(&self) -> String {
        patch_key(&self.left, &self.right)
    }
}

/// Patches keyed by `patch_key(left, right)`
pub type DiffMap = HashMap<String, Patch>;

/// Key under which the patch for a file pair is stored in a `DiffMap`
pub fn patch_key(left: &str, right: &str) -> String {
    format!("{left}\0{right}")
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowType {
    Context,
    Add,
    Delete,
    /// Delete and add paired on the same row
    Change,
}

/// One numbered line of one side
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub num: usize,
    pub content: String,
}

/// A side-by-side row: left and/or right line
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub row_type: RowType,
    pub left: Option<Cell>,
    pub right: Option<Cell>,
}

/// A diff hunk with its line ranges (1-based starts) and paired rows
#[derive(Debug, Clone, PartialEq)]
pub struct Hunk {
    pub left_start: usize,
    pub left_count: usize,
    pub right_start: usize,
    pub right_count: usize,
    pub rows: Vec<Row>,
}

impl Hunk {
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.left_start, self.left_count, self.right_start, self.right_count
        )
    }
}

/// The line-level diff of one file pair
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    pub hunks: Vec<Hunk>,
    pub added_count: usize,
    pub removed_count: usize,
}

impl Patch {
    /// Largest line number shown on either side, for margin sizing
    pub fn max_line_number(&self) -> usize {
        self.hunks
            .iter()
            .map(|h| (h.left_start + h.left_count).max(h.right_start + h.right_count))
            .max()
            .unwrap_or(0)
    }
}

/// Diff every job with `context` lines of context. One patch per job.
pub fn diff(jobs: &[DiffJob], context: usize) -> Result<DiffMap> {
    let mut map = DiffMap::with_capacity(jobs.len());
    for job in jobs {
        let left = read_text(&job.left)?;
        let right = read_text(&job.right)?;
        map.insert(job.key(), diff_text(&left, &right, context));
    }
    Ok(map)
}

/// Line diff of two texts, grouped into hunks with `context` surrounding lines
pub fn diff_text(left: &str, right: &str, context: usize) -> Patch {
    let diff = TextDiff::from_lines(left, right);
    let old = diff.old_slices();
    let new = diff.new_slices();
    let cell = |lines: &[&str], idx: usize| Cell {
        num: idx + 1,
        content: lines[idx].trim_end_matches(['\n', '\r']).to_string(),
    };

    let mut patch = Patch::default();
    for group in diff.grouped_ops(context) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let (left_range, right_range) = (first.old_range(), first.new_range());
        let (left_end, right_end) = (last.old_range().end, last.new_range().end);
        let mut hunk = Hunk {
            left_start: left_range.start + 1,
            left_count: left_end - left_range.start,
            right_start: right_range.start + 1,
            right_count: right_end - right_range.start,
            rows: Vec::new(),
        };

        for op in &group {
            let (tag, l, r) = op.as_tag_tuple();
            match tag {
                DiffTag::Equal => {
                    for (li, ri) in l.zip(r) {
                        hunk.rows.push(Row {
                            row_type: RowType::Context,
                            left: Some(cell(old, li)),
                            right: Some(cell(new, ri)),
                        });
                    }
                }
                DiffTag::Delete => {
                    patch.removed_count += l.len();
                    for li in l {
                        hunk.rows.push(Row {
                            row_type: RowType::Delete,
                            left: Some(cell(old, li)),
                            right: None,
                        });
                    }
                }
                DiffTag::Insert => {
                    patch.added_count += r.len();
                    for ri in r {
                        hunk.rows.push(Row {
                            row_type: RowType::Add,
                            left: None,
                            right: Some(cell(new, ri)),
                        });
                    }
                }
                DiffTag::Replace => {
                    patch.removed_count += l.len();
                    patch.added_count += r.len();
                    let rows = l.len().max(r.len());
                    for i in 0..rows {
                        let left = (i < l.len()).then(|| cell(old, l.start + i));
                        let right = (i < r.len()).then(|| cell(new, r.start + i));
                        let row_type = match (&left, &right) {
                            (Some(_), Some(_)) => RowType::Change,
                            (Some(_), None) => RowType::Delete,
                            _ => RowType::Add,
                        };
                        hunk.rows.push(Row { row_type, left, right });
                    }
                }
            }
        }
        patch.hunks.push(hunk);
    }
    patch
}
