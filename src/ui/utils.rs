use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Expand tabs to the next multiple of `tab_width` and drop other control characters,
/// so the text's width is what the terminal will draw.
pub(crate) fn sanitize(text: &str, tab_width: usize) -> String {
    let tab_width = tab_width.max(1);
    let mut out = String::with_capacity(text.len());
    let mut col = 0usize;
    for c in text.chars() {
        match c {
            '\t' => {
                let n = tab_width - col % tab_width;
                out.extend(std::iter::repeat(' ').take(n));
                col += n;
            }
            c if c.is_control() => {}
            c => {
                out.push(c);
                col += cell_width(c);
            }
        }
    }
    out
}

/// Display width of one char in terminal cells. Control chars count as zero.
fn cell_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(0)
}

/// Hard-wrap `text` into chunks exactly `width` cells wide, padding the last one.
/// A wide char that would straddle the edge moves to the next chunk; one wider
/// than `width` itself is replaced by spaces. Always returns at least one chunk.
pub(crate) fn hard_wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = cell_width(c);
        if used + w.min(width) > width {
            chunks.push(pad(&current, width));
            current.clear();
            used = 0;
        }
        if w > width {
            current.push_str(&" ".repeat(width));
            used = width;
        } else {
            current.push(c);
            used += w;
        }
    }
    if !current.is_empty() || chunks.is_empty() {
        chunks.push(pad(&current, width));
    }
    chunks
}

/// Right-pad with spaces to `width` cells
pub(crate) fn pad(text: &str, width: usize) -> String {
    let len = text.width();
    if len >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}

/// Truncate to at most `max` cells, ending with `…` when shortened
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut s = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = cell_width(c);
        if used + w > max - 1 {
            break;
        }
        s.push(c);
        used += w;
    }
    s.push('…');
    s
}
