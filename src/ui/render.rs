use super::layout::LogicalLines;
use super::surface::{AtomicUpdate, Surface};
use super::utils::{pad, truncate};
use crate::app::{ScreenSize, ScrollPosition};
use anyhow::Result;

pub const PLACEHOLDER: &str = "Calculating diff, please wait...";

/// Draw one complete frame inside an atomic update.
///
/// With no `content` only the placeholder line is written. Otherwise the
/// window of screen lines starting at `scroll` is written, at most
/// `size.visible_lines` rows, and `status` (when given) goes on the reserved
/// last row. Returns the number of content rows written.
pub fn draw<S: Surface + ?Sized>(
    surface: &mut S,
    content: Option<&LogicalLines>,
    scroll: ScrollPosition,
    size: ScreenSize,
    status: Option<&str>,
) -> Result<usize> {
    let mut frame = AtomicUpdate::begin(surface)?;
    frame.delete_visible_images()?;
    frame.move_cursor_to(0, 0)?;
    frame.clear_to_end_of_screen()?;

    let Some(lines) = content else {
        // a full line, like every content row
        frame.write_str(PLACEHOLDER)?;
        frame.move_cursor_down(1)?;
        frame.write_str("\r")?;
        frame.finish()?;
        return Ok(0);
    };

    let written = write_window(&mut *frame, lines, scroll, size.visible_lines)?;

    if let Some(status) = status {
        if size.rows > 0 {
            let columns = size.columns as usize;
            frame.move_cursor_to(size.rows - 1, 0)?;
            frame.write_str(&pad(&truncate(status, columns), columns))?;
        }
    }
    frame.finish()?;
    Ok(written)
}

/// Write screen lines from `scroll` onwards, skipping the first
/// `scroll.screen_line` lines of the first logical line and stopping after
/// `limit` rows, even in the middle of a logical line.
pub fn write_window<S: Surface + ?Sized>(
    surface: &mut S,
    lines: &LogicalLines,
    scroll: ScrollPosition,
    limit: usize,
) -> Result<usize> {
    let mut written = 0;
    if limit == 0 {
        return Ok(0);
    }
    for (i, line) in lines.lines().iter().skip(scroll.logical_line).enumerate() {
        let skip = if i == 0 { scroll.screen_line } else { 0 };
        for screen_line in line.screen_lines.iter().skip(skip) {
            surface.write_str(screen_line)?;
            surface.move_cursor_down(1)?;
            surface.write_str("\r")?;
            written += 1;
            if written >= limit {
                return Ok(written);
            }
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::layout::{LineKind, LogicalLine};
    use crate::ui::surface::testing::{Op, RecordingSurface};

    fn logical(name: &str, n: usize) -> LogicalLine {
        LogicalLine::new(LineKind::Row, (0..n).map(|i| format!("{name}.line{i}")).collect())
    }

    fn two_lines() -> LogicalLines {
        LogicalLines::new(vec![logical("L0", 2), logical("L1", 3)])
    }

    #[test]
    fn window_skips_leading_screen_lines_and_stops_at_limit() {
        let mut s = RecordingSurface::new(4, 20);
        let size = ScreenSize::new(4, 20);
        assert_eq!(size.visible_lines, 3);
        let scroll = ScrollPosition { logical_line: 0, screen_line: 1 };

        let written = draw(&mut s, Some(&two_lines()), scroll, size, None).unwrap();
        assert_eq!(written, 3);
        assert_eq!(s.last_frame_rows(), vec!["L0.line1", "L1.line0", "L1.line1"]);
    }

    #[test]
    fn window_starts_at_scrolled_logical_line() {
        let mut s = RecordingSurface::new(10, 20);
        let scroll = ScrollPosition { logical_line: 1, screen_line: 2 };
        draw(&mut s, Some(&two_lines()), scroll, ScreenSize::new(10, 20), None).unwrap();
        assert_eq!(s.last_frame_rows(), vec!["L1.line2"]);
    }

    #[test]
    fn never_writes_more_rows_than_visible() {
        let many = LogicalLines::new((0..50).map(|i| logical(&format!("L{i}"), 3)).collect());
        for rows in [1u16, 2, 7, 24] {
            let mut s = RecordingSurface::new(rows, 80);
            let size = ScreenSize::new(rows, 80);
            let written = draw(&mut s, Some(&many), ScrollPosition::default(), size, None).unwrap();
            assert_eq!(written, size.visible_lines);
            assert_eq!(s.last_frame_rows().len(), size.visible_lines);
        }
    }

    #[test]
    fn frame_is_wrapped_in_an_atomic_update_and_clears_first() {
        let mut s = RecordingSurface::new(5, 20);
        draw(&mut s, Some(&two_lines()), ScrollPosition::default(), ScreenSize::new(5, 20), None)
            .unwrap();
        assert_eq!(
            &s.ops[..4],
            &[Op::Begin, Op::DeleteImages, Op::MoveTo(0, 0), Op::Clear]
        );
        assert_eq!(&s.ops[s.ops.len() - 2..], &[Op::End, Op::Flush]);
        // each row: text, one row down, carriage return
        assert_eq!(
            &s.ops[4..7],
            &[Op::Write("L0.line0".into()), Op::Down(1), Op::Write("\r".into())]
        );
    }

    #[test]
    fn missing_content_draws_only_the_placeholder() {
        let mut s = RecordingSurface::new(5, 20);
        let written =
            draw(&mut s, None, ScrollPosition::default(), ScreenSize::new(5, 20), Some("ignored"))
                .unwrap();
        assert_eq!(written, 0);
        let writes: Vec<&Op> = s.ops.iter().filter(|op| matches!(op, Op::Write(_))).collect();
        assert_eq!(writes, vec![&Op::Write(PLACEHOLDER.into()), &Op::Write("\r".into())]);
        assert_eq!(s.frames(), 1);
        // the placeholder line is ended, so later output starts on a fresh row
        assert_eq!(
            s.last_frame()[4..8],
            [Op::Write(PLACEHOLDER.into()), Op::Down(1), Op::Write("\r".into()), Op::End]
        );
    }

    #[test]
    fn status_goes_on_the_reserved_last_row() {
        let mut s = RecordingSurface::new(5, 12);
        draw(
            &mut s,
            Some(&two_lines()),
            ScrollPosition::default(),
            ScreenSize::new(5, 12),
            Some("+1 -2 a long status"),
        )
        .unwrap();
        assert!(s.last_frame().contains(&Op::MoveTo(4, 0)));
        assert_eq!(s.last_status().unwrap(), "+1 -2 a lon…");
    }

    #[test]
    fn failed_write_still_ends_the_update() {
        let mut s = RecordingSurface::new(5, 20);
        s.fail_writes_after = Some(1);
        let result = draw(&mut s, Some(&two_lines()), ScrollPosition::default(), ScreenSize::new(5, 20), None);
        assert!(result.is_err());
        assert_eq!(s.ops.iter().filter(|op| **op == Op::End).count(), 1);
    }
}
