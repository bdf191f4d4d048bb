use super::pipeline::{AsyncResult, Pipeline, ResultKind, Waker};
use super::view::{ScreenSize, ScrollPosition, Statistics};
use crate::config::DiffConfig;
use crate::diff::{Change, Collection, DiffJob, DiffMap};
use crate::engine::Engine;
use crate::ui::layout::LogicalLines;
use crate::ui::render;
use crate::ui::surface::{DefaultColor, Surface};
use anyhow::Result;
use std::sync::Arc;

/// Orchestrates one viewing session.
///
/// Background workers compute the collection and the diff map; the handler,
/// on the main thread, installs each finished result, re-lays out and
/// redraws. Collection, diff map and logical lines are only ever replaced
/// wholesale, and only here.
pub struct Handler<S: Surface> {
    pipeline: Pipeline,
    engine: Arc<dyn Engine>,
    surface: S,
    config: DiffConfig,
    /// `--context` from the command line, wins over the config default
    context_override: Option<usize>,
    left: String,
    right: String,

    collection: Option<Collection>,
    diff_map: Option<DiffMap>,
    logical_lines: Option<LogicalLines>,

    current_context_count: usize,
    original_context_count: usize,
    screen_size: ScreenSize,
    scroll_pos: ScrollPosition,
    stats: Statistics,
}

impl<S: Surface> Handler<S> {
    pub fn new(
        surface: S,
        engine: Arc<dyn Engine>,
        waker: Waker,
        config: DiffConfig,
        context_override: Option<usize>,
        left: String,
        right: String,
    ) -> Self {
        Handler {
            pipeline: Pipeline::new(waker),
            engine,
            surface,
            config,
            context_override,
            left,
            right,
            collection: None,
            diff_map: None,
            logical_lines: None,
            current_context_count: 0,
            original_context_count: 0,
            screen_size: ScreenSize::default(),
            scroll_pos: ScrollPosition::default(),
            stats: Statistics::default(),
        }
    }

    /// Set up colors and screen size, start building the collection and
    /// draw the placeholder.
    pub fn initialize(&mut self) -> Result<()> {
        self.current_context_count = self
            .context_override
            .unwrap_or(self.config.num_context_lines);
        self.original_context_count = self.current_context_count;

        let (rows, columns) = self.surface.screen_size()?;
        self.screen_size = ScreenSize::new(rows, columns);

        let colors = &self.config.colors;
        self.surface.set_default_color(DefaultColor::Foreground, colors.foreground)?;
        self.surface.set_default_color(DefaultColor::Cursor, colors.foreground)?;
        self.surface.set_default_color(DefaultColor::Background, colors.background)?;
        self.surface.set_default_color(DefaultColor::SelectionBg, colors.select_bg)?;
        if let Some(fg) = colors.select_fg.0 {
            self.surface.set_default_color(DefaultColor::SelectionFg, fg)?;
        }

        let engine = Arc::clone(&self.engine);
        let (left, right) = (self.left.clone(), self.right.clone());
        log::debug!("building collection for {} and {}", left, right);
        self.pipeline
            .submit_collection(move || engine.build_collection(&left, &right));
        self.draw_screen()
    }

    /// Restore terminal state changed by `initialize`
    pub fn finalize(&mut self) -> Result<()> {
        self.surface.reset_default_colors()
    }

    /// Drain every pending result. Stops at, and returns, the first error.
    pub fn on_wakeup(&mut self) -> Result<()> {
        while let Some(result) = self.pipeline.try_next() {
            self.handle_async_result(result)?;
        }
        Ok(())
    }

    fn handle_async_result(&mut self, result: AsyncResult) -> Result<()> {
        match result {
            AsyncResult::Collection(collection) => {
                self.collection = Some(collection?);
                self.generate_diff();
            }
            AsyncResult::Diff(diff_map) => {
                let diff_map = diff_map?;
                if let Some(collection) = &self.collection {
                    self.stats = Statistics::compute(collection, &diff_map);
                }
                self.diff_map = Some(diff_map);
                log::debug!(
                    "diff installed: +{} -{}",
                    self.stats.added_count,
                    self.stats.removed_count
                );
                self.render_diff()?;
                self.scroll_pos = ScrollPosition::default();
                self.draw_screen()?;
            }
            AsyncResult::Highlight(highlight) => highlight?,
        }
        Ok(())
    }

    /// Diff every changed text pair of the current collection in the background
    fn generate_diff(&mut self) {
        let Some(collection) = &self.collection else {
            return;
        };
        self.diff_map = None;
        let engine = Arc::clone(&self.engine);
        let jobs: Vec<DiffJob> = collection
            .iter()
            .filter(|entry| matches!(entry.change, Change::Changed(_)))
            .filter_map(|entry| entry.counterpart().map(|right| DiffJob::new(entry.path.as_str(), right)))
            .filter(|job| engine.is_text_path(&job.left) && engine.is_text_path(&job.right))
            .collect();
        let context = self.current_context_count;
        log::debug!("diffing {} file pairs with {} context lines", jobs.len(), context);
        self.pipeline.submit_diff(move || engine.diff(&jobs, context));
    }

    pub fn on_resize(&mut self, old: ScreenSize, new: ScreenSize) -> Result<()> {
        log::debug!(
            "resize {}x{} -> {}x{}",
            old.columns,
            old.rows,
            new.columns,
            new.rows
        );
        self.screen_size = new;
        if self.diff_map.is_some() && self.collection.is_some() {
            self.render_diff()?;
        }
        self.draw_screen()
    }

    /// Lay out the current collection and diff map at the current width
    fn render_diff(&mut self) -> Result<()> {
        let (Some(collection), Some(diff_map)) = (&self.collection, &self.diff_map) else {
            return Ok(());
        };
        let lines = self
            .engine
            .layout(collection, diff_map, self.screen_size.columns as usize)?;
        self.scroll_pos = self.scroll_pos.clamped(&lines, self.screen_size.visible_lines);
        self.logical_lines = Some(lines);
        Ok(())
    }

    fn draw_screen(&mut self) -> Result<()> {
        let content = match (&self.logical_lines, &self.diff_map, &self.collection) {
            (Some(lines), Some(_), Some(_)) => Some(lines),
            _ => None,
        };
        let status = content.map(|lines| self.status_line(lines));
        render::draw(
            &mut self.surface,
            content,
            self.scroll_pos,
            self.screen_size,
            status.as_deref(),
        )?;
        Ok(())
    }

    fn status_line(&self, lines: &LogicalLines) -> String {
        let total = lines.total_screen_lines();
        let max = total.saturating_sub(self.screen_size.visible_lines);
        let percent = if max == 0 {
            100
        } else {
            self.scroll_pos.to_absolute(lines).min(max) * 100 / max
        };
        format!(
            " +{} -{}  context: {}  {}%",
            self.stats.added_count, self.stats.removed_count, self.current_context_count, percent
        )
    }

    // ── Context lines ──

    /// Re-diff with `count` context lines. Any diff still in flight is superseded.
    pub fn set_context_count(&mut self, count: usize) -> Result<()> {
        if count == self.current_context_count {
            return Ok(());
        }
        log::debug!(
            "context lines {} -> {} (diff in flight: {})",
            self.current_context_count,
            count,
            self.pipeline.is_outstanding(ResultKind::Diff)
        );
        self.current_context_count = count;
        if self.collection.is_none() {
            // the pending collection result will diff with the new count
            return Ok(());
        }
        self.generate_diff();
        self.logical_lines = None;
        self.draw_screen()
    }

    pub fn change_context_count(&mut self, delta: isize) -> Result<()> {
        self.set_context_count(self.current_context_count.saturating_add_signed(delta))
    }

    pub fn restore_context_count(&mut self) -> Result<()> {
        self.set_context_count(self.original_context_count)
    }

    // ── Scrolling ──

    /// Move the window by `delta` screen lines, clamped so the last page stays full
    pub fn scroll_by(&mut self, delta: isize) -> Result<()> {
        let Some(lines) = self.logical_lines.as_ref().filter(|l| !l.is_empty()) else {
            return Ok(());
        };
        let max = lines
            .total_screen_lines()
            .saturating_sub(self.screen_size.visible_lines);
        let current = self.scroll_pos.to_absolute(lines);
        let target = current.saturating_add_signed(delta).min(max);
        if target == current {
            return Ok(());
        }
        self.scroll_pos = ScrollPosition::from_absolute(target, lines);
        self.draw_screen()
    }

    pub fn page_down(&mut self) -> Result<()> {
        self.scroll_by(self.page_height())
    }

    pub fn page_up(&mut self) -> Result<()> {
        self.scroll_by(-self.page_height())
    }

    pub fn scroll_to_top(&mut self) -> Result<()> {
        self.scroll_by(isize::MIN)
    }

    pub fn scroll_to_bottom(&mut self) -> Result<()> {
        self.scroll_by(isize::MAX)
    }

    fn page_height(&self) -> isize {
        self.screen_size.visible_lines.max(1) as isize
    }

    pub fn screen_size(&self) -> ScreenSize {
        self.screen_size
    }
}
