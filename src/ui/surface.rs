use crate::config::Rgb;
use anyhow::Result;
use crossterm::{
    cursor::{MoveDown, MoveTo},
    queue,
    style::Print,
    terminal::{self, BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate},
};
use std::io::Write;
use std::ops::{Deref, DerefMut};

/// Terminal-wide default colors that can be set with OSC escapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultColor {
    Foreground,
    Background,
    Cursor,
    SelectionBg,
    SelectionFg,
}

impl DefaultColor {
    const ALL: [DefaultColor; 5] = [
        DefaultColor::Foreground,
        DefaultColor::Background,
        DefaultColor::Cursor,
        DefaultColor::SelectionBg,
        DefaultColor::SelectionFg,
    ];

    fn osc_code(self) -> u8 {
        match self {
            DefaultColor::Foreground => 10,
            DefaultColor::Background => 11,
            DefaultColor::Cursor => 12,
            DefaultColor::SelectionBg => 17,
            DefaultColor::SelectionFg => 19,
        }
    }
}

/// The drawing primitives the viewer needs from a terminal.
/// Only ever used from the main thread. Rows and columns are 0-based.
pub trait Surface {
    /// Current size as (rows, columns) in cells
    fn screen_size(&self) -> Result<(u16, u16)>;
    fn start_atomic_update(&mut self) -> Result<()>;
    fn end_atomic_update(&mut self) -> Result<()>;
    fn set_default_color(&mut self, which: DefaultColor, color: Rgb) -> Result<()>;
    fn reset_default_colors(&mut self) -> Result<()>;
    /// Remove inline images visible on screen
    fn delete_visible_images(&mut self) -> Result<()>;
    fn move_cursor_to(&mut self, row: u16, column: u16) -> Result<()>;
    fn move_cursor_down(&mut self, rows: u16) -> Result<()>;
    fn clear_to_end_of_screen(&mut self) -> Result<()>;
    fn write_str(&mut self, s: &str) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
}

/// Scoped atomic update: begun on construction, ended exactly once, on `finish`
/// or on drop if an error unwound past it.
pub struct AtomicUpdate<'a, S: Surface + ?Sized> {
    surface: &'a mut S,
    open: bool,
}

impl<'a, S: Surface + ?Sized> AtomicUpdate<'a, S> {
    pub fn begin(surface: &'a mut S) -> Result<Self> {
        surface.start_atomic_update()?;
        Ok(AtomicUpdate { surface, open: true })
    }

    /// End the update and flush, reporting errors
    pub fn finish(mut self) -> Result<()> {
        self.open = false;
        self.surface.end_atomic_update()?;
        self.surface.flush()
    }
}

impl<S: Surface + ?Sized> Deref for AtomicUpdate<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: Surface + ?Sized> DerefMut for AtomicUpdate<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

impl<S: Surface + ?Sized> Drop for AtomicUpdate<'_, S> {
    fn drop(&mut self) {
        if self.open {
            let _ = self.surface.end_atomic_update();
            let _ = self.surface.flush();
        }
    }
}

/// A `Surface` writing escape sequences to any writer, normally stdout in raw mode
pub struct TerminalSurface<W: Write> {
    out: W,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        TerminalSurface { out }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn screen_size(&self) -> Result<(u16, u16)> {
        let (columns, rows) = terminal::size()?;
        Ok((rows, columns))
    }

    fn start_atomic_update(&mut self) -> Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;
        Ok(())
    }

    fn end_atomic_update(&mut self) -> Result<()> {
        queue!(self.out, EndSynchronizedUpdate)?;
        Ok(())
    }

    fn set_default_color(&mut self, which: DefaultColor, color: Rgb) -> Result<()> {
        write!(self.out, "\x1b]{};{}\x1b\\", which.osc_code(), color.to_hex())?;
        Ok(())
    }

    fn reset_default_colors(&mut self) -> Result<()> {
        for which in DefaultColor::ALL {
            // OSC 1xx resets the matching OSC xx
            write!(self.out, "\x1b]{}\x1b\\", 100 + which.osc_code() as u16)?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn delete_visible_images(&mut self) -> Result<()> {
        // kitty graphics protocol: delete all placements visible on screen
        write!(self.out, "\x1b_Ga=d,d=a,q=2\x1b\\")?;
        Ok(())
    }

    fn move_cursor_to(&mut self, row: u16, column: u16) -> Result<()> {
        queue!(self.out, MoveTo(column, row))?;
        Ok(())
    }

    fn move_cursor_down(&mut self, rows: u16) -> Result<()> {
        queue!(self.out, MoveDown(rows))?;
        Ok(())
    }

    fn clear_to_end_of_screen(&mut self) -> Result<()> {
        queue!(self.out, Clear(ClearType::FromCursorDown))?;
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> Result<()> {
        queue!(self.out, Print(s))?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
