use std::io::{self, Write};

use crossterm::{
    cursor::MoveToPreviousLine,
    queue,
    style::Print,
    terminal::{Clear, ClearType},
    tty::IsTty,
};

/// Where the status rows are painted.
pub trait Surface {
    /// Paints an intermediate frame.
    fn draw(&mut self, rows: &[String]) -> io::Result<()>;

    /// Paints the last frame. Nothing is drawn after this.
    fn finish(&mut self, rows: &[String]) -> io::Result<()> {
        self.draw(rows)
    }
}

/// Paints rows to a terminal, overwriting the previous frame in place.
///
/// A non-live surface skips intermediate frames and writes only the final
/// one, which keeps logs readable when output is not a terminal.
#[derive(Debug)]
pub struct TerminalSurface<W: Write> {
    out: W,
    live: bool,
    painted_lines: usize,
}

impl TerminalSurface<io::Stdout> {
    pub fn stdout() -> Self {
        let out = io::stdout();
        let live = out.is_tty();
        Self::new(out, live)
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, live: bool) -> Self {
        Self {
            out,
            live,
            painted_lines: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&mut self, rows: &[String]) -> io::Result<()> {
        if self.painted_lines > 0 {
            let n = u16::try_from(self.painted_lines).unwrap_or(u16::MAX);
            queue!(self.out, MoveToPreviousLine(n))?;
        }
        for row in rows {
            queue!(self.out, Clear(ClearType::CurrentLine), Print(row), Print("\n"))?;
        }
        self.out.flush()?;
        self.painted_lines = rows.len();
        Ok(())
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn draw(&mut self, rows: &[String]) -> io::Result<()> {
        if self.live {
            self.paint(rows)
        } else {
            Ok(())
        }
    }

    fn finish(&mut self, rows: &[String]) -> io::Result<()> {
        self.paint(rows)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn rows(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn non_live_writes_only_final_frame() {
        let mut s = TerminalSurface::new(Vec::new(), false);
        s.draw(&rows(&["a", "b"])).unwrap();
        s.draw(&rows(&["c", "d"])).unwrap();
        s.finish(&rows(&["e", "f"])).unwrap();

        let out = String::from_utf8(s.into_inner()).unwrap();
        assert!(!out.contains('a') && !out.contains('c'));
        assert!(out.contains("e\n"));
        assert!(out.contains("f\n"));
    }

    #[test]
    fn live_rewinds_over_previous_frame() {
        let mut s = TerminalSurface::new(Vec::new(), true);
        s.draw(&rows(&["one", "two"])).unwrap();
        let first_len = s.out.len();
        s.finish(&rows(&["three", "four"])).unwrap();

        let out = s.into_inner();
        let second = String::from_utf8_lossy(&out[first_len..]).into_owned();
        // ESC [ 2 F moves the cursor to the beginning of the line 2 lines up
        assert!(second.starts_with("\x1b[2F"), "{:?}", second);
        assert!(second.contains("three\n"));
        assert!(second.contains("four\n"));
    }
}
