use std::{collections::HashMap, io, time::Duration};

use colored::{Color, ColoredString, Colorize};
use crossterm::terminal;
use strum::IntoEnumIterator;

use crate::testing::{Outcome, TestReport};

pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Cycles through animation frames. Each running testcase owns one.
#[derive(Debug, Clone)]
pub struct Spinner {
    frames: &'static [&'static str],
    index: usize,
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new(SPINNER_FRAMES)
    }
}

impl Spinner {
    pub fn new(frames: &'static [&'static str]) -> Self {
        Self { frames, index: 0 }
    }

    pub fn next_frame(&mut self) -> &'static str {
        if self.frames.is_empty() {
            return "";
        }
        let frame = self.frames[self.index % self.frames.len()];
        self.index = self.index.wrapping_add(1);
        frame
    }
}

pub trait ColorTheme {
    fn color(&self) -> Color;
}

impl ColorTheme for Outcome {
    fn color(&self) -> Color {
        use Outcome::*;
        match self {
            Passed => Color::Green,
            Failed => Color::Red,
            Timeout => Color::Blue,
            Error => Color::Magenta,
        }
    }
}

pub fn label(outcome: Outcome) -> ColoredString {
    outcome.to_string().color(outcome.color())
}

/// `m:ss`, minutes unbounded.
pub fn min_sec(d: Duration) -> String {
    let sec = d.as_secs();
    format!("{}:{:02}", sec / 60, sec % 60)
}

pub fn format_wait(name: &str) -> String {
    format!("{}  -:--  {}", "WAIT".bright_black(), name)
}

pub fn format_run(name: &str, elapsed: Duration, frame: &str) -> String {
    format!(
        "{}  {}  {}",
        format!("RUN{}", frame).yellow(),
        min_sec(elapsed),
        name
    )
}

pub fn format_outcome(name: &str, elapsed: Duration, outcome: Outcome) -> String {
    format!("{}  {}  {}", label(outcome), min_sec(elapsed), name)
}

const BOLD_LINE: &str = "━";
const THIN_LINE: &str = "─";

/// Writes the input, expected output and observed output of a testcase.
pub fn write_report_detail(w: &mut impl io::Write, report: &TestReport) -> io::Result<()> {
    let (cols, _) = terminal::size().unwrap_or((40, 40));
    let cols = cols as usize;

    let bold_bar = BOLD_LINE.repeat(cols).blue().bold();

    writeln!(
        w,
        "\n{}  {} [{}]\n{}",
        label(report.outcome()).bold(),
        report.testcase.name.bright_yellow().bold(),
        min_sec(report.elapsed),
        bold_bar,
    )?;

    let result = &report.result;
    if let Some(fault) = &result.fault {
        writeln!(w, "{} {}", "Harness error:".bright_red().bold(), fault)?;
    }

    write_sub_title(w, "[input]", cols)?;
    write_lines(w, &String::from_utf8_lossy(&report.testcase.input))?;

    write_sub_title(w, "[expected]", cols)?;
    write_lines(w, &report.testcase.output)?;

    write_sub_title(w, "[stdout]", cols)?;
    write_lines(w, &result.stdout_lossy())?;

    if !result.stderr.is_empty() {
        write_sub_title(w, "[stderr]", cols)?;
        write!(w, "{}", result.stderr_lossy())?;
        if !result.stderr.ends_with(b"\n") {
            writeln!(w)?;
        }
    }

    writeln!(w, "{}", bold_bar)
}

fn write_sub_title(w: &mut impl io::Write, s: &str, cols: usize) -> io::Result<()> {
    writeln!(
        w,
        "{}{}",
        s.cyan().bold(),
        THIN_LINE
            .repeat(cols.saturating_sub(s.len() + 1))
            .bright_black(),
    )
}

fn write_lines(w: &mut impl io::Write, text: &str) -> io::Result<()> {
    let lines: Vec<_> = text.lines().collect();
    if lines.is_empty() {
        return writeln!(w, "{}", "<EMPTY>".magenta().dimmed());
    }
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim_end();
        write!(w, "{}", trimmed)?;

        let num_trailing_whitespace = line.len() - trimmed.len();
        if num_trailing_whitespace > 0 {
            write!(w, "{}", " ".repeat(num_trailing_whitespace).on_red())?;
        }

        let is_last_line = i + 1 == lines.len();
        if is_last_line && !text.ends_with('\n') {
            write!(w, "{}", " Missing new line ".on_yellow().black().bold())?;
        }
        writeln!(w)?;
    }
    Ok(())
}

pub fn write_summary(w: &mut impl io::Write, reports: &[TestReport]) -> io::Result<()> {
    let bar = "-".repeat(5);

    let count: HashMap<Outcome, usize> = reports.iter().fold(HashMap::new(), |mut count, r| {
        *count.entry(r.outcome()).or_default() += 1;
        count
    });

    let num_total = reports.len();
    let num_passed = count.get(&Outcome::Passed).copied().unwrap_or(0);
    let num_failed = num_total - num_passed;

    if num_passed == num_total {
        let msg = format!("All {} tests passed", num_total);
        return writeln!(w, "{} {} {}", bar, msg.green(), bar);
    }

    let summary_msg = if num_passed > 0 {
        format!("{}/{} tests failed", num_failed, num_total)
    } else {
        format!("All {} tests failed", num_total)
    };

    // Fixed label order keeps the line stable between runs.
    let detail_msg = Outcome::iter()
        .filter(|o| !o.is_passed())
        .filter_map(|o| count.get(&o).map(|&cnt| (o, cnt)))
        .map(|(o, cnt)| format!("{}{}{}", label(o), "x".dimmed(), cnt.to_string().bold()))
        .collect::<Vec<String>>()
        .join(", ");

    writeln!(
        w,
        "{} {} ({}) {}",
        bar,
        summary_msg.bright_red(),
        detail_msg,
        bar
    )
}
