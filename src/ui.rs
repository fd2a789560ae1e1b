// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Console rendering (status lines, panels, tables) and interactive prompts (menus, text, yes/no)
// role: ui/console
// inputs: Messages and option lists from handlers; key events on a terminal, lines on stdin (or any BufRead in tests)
// outputs: Coloured lines on stdout/stderr; selected indices, entered text, confirmations
// side_effects: Writes to the terminal; blocks on user input
// invariants:
// - Menus offering "← Back" map it to None, never to an option index
// - End of input is an error, so non-interactive runs cannot spin on a prompt
// - Colour honours NO_COLOR through the colored crate
// errors: Prompt IO failures and closed input surface as anyhow errors
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{bail, Context, Result};
use colored::Colorize;
use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::QueueableCommand;

use crate::util::{ellipsize, pad};

pub const BACK_LABEL: &str = "← Back";

/// The user declined a step the command cannot finish without. Shown as a warning; the process exits 1.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct Cancelled(pub &'static str);

pub fn heading(message: &str) {
  println!("{}\n", message.bold().bright_blue());
}

pub fn success(message: &str) {
  println!("{} {}", "✓".bright_green(), message.green());
}

pub fn info(message: &str) {
  println!("{}", message.bright_cyan());
}

pub fn dim(message: &str) {
  println!("{}", message.dimmed());
}

pub fn warn(message: &str) {
  println!("{} {}", "⚠".bright_yellow(), message.yellow());
}

pub fn error(message: &str) {
  eprintln!("{} {}", "Error:".bright_red().bold(), message.red());
}

/// Draw `body` inside a box with `title` on the top border.
pub fn panel(title: &str, body: &str) {
  println!("{}", render_panel(title, body));
}

pub fn render_panel(title: &str, body: &str) -> String {
  let lines: Vec<&str> = body.lines().collect();
  let inner = lines
    .iter()
    .map(|l| l.chars().count())
    .chain(std::iter::once(title.chars().count() + 2))
    .max()
    .unwrap_or(0);

  let mut out = String::new();
  let top_fill = "─".repeat(inner.saturating_sub(title.chars().count() + 1));
  out.push_str(&format!("╭─ {} {}╮\n", title.bold(), top_fill));

  for line in &lines {
    out.push_str(&format!("│ {} │\n", pad(line, inner)));
  }

  out.push_str(&format!("╰{}╯", "─".repeat(inner + 2)));
  out
}

/// Plain-text table with a header row and a rule; columns sized to content.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
  let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
  for row in rows {
    for (i, cell) in row.iter().enumerate() {
      if i < widths.len() {
        widths[i] = widths[i].max(cell.chars().count());
      }
    }
  }

  let render_row = |cells: Vec<String>| -> String {
    cells
      .iter()
      .zip(&widths)
      .map(|(c, w)| pad(c, *w))
      .collect::<Vec<_>>()
      .join("  ")
      .trim_end()
      .to_string()
  };

  let mut out = String::new();
  out.push_str(&render_row(headers.iter().map(|h| h.to_string()).collect()));
  out.push('\n');
  out.push_str(&widths.iter().map(|w| "─".repeat(*w)).collect::<Vec<_>>().join("  "));
  out.push('\n');
  for row in rows {
    out.push_str(&render_row(row.clone()));
    out.push('\n');
  }
  out
}

/// Interactive input seam; handlers take `&mut dyn Prompter` so flows can be driven from tests.
pub trait Prompter {
  /// Pick one of `options`. `Ok(None)` means the user chose "← Back".
  fn select(&mut self, title: &str, options: &[String], allow_back: bool) -> Result<Option<usize>>;

  /// Free text; an empty answer yields `default` when given.
  fn text(&mut self, label: &str, default: Option<&str>) -> Result<String>;

  fn confirm(&mut self, question: &str, default: bool) -> Result<bool>;

  /// Wait for Enter.
  fn pause(&mut self, message: &str) -> Result<()>;
}

/// Key-driven on a terminal (arrow keys, Enter, Esc); numbered line input otherwise.
pub struct TerminalPrompter<R, W> {
  input: R,
  output: W,
  keys: bool,
}

impl TerminalPrompter<io::StdinLock<'static>, io::Stdout> {
  pub fn stdio() -> Self {
    let keys = io::stdin().is_terminal() && io::stdout().is_terminal();
    Self { input: io::stdin().lock(), output: io::stdout(), keys }
  }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
  pub fn new(input: R, output: W) -> Self {
    Self { input, output, keys: false }
  }

  fn read_line(&mut self) -> Result<String> {
    let mut line = String::new();
    let n = self.input.read_line(&mut line).context("reading from stdin")?;
    if n == 0 {
      bail!("input closed while waiting for an answer");
    }
    Ok(line.trim().to_string())
  }

  fn select_by_number(&mut self, title: &str, options: &[String], allow_back: bool) -> Result<Option<usize>> {
    loop {
      writeln!(self.output, "{}", title.bold())?;
      for (i, opt) in options.iter().enumerate() {
        writeln!(self.output, "  {}) {}", (i + 1).to_string().bright_cyan(), opt)?;
      }
      if allow_back {
        writeln!(self.output, "  {}) {}", "0".bright_cyan(), BACK_LABEL.dimmed())?;
      }
      write!(self.output, "> ")?;
      self.output.flush()?;

      let answer = self.read_line()?;
      match answer.parse::<usize>() {
        Ok(0) if allow_back => return Ok(None),
        Ok(n) if n >= 1 && n <= options.len() => return Ok(Some(n - 1)),
        _ => writeln!(self.output, "{}", format!("Invalid choice: {:?}", answer).yellow())?,
      }
    }
  }

  fn select_by_keys(&mut self, title: &str, options: &[String], allow_back: bool) -> Result<Option<usize>> {
    let mut rows = options.to_vec();
    if allow_back {
      rows.push(BACK_LABEL.to_string());
    }
    let width = terminal::size().map(|(cols, _)| cols as usize).unwrap_or(100).saturating_sub(3);
    let rows: Vec<String> = rows.iter().map(|r| ellipsize(r, width)).collect();

    let mut cursor = MenuCursor::new(options.len(), allow_back);
    let step = {
      let _raw = RawModeGuard::acquire()?;
      let mut drawn = 0;
      loop {
        drawn = draw_menu(&mut self.output, title, &rows, cursor.selected, drawn)?;
        let Event::Key(key) = event::read().context("reading a key")? else {
          continue;
        };
        if key.kind != KeyEventKind::Press && key.kind != KeyEventKind::Repeat {
          continue;
        }
        match cursor.on_key(key) {
          MenuStep::Stay => {}
          done => {
            clear_lines(&mut self.output, drawn)?;
            break done;
          }
        }
      }
    };

    match step {
      MenuStep::Chosen(i) => {
        writeln!(self.output, "{} {}", title.bold(), options[i].bright_cyan())?;
        Ok(Some(i))
      }
      MenuStep::Back => Ok(None),
      MenuStep::Interrupted | MenuStep::Stay => Err(Cancelled("Cancelled.").into()),
    }
  }

  fn confirm_by_key(&mut self, question: &str, default: bool) -> Result<bool> {
    let hint = if default { "Y/n" } else { "y/N" };
    write!(self.output, "{} [{}]: ", question, hint)?;
    self.output.flush()?;

    let answer = {
      let _raw = RawModeGuard::acquire()?;
      loop {
        let Event::Key(key) = event::read().context("reading a key")? else {
          continue;
        };
        if key.kind != KeyEventKind::Press {
          continue;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
          break None;
        }
        if let Some(yes) = confirm_key(key.code, default) {
          break Some(yes);
        }
      }
    };

    let Some(yes) = answer else {
      writeln!(self.output)?;
      return Err(Cancelled("Cancelled.").into());
    };
    let shown = if yes { "y" } else { "n" };
    writeln!(self.output, "{}", shown.bright_cyan())?;
    Ok(yes)
  }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
  fn select(&mut self, title: &str, options: &[String], allow_back: bool) -> Result<Option<usize>> {
    if options.is_empty() && !allow_back {
      bail!("nothing to choose from for {:?}", title);
    }
    if self.keys {
      self.select_by_keys(title, options, allow_back)
    } else {
      self.select_by_number(title, options, allow_back)
    }
  }

  fn text(&mut self, label: &str, default: Option<&str>) -> Result<String> {
    loop {
      match default {
        Some(d) if !d.is_empty() => write!(self.output, "{} [{}]: ", label, d.dimmed())?,
        _ => write!(self.output, "{}: ", label)?,
      }
      self.output.flush()?;

      let answer = self.read_line()?;
      if !answer.is_empty() {
        return Ok(answer);
      }
      if let Some(d) = default {
        return Ok(d.to_string());
      }
    }
  }

  fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
    if self.keys {
      return self.confirm_by_key(question, default);
    }
    let hint = if default { "Y/n" } else { "y/N" };
    loop {
      write!(self.output, "{} [{}]: ", question, hint)?;
      self.output.flush()?;

      match self.read_line()?.to_lowercase().as_str() {
        "" => return Ok(default),
        "y" | "yes" => return Ok(true),
        "n" | "no" => return Ok(false),
        _ => writeln!(self.output, "{}", "Please answer y or n.".yellow())?,
      }
    }
  }

  fn pause(&mut self, message: &str) -> Result<()> {
    write!(self.output, "{}", message.dimmed())?;
    self.output.flush()?;
    let mut sink = String::new();
    self.input.read_line(&mut sink).context("reading from stdin")?;
    Ok(())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuStep {
  Stay,
  Chosen(usize),
  Back,
  Interrupted,
}

/// Highlighted row of a key-driven menu; the Back row, when present, sits after the options.
struct MenuCursor {
  selected: usize,
  options: usize,
  rows: usize,
  allow_back: bool,
}

impl MenuCursor {
  fn new(options: usize, allow_back: bool) -> Self {
    Self { selected: 0, options, rows: options + usize::from(allow_back), allow_back }
  }

  fn on_key(&mut self, key: KeyEvent) -> MenuStep {
    match key.code {
      KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => MenuStep::Interrupted,
      KeyCode::Up | KeyCode::Char('k') => {
        self.selected = if self.selected == 0 { self.rows - 1 } else { self.selected - 1 };
        MenuStep::Stay
      }
      KeyCode::Down | KeyCode::Char('j') => {
        self.selected = (self.selected + 1) % self.rows;
        MenuStep::Stay
      }
      KeyCode::Home => {
        self.selected = 0;
        MenuStep::Stay
      }
      KeyCode::End => {
        self.selected = self.rows - 1;
        MenuStep::Stay
      }
      KeyCode::Enter if self.selected < self.options => MenuStep::Chosen(self.selected),
      KeyCode::Enter if self.allow_back => MenuStep::Back,
      KeyCode::Esc if self.allow_back => MenuStep::Back,
      _ => MenuStep::Stay,
    }
  }
}

/// `Some(answer)` for y, n or Enter; other keys are ignored.
fn confirm_key(code: KeyCode, default: bool) -> Option<bool> {
  match code {
    KeyCode::Char('y') | KeyCode::Char('Y') => Some(true),
    KeyCode::Char('n') | KeyCode::Char('N') => Some(false),
    KeyCode::Enter => Some(default),
    _ => None,
  }
}

/// Redraw the menu over its previous frame; returns the number of lines to move up next time.
fn draw_menu<W: Write>(out: &mut W, title: &str, rows: &[String], selected: usize, previous: usize) -> Result<usize> {
  clear_lines(out, previous)?;
  out.queue(Print(format!("{}\r\n", title.bold())))?;
  for (i, row) in rows.iter().enumerate() {
    let line = if i == selected { format!("{} {}", "›".bright_cyan(), row.bright_cyan()) } else { format!("  {}", row) };
    out.queue(Print(format!("{}\r\n", line)))?;
  }
  out.queue(Print("(↑/↓ to move, Enter to select)".dimmed()))?;
  out.flush()?;
  Ok(rows.len() + 1)
}

fn clear_lines<W: Write>(out: &mut W, count: usize) -> Result<()> {
  if count > 0 {
    out.queue(MoveUp(count as u16))?;
  }
  out.queue(MoveToColumn(0))?;
  out.queue(Clear(ClearType::FromCursorDown))?;
  out.flush()?;
  Ok(())
}

/// Raw mode for the lifetime of the guard.
struct RawModeGuard;

impl RawModeGuard {
  fn acquire() -> Result<Self> {
    terminal::enable_raw_mode().context("enabling raw terminal mode")?;
    Ok(Self)
  }
}

impl Drop for RawModeGuard {
  fn drop(&mut self) {
    let _ = terminal::disable_raw_mode();
  }
}

/// Canned answers for driving interactive flows in tests.
#[cfg(test)]
pub struct ScriptedPrompter {
  pub answers: std::collections::VecDeque<String>,
}

#[cfg(test)]
impl ScriptedPrompter {
  pub fn new(answers: &[&str]) -> Self {
    Self { answers: answers.iter().map(|s| s.to_string()).collect() }
  }

  fn next(&mut self) -> Result<String> {
    self.answers.pop_front().ok_or_else(|| anyhow::anyhow!("no scripted answer left"))
  }
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
  fn select(&mut self, _title: &str, options: &[String], allow_back: bool) -> Result<Option<usize>> {
    let answer = self.next()?;
    if allow_back && answer == BACK_LABEL {
      return Ok(None);
    }
    options
      .iter()
      .position(|o| *o == answer)
      .map(Some)
      .ok_or_else(|| anyhow::anyhow!("scripted answer {:?} not among {:?}", answer, options))
  }

  fn text(&mut self, _label: &str, default: Option<&str>) -> Result<String> {
    let answer = self.next()?;
    if answer.is_empty() {
      Ok(default.unwrap_or_default().to_string())
    } else {
      Ok(answer)
    }
  }

  fn confirm(&mut self, _question: &str, _default: bool) -> Result<bool> {
    Ok(self.next()? == "y")
  }

  fn pause(&mut self, _message: &str) -> Result<()> {
    Ok(())
  }
}
