use std::io::{BufRead, IsTerminal, Write};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    style::Print,
    terminal,
};

use crate::error::{AppError, Result};

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Ask a y/N question on the terminal. Anything but `y` is a no.
///
/// Without an interactive terminal the answer is no; callers offer `--yes`
/// for scripted use.
pub fn confirm(question: &str) -> Result<bool> {
    if !std::io::stdin().is_terminal() {
        tracing::debug!("stdin is not a terminal, declining confirmation");
        return Ok(false);
    }

    let mut out = std::io::stderr();
    execute!(out, Print(format!("{question} [y/N] ")))?;
    out.flush()?;

    let _raw = RawModeGuard::enter()?;
    loop {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event::read()?
        else {
            continue;
        };

        let answer = match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                return Err(AppError::Aborted);
            }
            KeyCode::Char('y' | 'Y') => true,
            KeyCode::Char('n' | 'N') | KeyCode::Enter | KeyCode::Esc => false,
            _ => continue,
        };
        execute!(out, Print(if answer { "y\r\n" } else { "n\r\n" }))?;
        out.flush()?;
        return Ok(answer);
    }
}

/// Let the user pick one of `options` by number.
///
/// Returns `None` without an interactive terminal.
pub fn choose(title: &str, options: &[&str]) -> Result<Option<usize>> {
    if !std::io::stdin().is_terminal() {
        tracing::debug!("stdin is not a terminal, skipping selection");
        return Ok(None);
    }
    choose_from(&mut std::io::stdin().lock(), &mut std::io::stderr(), title, options).map(Some)
}

fn choose_from(
    input: &mut impl BufRead,
    out: &mut impl Write,
    title: &str,
    options: &[&str],
) -> Result<usize> {
    writeln!(out, "{title}")?;
    for (number, option) in options.iter().enumerate() {
        writeln!(out, "{:>3}. {option}", number + 1)?;
    }

    for _ in 0..3 {
        write!(out, "Enter a number [1-{}]: ", options.len())?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Err(AppError::Aborted);
        }
        match line.trim().parse::<usize>() {
            Ok(number) if (1..=options.len()).contains(&number) => return Ok(number - 1),
            _ => writeln!(out, "Invalid selection.")?,
        }
    }
    Err(AppError::InvalidSelection)
}

/// Skip the question when `assume_yes` is set; abort on a no.
pub fn require_confirmation(assume_yes: bool, question: &str) -> Result<()> {
    if assume_yes || confirm(question)? {
        Ok(())
    } else {
        Err(AppError::Aborted)
    }
}
