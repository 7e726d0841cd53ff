//! Handles all user-facing output for the CLI.
//!
//! This module is responsible for colorizing output and rendering tokens,
//! rules, expressions and match results. Everything goes to stdout; errors
//! are rendered separately through miette.

use serde::Serialize;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::syntax::Token;

// ============================================================================
// OUTPUT SINK
// ============================================================================

pub struct Output {
    stdout: StandardStream,
}

impl Output {
    pub fn new(choice: ColorChoice) -> Self {
        Self {
            stdout: StandardStream::stdout(choice),
        }
    }

    /// One token per line: span, kind, text, and the id of identifiers.
    pub fn tokens(&mut self, tokens: &[Token]) -> io::Result<()> {
        for token in tokens {
            write!(self.stdout, "{:>4}..{:<4} ", token.span.start, token.span.end)?;
            self.colored(Color::Cyan, false, &format!("{:<16}", token.kind.to_string()))?;
            match token.id {
                Some(id) => writeln!(self.stdout, " {} #{:08x}", token.text, id)?,
                None => writeln!(self.stdout, " {}", token.text)?,
            }
        }
        Ok(())
    }

    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.stdout, "{}", text)
    }

    /// `= value` in bold green.
    pub fn value(&mut self, value: i64) -> io::Result<()> {
        self.colored(Color::Green, true, &format!("= {}", value))?;
        writeln!(self.stdout)
    }

    pub fn accepted(&mut self) -> io::Result<()> {
        self.colored(Color::Green, true, "accepted")?;
        writeln!(self.stdout)
    }

    pub fn rejected(&mut self, reason: &str) -> io::Result<()> {
        self.colored(Color::Red, true, "rejected")?;
        writeln!(self.stdout, ": {}", reason)
    }

    /// `$name = first, second`
    pub fn binding(&mut self, name: &str, values: &[&str]) -> io::Result<()> {
        self.colored(Color::Yellow, false, &format!("${}", name))?;
        writeln!(self.stdout, " = {}", values.join(", "))
    }

    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> io::Result<()> {
        let text = serde_json::to_string_pretty(value)?;
        writeln!(self.stdout, "{}", text)
    }

    fn colored(&mut self, color: Color, bold: bool, text: &str) -> io::Result<()> {
        self.stdout
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold))?;
        write!(self.stdout, "{}", text)?;
        self.stdout.reset()
    }
}
