//! Defines the command-line arguments and subcommands for the Metarule CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use termcolor::ColorChoice;

use crate::combinators::DEFAULT_MAX_DEPTH;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "metarule",
    version,
    about = "Compose grammars from combinators; parse expressions and match macro patterns."
)]
pub struct MetaruleArgs {
    /// Maximum number of nested structural rules before a match gives up.
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Log level; falls back to RUST_LOG, then to `warn`.
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// When to color output.
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the tokens of a source text.
    Tokens {
        #[arg(required = true)]
        source: String,
    },
    /// Parse an expression and print it fully parenthesized.
    Expr {
        #[arg(required = true)]
        source: String,
        /// Also evaluate the expression.
        #[arg(long)]
        eval: bool,
        /// Bind an identifier for evaluation, e.g. `--var x=3`.
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_binding)]
        vars: Vec<(String, i64)>,
        /// Print the match tree as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the rule a macro pattern compiles to.
    Rule {
        #[arg(required = true)]
        pattern: String,
    },
    /// Match input against a macro pattern and print its captures.
    Match {
        #[arg(required = true)]
        pattern: String,
        #[arg(required = true)]
        input: String,
        /// Print the match as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// `auto` colors only when stdout is a terminal.
    pub fn choice(self) -> ColorChoice {
        match self {
            ColorMode::Auto if std::io::stdout().is_terminal() => ColorChoice::Auto,
            ColorMode::Auto | ColorMode::Never => ColorChoice::Never,
            ColorMode::Always => ColorChoice::Always,
        }
    }
}

fn parse_binding(text: &str) -> Result<(String, i64), String> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", text))?;
    let value = value
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid value for '{}': {}", name, e))?;
    Ok((name.trim().to_string(), value))
}
