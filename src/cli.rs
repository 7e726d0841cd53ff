//! The Metarule Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::{io, process};

use clap::Parser;
use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{Environment, Expr},
    combinators::Evaluator,
    errors::{print_error, SourceContext},
    grammars::expression,
    macros::MacroRule,
    syntax::{tokenize, TokenStream},
    MetaruleError,
};

pub mod args;
pub mod output;

use args::{Command, LogLevel, MetaruleArgs};
use output::Output;

/// Whether the command accepted its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Rejected,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Metarule(#[from] MetaruleError),
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

// ============================================================================
// ENTRY POINT
// ============================================================================

/// The main entry point for the CLI.
pub fn run() {
    let args = MetaruleArgs::parse();
    init_logging(args.log_level);

    let mut out = Output::new(args.color.choice());
    let result = dispatch(args.command, args.max_depth, &mut out);

    match result {
        Ok(Outcome::Accepted) => {}
        Ok(Outcome::Rejected) => process::exit(1),
        Err(CliError::Metarule(error)) => {
            print_error(error);
            process::exit(1);
        }
        Err(error) => {
            eprintln!("Error: {}", error);
            process::exit(1);
        }
    }
}

/// Run one subcommand, writing to `out`.
pub fn dispatch(command: Command, max_depth: usize, out: &mut Output) -> Result<Outcome, CliError> {
    debug!(?command, max_depth, "dispatching");
    match command {
        Command::Tokens { source } => handle_tokens(&source, out),
        Command::Expr {
            source,
            eval,
            vars,
            json,
        } => {
            let env: Environment = vars.into_iter().collect();
            handle_expr(&source, eval.then_some(&env), json, max_depth, out)
        }
        Command::Rule { pattern } => handle_rule(&pattern, out),
        Command::Match {
            pattern,
            input,
            json,
        } => handle_match(&pattern, &input, json, max_depth, out),
    }
}

fn init_logging(level: Option<LogLevel>) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = match level {
        Some(level) => EnvFilter::new(level.as_str()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let formatter = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(formatter)
        .with(filter)
        .init();
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

fn handle_tokens(source: &str, out: &mut Output) -> Result<Outcome, CliError> {
    let tokens = tokenize(source)?;
    out.tokens(&tokens)?;
    Ok(Outcome::Accepted)
}

fn handle_expr(
    source: &str,
    env: Option<&Environment>,
    json: bool,
    max_depth: usize,
    out: &mut Output,
) -> Result<Outcome, CliError> {
    let stream = TokenStream::lex(source)?;
    let Some(node) = Evaluator::new(expression::grammar())
        .with_max_depth(max_depth)
        .compile(&stream)
    else {
        out.rejected("not an expression")?;
        return Ok(Outcome::Rejected);
    };

    let context = SourceContext::from_source("expression", source);
    let expr = Expr::lower(&node, &context)?;

    if json {
        out.json(&node)?;
    } else {
        out.line(&expr.to_string())?;
    }

    if let Some(env) = env {
        let value = expr.evaluate(env, &context)?;
        out.value(value)?;
    }
    Ok(Outcome::Accepted)
}

fn handle_rule(pattern: &str, out: &mut Output) -> Result<Outcome, CliError> {
    let rule = MacroRule::compile(pattern)?;
    out.line(&rule.rule().to_string())?;
    Ok(Outcome::Accepted)
}

fn handle_match(
    pattern: &str,
    input: &str,
    json: bool,
    max_depth: usize,
    out: &mut Output,
) -> Result<Outcome, CliError> {
    let rule = MacroRule::compile(pattern)?.with_max_depth(max_depth);
    let Some(found) = rule.apply(input)? else {
        out.rejected("input does not match the pattern")?;
        return Ok(Outcome::Rejected);
    };

    if json {
        out.json(&found)?;
        return Ok(Outcome::Accepted);
    }

    out.accepted()?;
    for name in found.bindings().keys() {
        out.binding(name, &found.texts(name))?;
    }
    Ok(Outcome::Accepted)
}
