//! Line-oriented textual grammar format.
//!
//! Blank lines and `--` comments are ignored. Everything else is one of:
//!
//! ```text
//! token NAME regex            -- terminal declaration
//! skip NAME regex             -- lexed and discarded, never a terminal
//! start name                  -- the start rule
//! name -> sym sym { code } : Type
//! name -> !EPSILON { code } : Type
//! ```
//!
//! The regex runs to the end of the line. The code fragment may reference
//! matched sub-symbols as `$0`, `$1`, ..; the declared type must agree
//! across alternatives of one rule. Parsing here is purely syntactic: all
//! semantic validation happens in [`Grammar::try_new`].
//!
//! [`Grammar::try_new`]: crate::grammar::Grammar::try_new

use crate::error::CompileError;
use crate::grammar::{GrammarSpec, RuleSpec, TokenSpec};
use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(token|skip)\s+(\S+)\s+(.+)$"#).unwrap());

static START_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^start\s+(\S+)$"#).unwrap());

static RULE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(\S+)\s*->\s*([^{]*)\{(.*)\}\s*:\s*(.+)$"#).unwrap());

/// Parses a grammar description into its raw [`GrammarSpec`].
pub fn parse_grammar(input: &str) -> Result<GrammarSpec, CompileError> {
    let mut spec = GrammarSpec::default();
    let mut start = None;

    for (i, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with("--") {
            continue;
        }

        if let Some(cap) = TOKEN_RE.captures(line) {
            let name = &cap[2];
            let pattern = cap[3].trim();
            spec.tokens.push(if &cap[1] == "skip" {
                TokenSpec::skipped(name, pattern)
            } else {
                TokenSpec::new(name, pattern)
            });
            continue;
        }

        if let Some(cap) = START_RE.captures(line) {
            start = Some(cap[1].to_owned());
            continue;
        }

        if let Some(cap) = RULE_RE.captures(line) {
            let symbols: Vec<&str> = cap[2].split_whitespace().collect();
            spec.rules.push(RuleSpec::new(
                &cap[1],
                &symbols,
                cap[3].trim(),
                cap[4].trim(),
            ));
            continue;
        }

        return Err(CompileError::Input {
            line: i + 1,
            text: line.to_owned(),
        });
    }

    spec.start = start.ok_or(CompileError::NoStartDeclaration)?;
    Ok(spec)
}
