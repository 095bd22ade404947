//! Integer expression calculator built on the `lalrc` runtime.
//!
//! The parser module is compiled into `OUT_DIR` at build time by
//! `lalrc-gen` from `src/calc.g` and included below; [`eval`] wires it to
//! the lexer and the shift-reduce driver.
//!
//! # Example
//!
//! ```
//! assert_eq!(lalrc_calc::eval("(1 + 2) * 3").unwrap(), 9);
//! ```

use anyhow::{bail, Result};
use lalrc::{str_input, Lexer, Parser};

// Generated from src/calc.g. The table-size consts it exports are unused
// here.
#[allow(dead_code)]
mod parser {
    include!(concat!(env!("OUT_DIR"), "/calc.rs"));
}

/// Parses and evaluates one arithmetic expression.
pub fn eval(input: &str) -> Result<i64> {
    let tables = parser::tables();
    let mut lexer = Lexer::try_new(parser::token_defs(), tables.eof, str_input(input))?;
    match Parser::new(&tables).parse(&mut lexer, &mut parser::Actions)? {
        parser::Value::Expr(value) => {
            log::debug!("{input:?} = {value}");
            Ok(value)
        }
        _ => bail!("parse finished on a non-expression value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lalrc::ParseError;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn precedence_and_grouping() {
        init_logger();
        assert_eq!(eval("1 + 2 * 3").unwrap(), 7);
        assert_eq!(eval("(1 + 2) * 3").unwrap(), 9);
        assert_eq!(eval("2 - 3 - 4").unwrap(), -5);
        assert_eq!(eval("42").unwrap(), 42);
    }

    #[test]
    fn syntax_errors_carry_positions() {
        let err = eval("1 + ").unwrap_err();
        match err.downcast_ref::<ParseError>() {
            Some(ParseError::Syntax { position, .. }) => assert_eq!(position.offset, 4),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn action_failures_become_semantic_errors() {
        // one past i64::MAX, so the action's parse fails
        let err = eval("9223372036854775808").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ParseError>(),
            Some(ParseError::Semantic { .. })
        ));
    }

    #[test]
    fn unknown_bytes_are_lexical_errors() {
        assert!(matches!(
            eval("1 ? 2").unwrap_err().downcast_ref::<ParseError>(),
            Some(ParseError::Lexical(_))
        ));
    }
}
