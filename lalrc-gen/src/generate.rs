//! Rust source emitter.
//!
//! Renders a compiled grammar as a self-contained module over the `lalrc`
//! runtime: the token-definition table, the serialized ACTION/GOTO rows,
//! production metadata, and a [`Semantics`] implementation whose `reduce`
//! match splices the grammar's code fragments, with `$i` placeholders
//! rewritten to popped-argument bindings. Stack values travel in a
//! generated `Value` enum with one variant per nonterminal plus one for
//! shifted tokens; typed accessors do the unwrapping, so a fragment sees
//! its `$i` arguments already at their declared types (tokens stay
//! [`lalrc::Token`]). The exact rendering is not a stability contract.
//!
//! [`Semantics`]: lalrc::Semantics

use crate::{compile_str, Compiled};
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{self, Write};
use std::path::Path;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\$([0-9]+)"#).unwrap());

fn capitalize_first(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + c.as_str(),
    }
}

/// Rewrites `$i` placeholders to `a{i}` argument bindings.
fn splice(code: &str) -> String {
    PLACEHOLDER_RE.replace_all(code, "a$1").into_owned()
}

/// Declared result type of a nonterminal, read off any of its productions.
fn nonterm_type(grammar: &crate::Grammar, sym: usize) -> &str {
    grammar
        .prods
        .iter()
        .zip(&grammar.actions)
        .find(|(p, _)| p.lhs == sym)
        .map(|(_, a)| a.result_type.as_str())
        .unwrap_or("()")
}

/// Generates parser code from a grammar file into an output Rust file.
pub fn generate<P: AsRef<Path>>(grammar_path: P, out_path: P) -> Result<()> {
    let text = std::fs::read_to_string(&grammar_path)
        .with_context(|| format!("reading {}", grammar_path.as_ref().display()))?;
    let compiled = compile_str(&text)
        .with_context(|| format!("compiling {}", grammar_path.as_ref().display()))?;
    let mut out = std::fs::File::create(&out_path)
        .with_context(|| format!("creating {}", out_path.as_ref().display()))?;
    render(&mut out, &compiled)
        .with_context(|| format!("writing {}", out_path.as_ref().display()))?;
    Ok(())
}

/// Renders the generated module.
pub fn render<W: Write>(out: &mut W, compiled: &Compiled) -> io::Result<()> {
    let Compiled {
        grammar,
        automaton,
        extended,
        firsts,
        follows,
        tables,
    } = compiled;

    writeln!(out, "/*")?;
    writeln!(out, "Produced by parser generator LALRC")?;
    writeln!(out)?;
    for i in 0..grammar.prods.len() {
        writeln!(out, "{:4}: {}", i, grammar.display_prod(i))?;
    }
    writeln!(out)?;
    crate::automaton::write_states(out, grammar, automaton)?;
    writeln!(out)?;
    crate::extend::write_extended(out, grammar, extended)?;
    writeln!(out)?;
    crate::sets::write_first(out, grammar, firsts)?;
    writeln!(out)?;
    crate::sets::write_follow(out, grammar, follows)?;
    writeln!(out, "*/")?;
    writeln!(out)?;

    writeln!(out, "use anyhow::{{bail, Context, Result}};")?;
    writeln!(
        out,
        "use lalrc::{{Action, ParseTables, Prod, Semantics, Token, TokenDef}};"
    )?;
    writeln!(out)?;
    writeln!(out, "pub const N_STATES: usize = {};", tables.n_states())?;
    writeln!(out, "pub const N_SYMBOLS: usize = {};", grammar.n_symbols())?;
    writeln!(
        out,
        "pub const N_PRODUCTIONS: usize = {};",
        grammar.prods.len()
    )?;
    writeln!(out)?;

    writeln!(out, "pub fn token_defs() -> Vec<TokenDef> {{")?;
    writeln!(out, "    vec![")?;
    for def in grammar.lexicon() {
        writeln!(
            out,
            "        TokenDef {{ name: {:?}.into(), pattern: {:?}.into(), terminal: {:?} }},",
            def.name.as_str(),
            def.pattern.as_str(),
            def.terminal
        )?;
    }
    writeln!(out, "    ]")?;
    writeln!(out, "}}")?;
    writeln!(out)?;

    writeln!(out, "pub fn tables() -> ParseTables {{")?;
    writeln!(out, "    ParseTables {{")?;
    writeln!(out, "        actions: vec![")?;
    for (state, row) in tables.actions.iter().enumerate() {
        let cells: Vec<String> = row.iter().map(|a| format!("Action::{:?}", a)).collect();
        writeln!(
            out,
            "            vec![{}], // state {}",
            cells.join(", "),
            state
        )?;
    }
    writeln!(out, "        ],")?;
    writeln!(out, "        prods: vec![")?;
    for (i, prod) in tables.prods.iter().enumerate() {
        writeln!(
            out,
            "            Prod {{ lhs: {}, len: {} }}, // {}",
            prod.lhs,
            prod.len,
            grammar.display_prod(i)
        )?;
    }
    writeln!(out, "        ],")?;
    let names: Vec<String> = tables.symbols.iter().map(|s| format!("{:?}", s.as_str())).collect();
    writeln!(
        out,
        "        symbols: vec![{}].into_iter().map(Into::into).collect(),",
        names.join(", ")
    )?;
    writeln!(out, "        eof: {},", tables.eof)?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    writeln!(out)?;

    // One variant per nonterminal, at its declared result type; shifted
    // tokens travel as themselves.
    writeln!(out, "pub enum Value {{")?;
    writeln!(out, "    Token(Token),")?;
    for sym in 1..grammar.n_nonterminals {
        writeln!(
            out,
            "    {}({}),",
            capitalize_first(grammar.name(sym)),
            nonterm_type(grammar, sym)
        )?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;

    writeln!(out, "impl Value {{")?;
    writeln!(out, "    fn token(self) -> Result<Token> {{")?;
    writeln!(
        out,
        "        match self {{ Value::Token(t) => Ok(t), _ => bail!(\"expected a token value\") }}"
    )?;
    writeln!(out, "    }}")?;
    for sym in 1..grammar.n_nonterminals {
        let name = grammar.name(sym);
        writeln!(out)?;
        writeln!(
            out,
            "    fn {}(self) -> Result<{}> {{",
            name,
            nonterm_type(grammar, sym)
        )?;
        writeln!(
            out,
            "        match self {{ Value::{}(v) => Ok(v), _ => bail!(\"expected a {} value\") }}",
            capitalize_first(name),
            name
        )?;
        writeln!(out, "    }}")?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;

    writeln!(out, "pub struct Actions;")?;
    writeln!(out)?;
    writeln!(out, "impl Semantics for Actions {{")?;
    writeln!(out, "    type Value = Value;")?;
    writeln!(out)?;
    writeln!(out, "    fn shift(&mut self, token: Token) -> Result<Value> {{")?;
    writeln!(out, "        Ok(Value::Token(token))")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    #[allow(unused_variables)]")?;
    writeln!(
        out,
        "    fn reduce(&mut self, prod: usize, args: Vec<Value>) -> Result<Value> {{"
    )?;
    writeln!(out, "        let mut args = args.into_iter();")?;
    writeln!(out, "        match prod {{")?;
    for (i, (prod, action)) in grammar.prods.iter().zip(&grammar.actions).enumerate() {
        if i == 0 {
            writeln!(
                out,
                "            0 => args.next().context(\"empty reduction\"),"
            )?;
            continue;
        }
        writeln!(out, "            // {}", grammar.display_prod(i))?;
        writeln!(out, "            {} => {{", i)?;
        for (pos, &sym) in prod.rhs.iter().enumerate() {
            let accessor = if grammar.is_terminal(sym) {
                "token".to_owned()
            } else {
                grammar.name(sym).to_owned()
            };
            writeln!(
                out,
                "                let a{pos} = args.next().context(\"argument {pos}\")?.{accessor}()?;"
            )?;
        }
        writeln!(
            out,
            "                Ok(Value::{}({{ {} }}))",
            capitalize_first(grammar.name(prod.lhs)),
            splice(&action.code)
        )?;
        writeln!(out, "            }}")?;
    }
    writeln!(
        out,
        "            other => bail!(\"unknown production {{other}}\"),"
    )?;
    writeln!(out, "        }}")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALC: &str = "\
skip ws [ \\t\\n]+
token num [0-9]+
token plus \\+
start sum
sum -> sum plus num { $0 + $2.text.parse::<i64>()? }  : i64
sum -> num           { $0.text.parse()? } : i64
";

    #[test]
    fn placeholders_are_rewritten() {
        assert_eq!(splice("$0 + $2"), "a0 + a2");
        assert_eq!(splice("lookup($10)"), "lookup(a10)");
        assert_eq!(splice("no placeholders"), "no placeholders");
    }

    #[test]
    fn rendered_module_has_every_section() {
        let compiled = compile_str(CALC).unwrap();
        let mut buf = Vec::new();
        render(&mut buf, &compiled).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Produced by parser generator LALRC"));
        assert!(text.contains("pub fn token_defs() -> Vec<TokenDef>"));
        assert!(text.contains("pub fn tables() -> ParseTables"));
        assert!(text.contains("Action::Shift"));
        assert!(text.contains("enum Value"));
        assert!(text.contains("Sum(i64)"));
        assert!(text.contains("impl Semantics for Actions"));
        // placeholder rewritten inside the spliced fragment
        assert!(text.contains("a0.text.parse()?"));
    }

    #[test]
    fn skip_tokens_are_emitted_without_terminal_ids() {
        let compiled = compile_str(CALC).unwrap();
        let mut buf = Vec::new();
        render(&mut buf, &compiled).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains(
            r#"TokenDef { name: "ws".into(), pattern: "[ \\t\\n]+".into(), terminal: None }"#
        ));
    }
}
