//! Grammar model: the validated, interned form of a grammar description.
//!
//! The input surface is [`GrammarSpec`]: a token table (name, pattern, skip
//! flag), a production list where each production carries a semantic-action
//! code fragment and a declared result type, and a start-rule name.
//! [`Grammar::try_new`] validates referential and type consistency and
//! interns every symbol into a dense id space laid out for the parse
//! tables: the synthetic start nonterminal at id 0, user nonterminals in
//! declaration order, then terminals, with the reserved end-of-input
//! terminal last. Skip tokens get no symbol id at all; they exist only in
//! the lexer and never reach FIRST/FOLLOW.
//!
//! Epsilon productions are written with the `!EPSILON` marker as their only
//! right-hand-side symbol and are stored with an empty right-hand side.

use crate::error::CompileError;
use crate::symtab::Symtab;
use lalrc::TokenDef;
use std::collections::HashMap;

/// Reserved synthetic start nonterminal wrapping the user's start rule.
pub const START: &str = "!Start";
/// Reserved marker for the empty production.
pub const EPSILON: &str = "!EPSILON";
/// Reserved end-of-input terminal.
pub const EOF: &str = "!EOF";

/// Declaration keywords of the textual format. A rule with one of these
/// names would be swallowed by the declaration syntax instead of parsing
/// as a production, so they are rejected outright.
const KEYWORDS: [&str; 3] = ["token", "skip", "start"];

fn is_ident(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A token declaration: name, regular expression, skip flag.
#[derive(Debug, Clone)]
pub struct TokenSpec {
    pub name: String,
    pub pattern: String,
    pub skip: bool,
}

impl TokenSpec {
    pub fn new(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_owned(),
            pattern: pattern.to_owned(),
            skip: false,
        }
    }

    pub fn skipped(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_owned(),
            pattern: pattern.to_owned(),
            skip: true,
        }
    }
}

/// One production with its bound semantic action.
#[derive(Debug, Clone)]
pub struct RuleSpec {
    /// Nonterminal this production defines.
    pub name: String,
    /// Right-hand-side symbol names (or the single `!EPSILON` marker).
    pub symbols: Vec<String>,
    /// Semantic-action code fragment; `$i` refers to the i-th matched
    /// sub-symbol.
    pub code: String,
    /// Declared result type; must agree across alternatives of `name`.
    pub result_type: String,
}

impl RuleSpec {
    pub fn new(name: &str, symbols: &[&str], code: &str, result_type: &str) -> Self {
        Self {
            name: name.to_owned(),
            symbols: symbols.iter().map(|s| (*s).to_owned()).collect(),
            code: code.to_owned(),
            result_type: result_type.to_owned(),
        }
    }
}

/// The raw grammar description, before validation.
#[derive(Debug, Clone, Default)]
pub struct GrammarSpec {
    pub tokens: Vec<TokenSpec>,
    pub rules: Vec<RuleSpec>,
    pub start: String,
}

/// A production over interned symbol ids. Epsilon productions have an empty
/// `rhs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prod {
    pub lhs: usize,
    pub rhs: Vec<usize>,
}

/// Semantic-action metadata, parallel to [`Grammar::prods`].
#[derive(Debug, Clone)]
pub struct ActionCode {
    pub code: String,
    pub result_type: String,
}

/// The validated grammar. Production 0 is always the synthetic
/// `!Start -> start` wrapper.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub symbols: Symtab,
    pub n_nonterminals: usize,
    /// Symbol id of the user's start nonterminal.
    pub start: usize,
    pub prods: Vec<Prod>,
    pub actions: Vec<ActionCode>,
    /// Production indices grouped by defining nonterminal id.
    pub prods_by_lhs: Vec<Vec<usize>>,
    /// Token declarations in order, skip tokens included.
    tokens: Vec<TokenSpec>,
}

impl Grammar {
    /// Validates `spec` and interns it.
    pub fn try_new(spec: &GrammarSpec) -> Result<Self, CompileError> {
        validate_tokens(&spec.tokens)?;

        let rule_names: Vec<&str> = spec.rules.iter().map(|r| r.name.as_str()).collect();
        for rule in &spec.rules {
            if rule.name.starts_with('!') || KEYWORDS.contains(&rule.name.as_str()) {
                return Err(CompileError::ReservedName {
                    name: rule.name.clone(),
                });
            }
            if !is_ident(&rule.name) {
                return Err(CompileError::InvalidName {
                    name: rule.name.clone(),
                });
            }
            if spec.tokens.iter().any(|t| t.name == rule.name) {
                return Err(CompileError::SymbolCollision {
                    name: rule.name.clone(),
                });
            }
            if rule.code.trim().is_empty() {
                return Err(CompileError::EmptyAction {
                    rule: rule.name.clone(),
                });
            }
        }

        // Result types must agree across alternatives of one nonterminal.
        let mut result_types: HashMap<&str, &str> = HashMap::new();
        for rule in &spec.rules {
            match result_types.get(rule.name.as_str()) {
                Some(&seen) if seen != rule.result_type => {
                    return Err(CompileError::InconsistentReturnType {
                        rule: rule.name.clone(),
                        first: seen.to_owned(),
                        second: rule.result_type.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    result_types.insert(&rule.name, &rule.result_type);
                }
            }
        }

        // Referential consistency: every rhs name is a terminal, a defined
        // rule, or the lone epsilon marker.
        for rule in &spec.rules {
            let epsilons = rule.symbols.iter().filter(|s| s.as_str() == EPSILON).count();
            if epsilons > 0 && rule.symbols.len() != 1 {
                return Err(CompileError::EpsilonPlacement {
                    rule: rule.name.clone(),
                });
            }
            for sym in &rule.symbols {
                if sym == EPSILON {
                    continue;
                }
                let known = rule_names.contains(&sym.as_str())
                    || spec.tokens.iter().any(|t| !t.skip && t.name == *sym);
                if !known {
                    return Err(CompileError::UndefinedSymbol {
                        rule: rule.name.clone(),
                        symbol: sym.clone(),
                    });
                }
            }
        }

        if !rule_names.contains(&spec.start.as_str()) {
            return Err(CompileError::MissingStartRule {
                start: spec.start.clone(),
            });
        }

        // Intern: synthetic start, nonterminals, terminals, end-of-input.
        let mut symbols = Symtab::new();
        symbols.add(START);
        for rule in &spec.rules {
            symbols.add(&rule.name);
        }
        let n_nonterminals = symbols.len();
        for token in spec.tokens.iter().filter(|t| !t.skip) {
            symbols.add(&token.name);
        }
        symbols.add(EOF);

        let start = symbols
            .idx(&spec.start)
            .unwrap_or_else(|| unreachable!("start rule interned above"));

        let start_type = result_types
            .get(spec.start.as_str())
            .copied()
            .unwrap_or_default();
        let mut prods = vec![Prod {
            lhs: 0,
            rhs: vec![start],
        }];
        let mut actions = vec![ActionCode {
            code: "$0".to_owned(),
            result_type: start_type.to_owned(),
        }];
        for rule in &spec.rules {
            let lhs = symbols
                .idx(&rule.name)
                .unwrap_or_else(|| unreachable!("rule name interned above"));
            let rhs = if rule.symbols.len() == 1 && rule.symbols[0] == EPSILON {
                Vec::new()
            } else {
                rule.symbols
                    .iter()
                    .map(|s| {
                        symbols
                            .idx(s)
                            .unwrap_or_else(|| unreachable!("rhs symbol validated above"))
                    })
                    .collect()
            };
            prods.push(Prod { lhs, rhs });
            actions.push(ActionCode {
                code: rule.code.clone(),
                result_type: rule.result_type.clone(),
            });
        }

        let mut prods_by_lhs = vec![Vec::new(); n_nonterminals];
        for (i, prod) in prods.iter().enumerate() {
            prods_by_lhs[prod.lhs].push(i);
        }

        Ok(Self {
            symbols,
            n_nonterminals,
            start,
            prods,
            actions,
            prods_by_lhs,
            tokens: spec.tokens.clone(),
        })
    }

    #[inline]
    pub fn n_symbols(&self) -> usize {
        self.symbols.len()
    }

    /// Symbol id of the end-of-input terminal (always the last column).
    #[inline]
    pub fn eof(&self) -> usize {
        self.symbols.len() - 1
    }

    #[inline]
    pub fn is_terminal(&self, sym: usize) -> bool {
        sym >= self.n_nonterminals
    }

    pub fn name(&self, sym: usize) -> &str {
        self.symbols.name(sym)
    }

    /// The token table for the runtime lexer, in declaration order so the
    /// first declared pattern wins ties. Skip tokens carry no terminal id.
    pub fn lexicon(&self) -> Vec<TokenDef> {
        self.tokens
            .iter()
            .map(|t| TokenDef {
                name: t.name.as_str().into(),
                pattern: t.pattern.as_str().into(),
                terminal: if t.skip { None } else { self.symbols.idx(&t.name) },
            })
            .collect()
    }

    /// Renders production `i` for diagnostics: `name -> a b c`.
    pub fn display_prod(&self, i: usize) -> String {
        let prod = &self.prods[i];
        let rhs = if prod.rhs.is_empty() {
            EPSILON.to_owned()
        } else {
            prod.rhs
                .iter()
                .map(|&s| self.name(s))
                .collect::<Vec<_>>()
                .join(" ")
        };
        format!("{} -> {}", self.name(prod.lhs), rhs)
    }
}

fn validate_tokens(tokens: &[TokenSpec]) -> Result<(), CompileError> {
    let mut seen: HashMap<&str, ()> = HashMap::new();
    for token in tokens {
        if token.name.starts_with('!') || token.name == "EOF" {
            return Err(CompileError::ReservedName {
                name: token.name.clone(),
            });
        }
        if !is_ident(&token.name) {
            return Err(CompileError::InvalidName {
                name: token.name.clone(),
            });
        }
        if seen.insert(token.name.as_str(), ()).is_some() {
            return Err(CompileError::DuplicateToken {
                name: token.name.clone(),
            });
        }
        let re = match regex::bytes::Regex::new(&token.pattern) {
            Ok(re) => re,
            Err(source) => {
                return Err(CompileError::BadPattern {
                    name: token.name.clone(),
                    source,
                });
            }
        };
        // A pattern accepting the empty string would make the lexer loop
        // without consuming input; see Lexer::try_match.
        if re.is_match(b"") {
            return Err(CompileError::EmptyMatchPattern {
                name: token.name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> GrammarSpec {
        GrammarSpec {
            tokens: vec![
                TokenSpec::skipped("ws", "[ \\t\\n]+"),
                TokenSpec::new("x", "x"),
            ],
            rules: vec![
                RuleSpec::new("list", &["item", "list"], "$1 + 1", "usize"),
                RuleSpec::new("list", &[EPSILON], "0", "usize"),
                RuleSpec::new("item", &["x"], "()", "usize"),
            ],
            start: "list".to_owned(),
        }
    }

    #[test]
    fn interns_nonterminals_before_terminals() {
        let grammar = Grammar::try_new(&spec()).unwrap();
        assert_eq!(grammar.name(0), START);
        assert_eq!(grammar.n_nonterminals, 3); // !Start, list, item
        assert_eq!(grammar.name(grammar.eof()), EOF);
        assert!(grammar.is_terminal(grammar.symbols.idx("x").unwrap()));
        // synthetic wrapper first
        assert_eq!(grammar.prods[0].rhs, vec![grammar.start]);
    }

    #[test]
    fn epsilon_production_has_empty_rhs() {
        let grammar = Grammar::try_new(&spec()).unwrap();
        assert!(grammar.prods.iter().any(|p| p.rhs.is_empty()));
        assert_eq!(grammar.display_prod(2), "list -> !EPSILON");
    }

    #[test]
    fn skip_tokens_are_not_terminals() {
        let grammar = Grammar::try_new(&spec()).unwrap();
        assert_eq!(grammar.symbols.idx("ws"), None);
        let lexicon = grammar.lexicon();
        assert_eq!(lexicon[0].terminal, None);
        assert!(lexicon[1].terminal.is_some());
    }

    #[test]
    fn undefined_symbol_is_rejected() {
        let mut s = spec();
        s.rules.push(RuleSpec::new("item", &["missing"], "()", "usize"));
        assert!(matches!(
            Grammar::try_new(&s),
            Err(CompileError::UndefinedSymbol { ref symbol, .. }) if symbol == "missing"
        ));
    }

    #[test]
    fn skipped_tokens_cannot_be_referenced() {
        let mut s = spec();
        s.rules.push(RuleSpec::new("item", &["ws"], "()", "usize"));
        assert!(matches!(
            Grammar::try_new(&s),
            Err(CompileError::UndefinedSymbol { .. })
        ));
    }

    #[test]
    fn missing_start_rule_is_rejected() {
        let mut s = spec();
        s.start = "nothing".to_owned();
        assert!(matches!(
            Grammar::try_new(&s),
            Err(CompileError::MissingStartRule { .. })
        ));
    }

    #[test]
    fn inconsistent_result_types_are_rejected() {
        let mut s = spec();
        s.rules.push(RuleSpec::new("list", &["x"], "1", "i64"));
        assert!(matches!(
            Grammar::try_new(&s),
            Err(CompileError::InconsistentReturnType { .. })
        ));
    }

    #[test]
    fn empty_actions_are_rejected() {
        let mut s = spec();
        s.rules[0].code = "  ".to_owned();
        assert!(matches!(
            Grammar::try_new(&s),
            Err(CompileError::EmptyAction { .. })
        ));
    }

    #[test]
    fn reserved_and_duplicate_names_are_rejected() {
        let mut s = spec();
        s.tokens.push(TokenSpec::new("x", "y"));
        assert!(matches!(
            Grammar::try_new(&s),
            Err(CompileError::DuplicateToken { .. })
        ));

        let mut s = spec();
        s.tokens.push(TokenSpec::new("!EOF", "z"));
        assert!(matches!(
            Grammar::try_new(&s),
            Err(CompileError::ReservedName { .. })
        ));

        let mut s = spec();
        s.rules.push(RuleSpec::new("x", &["x"], "()", "usize"));
        assert!(matches!(
            Grammar::try_new(&s),
            Err(CompileError::SymbolCollision { .. })
        ));
    }

    #[test]
    fn empty_matching_patterns_are_rejected() {
        // `x*` accepts the empty string, which the lexer cannot make
        // progress on, so validation has to refuse it up front.
        let mut s = spec();
        s.tokens.push(TokenSpec::skipped("maybe", "x*"));
        assert!(matches!(
            Grammar::try_new(&s),
            Err(CompileError::EmptyMatchPattern { ref name }) if name == "maybe"
        ));

        let mut s = spec();
        s.tokens.push(TokenSpec::new("opt", "(ab)?"));
        assert!(matches!(
            Grammar::try_new(&s),
            Err(CompileError::EmptyMatchPattern { .. })
        ));
    }

    #[test]
    fn keyword_rule_names_are_rejected() {
        for keyword in ["token", "skip", "start"] {
            let mut s = spec();
            s.rules.push(RuleSpec::new(keyword, &["x"], "()", "usize"));
            assert!(matches!(
                Grammar::try_new(&s),
                Err(CompileError::ReservedName { ref name }) if name == keyword
            ));
        }
    }

    #[test]
    fn non_identifier_names_are_rejected() {
        let mut s = spec();
        s.tokens.push(TokenSpec::new("->", "z"));
        assert!(matches!(
            Grammar::try_new(&s),
            Err(CompileError::InvalidName { .. })
        ));

        let mut s = spec();
        s.rules.push(RuleSpec::new("a+b", &["x"], "()", "usize"));
        assert!(matches!(
            Grammar::try_new(&s),
            Err(CompileError::InvalidName { .. })
        ));
    }

    #[test]
    fn bad_patterns_are_rejected() {
        let mut s = spec();
        s.tokens.push(TokenSpec::new("broken", "(unclosed"));
        assert!(matches!(
            Grammar::try_new(&s),
            Err(CompileError::BadPattern { .. })
        ));
    }

    #[test]
    fn misplaced_epsilon_is_rejected() {
        let mut s = spec();
        s.rules.push(RuleSpec::new("item", &["x", EPSILON], "()", "usize"));
        assert!(matches!(
            Grammar::try_new(&s),
            Err(CompileError::EpsilonPlacement { .. })
        ));
    }
}
