//! LALR(1) grammar compiler.
//!
//! Turns a grammar description into the [`ParseTables`] executed by the
//! `lalrc` runtime engine. The pipeline is fixed:
//!
//! 1. [`grammar`]: validate and intern the description;
//! 2. [`automaton`]: build the LR(0) item-set automaton;
//! 3. [`extend`]: re-express productions as per-state instances;
//! 4. [`sets`]: FIRST per symbol, FOLLOW per instance group;
//! 5. [`table`]: fill ACTION/GOTO, rejecting conflicts.
//!
//! [`compile`] runs the whole pipeline; [`generate`] additionally renders
//! the result as a Rust module. Stage banners log at `debug`, full
//! structure dumps at `trace`.

pub mod automaton;
pub mod error;
pub mod extend;
pub mod generate;
pub mod grammar;
pub mod input;
pub mod sets;
pub mod symtab;
pub mod table;

pub use error::CompileError;
pub use generate::generate;
pub use grammar::{Grammar, GrammarSpec, RuleSpec, TokenSpec};
pub use input::parse_grammar;

use extend::ExtendedRule;
use lalrc::ParseTables;
use sets::{FirstSets, FollowSets};

/// Everything the pipeline produces, kept together so the emitter and the
/// trace dumps can render any stage.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub grammar: Grammar,
    pub automaton: automaton::Automaton,
    pub extended: Vec<ExtendedRule>,
    pub firsts: FirstSets,
    pub follows: FollowSets,
    pub tables: ParseTables,
}

/// Compiles a validated-or-rejected grammar description to parse tables.
pub fn compile(spec: &GrammarSpec) -> Result<Compiled, CompileError> {
    let grammar = Grammar::try_new(spec)?;
    log::debug!(
        "grammar: {} productions, {} nonterminals, {} symbols",
        grammar.prods.len(),
        grammar.n_nonterminals,
        grammar.n_symbols()
    );

    let automaton = automaton::build(&grammar);
    log::debug!("automaton: {} states", automaton.states.len());
    trace_dump(|out| automaton::write_states(out, &grammar, &automaton));

    let extended = extend::extend(&grammar, &automaton);
    log::debug!("extended grammar: {} instances", extended.len());
    trace_dump(|out| extend::write_extended(out, &grammar, &extended));

    let firsts = sets::first_sets(&grammar);
    trace_dump(|out| sets::write_first(out, &grammar, &firsts));

    let follows = sets::follow_sets(&grammar, &extended, &firsts);
    log::debug!("follow: {} instance groups", follows.follow.len());
    trace_dump(|out| sets::write_follow(out, &grammar, &follows));

    let tables = table::build(&grammar, &automaton, &extended, &follows)?;
    log::debug!(
        "tables: {} states x {} symbols",
        tables.n_states(),
        tables.symbols.len()
    );
    trace_dump(|out| table::write_table(out, &tables));

    Ok(Compiled {
        grammar,
        automaton,
        extended,
        firsts,
        follows,
        tables,
    })
}

/// Parses the textual grammar format, then compiles it.
pub fn compile_str(text: &str) -> Result<Compiled, CompileError> {
    compile(&input::parse_grammar(text)?)
}

fn trace_dump(write: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>) {
    if log::log_enabled!(log::Level::Trace) {
        let mut buf = Vec::new();
        if write(&mut buf).is_ok() {
            log::trace!("\n{}", String::from_utf8_lossy(&buf));
        }
    }
}
