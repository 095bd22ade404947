//! Command-line interface for the `lalrc` parser generator.
//!
//! Wraps [`lalrc_gen::generate`]: reads a textual grammar description and
//! writes the generated parser module. `--debug` turns on the stage-by-stage
//! trace dumps.

#[cfg(feature = "cli")]
mod real {
    use clap::Parser;
    use std::path::PathBuf;

    #[derive(Parser)]
    #[command(about = "Generate parser code from an LALR(1) grammar")]
    struct Args {
        /// Path to the input grammar file
        #[arg(short = 'g', long)]
        grammar: PathBuf,

        /// Path to the output Rust file
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Enable debug logging (off by default).
        #[arg(short = 'd', long)]
        debug: bool,
    }

    pub fn main() -> anyhow::Result<()> {
        let args = Args::parse();
        env_logger::Builder::from_default_env()
            .filter_level(if args.debug {
                log::LevelFilter::Trace
            } else {
                log::LevelFilter::Info
            })
            .init();
        lalrc_gen::generate(args.grammar, args.output)
    }
}

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    real::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("lalrc disabled (compiled without `cli` feature)");
}
