//! Evaluates the expression given on the command line.

use anyhow::{bail, Result};

fn main() -> Result<()> {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        bail!("usage: lalrc-calc EXPRESSION");
    }
    println!("{}", lalrc_calc::eval(&args.join(" "))?);
    Ok(())
}
