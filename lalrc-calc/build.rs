use std::path::PathBuf;

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());

    let grammar = PathBuf::from(&manifest_dir).join("src/calc.g");
    println!("cargo:rerun-if-changed={}", grammar.display());
    lalrc_gen::generate(grammar, out_dir.join("calc.rs")).unwrap();
}
