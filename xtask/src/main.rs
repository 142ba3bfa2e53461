use xshell::{Cmd, Shell};

/// Feature combinations which must each pass the test suite, since the `sync` feature swaps
/// out the registry's interior mutability.
const FEATURE_SETS: &[&str] = &["--no-default-features", "--features=std", "--features=sync"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sh = &Shell::new()?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(|s| &**s).collect();
    match *args {
        ["test"] => {
            for features in FEATURE_SETS {
                cargo(sh).args(["test", features]).run()?;
            }
            lint(sh)?;
        }
        ["lint"] => lint(sh)?,
        _ => {
            return Err(format!("invalid arguments: {args:?}; expected `test` or `lint`").into());
        }
    }

    Ok(())
}

fn lint(sh: &Shell) -> Result<(), xshell::Error> {
    cargo(sh).args(["clippy", "--all-features", "--all-targets"]).run()?;
    cargo(sh).args(["doc", "--all-features", "--no-deps"]).run()
}

fn cargo(sh: &Shell) -> Cmd<'_> {
    sh.cmd(std::env::var("CARGO").unwrap_or_else(|_| String::from("cargo")))
}
