// ==============================================================================
// CLI for the Avro Syntax Tree Parser
// ==============================================================================
//
//   avro-cst [--json] [--sexp] [PATH...]
//
// Parses each input (a file, every `.avsc`/`.avdl` file below a directory, or
// stdin for `-` or no paths at all), prints the requested tree dumps to stdout
// and reports syntax errors on stderr. Exits non-zero when any input has one.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Read as _, Write as _};
use std::path::{Path, PathBuf};

use miette::{Context, IntoDiagnostic};

use avro_cst::{diagnostics, parse};

const USAGE: &str = "\
Usage: avro-cst [--json] [--sexp] [PATH...]

Parse Avro schema (.avsc) and Avro IDL (.avdl) files and report syntax errors.
Directories are searched recursively; `-` or no paths reads stdin.

Options:
      --sexp     Print each tree as an S-expression
      --json     Print each tree as JSON
  -h, --help     Print this help
  -V, --version  Print the version
";

// ==============================================================================
// CLI Argument Definitions
// ==============================================================================

#[derive(Debug, Default)]
struct Args {
    json: bool,
    sexp: bool,
    inputs: Vec<Input>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Stdin,
    Path(PathBuf),
}

enum Command {
    Run(Args),
    Help,
    Version,
}

fn parse_args(raw: impl IntoIterator<Item = OsString>) -> Result<Command, lexopt::Error> {
    use lexopt::prelude::*;

    let mut args = Args::default();
    let mut parser = lexopt::Parser::from_args(raw);
    while let Some(arg) = parser.next()? {
        match arg {
            Long("json") => args.json = true,
            Long("sexp") => args.sexp = true,
            Short('h') | Long("help") => return Ok(Command::Help),
            Short('V') | Long("version") => return Ok(Command::Version),
            Value(value) if value == "-" => args.inputs.push(Input::Stdin),
            Value(value) => args.inputs.push(Input::Path(PathBuf::from(value))),
            _ => return Err(arg.unexpected()),
        }
    }
    if args.inputs.is_empty() {
        args.inputs.push(Input::Stdin);
    }
    Ok(Command::Run(args))
}

// ==============================================================================
// Entry Point
// ==============================================================================

fn main() -> miette::Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::new().build())
    }))?;

    let args = match parse_args(std::env::args_os().skip(1)).into_diagnostic()? {
        Command::Run(args) => args,
        Command::Help => return write_stdout(USAGE),
        Command::Version => {
            return write_stdout(&format!("avro-cst {}\n", env!("CARGO_PKG_VERSION")));
        }
    };

    let mut failed = 0;
    for (name, source) in read_inputs(&args.inputs)? {
        if !run_one(&args, &name, &source)? {
            failed += 1;
        }
    }
    if failed > 0 {
        let files = if failed == 1 { "input" } else { "inputs" };
        miette::bail!("{failed} {files} had syntax errors");
    }
    Ok(())
}

/// Parse one input, print its dumps and report its errors. Returns whether the
/// input was free of syntax errors.
fn run_one(args: &Args, name: &str, source: &str) -> miette::Result<bool> {
    let tree = parse(source);
    tracing::debug!(name, bytes = source.len(), has_error = tree.has_error(), "parsed input");

    let mut out = String::new();
    if args.sexp {
        out.push_str(&tree.to_sexp());
        out.push('\n');
    }
    if args.json {
        let json = serde_json::to_string_pretty(&tree.to_json(source)).into_diagnostic()?;
        out.push_str(&json);
        out.push('\n');
    }
    write_stdout(&out)?;

    let found = diagnostics(&tree, name, source);
    let clean = found.is_empty();
    for diagnostic in found {
        eprintln!("{:?}", miette::Report::new(diagnostic));
    }
    Ok(clean)
}

// ==============================================================================
// Input and Output
// ==============================================================================

/// Read every input as `(display name, text)`, expanding directories into
/// the schema files below them in file-name order.
fn read_inputs(inputs: &[Input]) -> miette::Result<Vec<(String, String)>> {
    let mut sources = Vec::new();
    for input in inputs {
        match input {
            Input::Stdin => {
                let mut source = String::new();
                io::stdin()
                    .read_to_string(&mut source)
                    .into_diagnostic()
                    .wrap_err("read from stdin")?;
                sources.push(("<stdin>".to_string(), source));
            }
            Input::Path(path) if path.is_dir() => {
                for file in schema_files(path) {
                    sources.push(read_file(&file)?);
                }
            }
            Input::Path(path) => sources.push(read_file(path)?),
        }
    }
    Ok(sources)
}

fn schema_files(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("avsc" | "avdl")
            )
        })
        .collect()
}

fn read_file(path: &Path) -> miette::Result<(String, String)> {
    let source = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("read {}", path.display()))?;
    Ok((path.display().to_string(), source))
}

/// Write to stdout, exiting quietly when the reader has gone away
/// (`avro-cst --sexp big.avdl | head -1`).
fn write_stdout(content: &str) -> miette::Result<()> {
    if content.is_empty() {
        return Ok(());
    }
    let mut stdout = io::stdout().lock();
    match stdout.write_all(content.as_bytes()).and_then(|()| stdout.flush()) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        result => result.into_diagnostic().wrap_err("write to stdout"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> Args {
        match parse_args(args.iter().map(OsString::from)) {
            Ok(Command::Run(args)) => args,
            Ok(_) => panic!("expected a run command for {args:?}"),
            Err(e) => panic!("bad arguments {args:?}: {e}"),
        }
    }

    #[test]
    fn no_paths_reads_stdin() {
        let args = run(&[]);
        assert_eq!(args.inputs, vec![Input::Stdin]);
        assert!(!args.json && !args.sexp);
    }

    #[test]
    fn flags_and_paths() {
        let args = run(&["--sexp", "a.avdl", "-", "--json", "dir"]);
        assert!(args.json && args.sexp);
        assert_eq!(
            args.inputs,
            vec![
                Input::Path(PathBuf::from("a.avdl")),
                Input::Stdin,
                Input::Path(PathBuf::from("dir")),
            ]
        );
    }

    #[test]
    fn help_and_version() {
        let help = parse_args([OsString::from("--help")]).expect("parses");
        assert!(matches!(help, Command::Help));
        let version = parse_args([OsString::from("-V")]).expect("parses");
        assert!(matches!(version, Command::Version));
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(parse_args([OsString::from("--tree")]).is_err());
    }
}
