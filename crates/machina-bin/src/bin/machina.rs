use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::{info, LevelFilter};
use machina::{
    analyze_structure, compile_regex, generate, minimize_dfa, nfa_to_dfa, simplify_nfa, simulate, Automaton,
    DfaTable, ErrorKind, Limits, MachinaError,
};
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "machina", about = "Builds, transforms and analyzes finite automata")]
struct Cli {
    /// Increase logging verbosity, can be repeated
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// JSON file with resource limits, overridden by the flags below
    #[arg(long, global = true)]
    limits: Option<PathBuf>,

    #[arg(long, global = true)]
    max_subset_states: Option<usize>,

    #[arg(long, global = true)]
    max_pair_checks: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a regular expression into an epsilon-NFA
    Regex {
        pattern: String,
        /// Remove the epsilon transitions of the compiled NFA
        #[arg(long)]
        simplify: bool,
    },
    /// Remove epsilon transitions through subset construction
    Simplify(InputArgs),
    /// Convert an NFA into a DFA
    Convert(InputArgs),
    /// Minimize a DFA
    Minimize(InputArgs),
    /// Run a string through an automaton and print the trace
    Simulate {
        #[command(flatten)]
        input: InputArgs,
        #[arg(short = 's', long = "string", default_value = "")]
        test_string: String,
    },
    /// Report unreachable, dead and trap states
    Analyze(InputArgs),
    /// Sample accepted strings and describe the language
    Generate {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        count: Option<usize>,
        #[arg(long)]
        length: Option<usize>,
    },
    /// Validate a DFA and print its transition table
    Table(InputArgs),
    /// Print a structural summary
    Info(InputArgs),
    /// Render an automaton in Graphviz DOT format
    Dot(InputArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Automaton JSON file, read from stdin when omitted
    file: Option<PathBuf>,
}

/// Either a library error kind or a failure outside the library.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
enum FailureKind {
    Io,
    #[serde(untagged)]
    Machina(ErrorKind),
}

impl FailureKind {
    fn of(err: &anyhow::Error) -> FailureKind {
        if let Some(machina_err) = err.downcast_ref::<MachinaError>() {
            FailureKind::Machina(machina_err.kind())
        } else if err.downcast_ref::<serde_json::Error>().is_some() {
            FailureKind::Machina(ErrorKind::Malformed)
        } else {
            FailureKind::Io
        }
    }
}

#[derive(Serialize)]
struct ErrorRecord {
    kind: FailureKind,
    message: String,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorRecord,
}

impl InputArgs {
    fn read(&self) -> anyhow::Result<Automaton> {
        let text = match &self.file {
            Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?,
            None => {
                let mut text = String::new();
                io::stdin().read_to_string(&mut text).context("failed to read stdin")?;
                text
            }
        };
        Ok(Automaton::from_json(&text)?)
    }
}

fn load_limits(cli: &Cli) -> anyhow::Result<Limits> {
    let mut limits: Limits = match &cli.limits {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("invalid limits in {}", path.display()))?
        }
        None => Limits::default(),
    };
    if let Some(max) = cli.max_subset_states {
        limits.max_subset_states = max;
    }
    if let Some(max) = cli.max_pair_checks {
        limits.max_pair_checks = max;
    }
    Ok(limits)
}

fn to_dot(automaton: &Automaton) -> String {
    let mut graph: DiGraph<String, String> = DiGraph::new();
    let mut nodes: Vec<(u32, NodeIndex)> = Vec::with_capacity(automaton.states.len());
    for state in &automaton.states {
        let mut label = state.label.clone();
        if state.is_initial {
            label.insert_str(0, "→ ");
        }
        if state.is_final {
            label.push_str(" ✓");
        }
        nodes.push((state.id, graph.add_node(label)));
    }

    let node = |id: u32| nodes.iter().find(|(state, _)| *state == id).map(|(_, n)| *n);
    for t in &automaton.transitions {
        if let (Some(from), Some(to)) = (node(t.from), node(t.to)) {
            graph.add_edge(from, to, t.label.to_string());
        }
    }

    format!("{}", Dot::new(&graph))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let limits = load_limits(cli)?;

    match &cli.command {
        Commands::Regex { pattern, simplify } => {
            let mut automaton = compile_regex(pattern)?;
            if *simplify {
                automaton = simplify_nfa(&automaton, &limits)?;
            }
            info!("compiled '{}' into {} states", pattern, automaton.states.len());
            print_json(&automaton)
        }
        Commands::Simplify(input) => print_json(&simplify_nfa(&input.read()?, &limits)?),
        Commands::Convert(input) => print_json(&nfa_to_dfa(&input.read()?, &limits)?),
        Commands::Minimize(input) => print_json(&minimize_dfa(&input.read()?, &limits)?),
        Commands::Simulate { input, test_string } => print_json(&simulate(&input.read()?, test_string)?),
        Commands::Analyze(input) => print_json(&analyze_structure(&input.read()?)?),
        Commands::Generate { input, count, length } => {
            print_json(&generate(&input.read()?, *count, *length, &limits)?)
        }
        Commands::Table(input) => print_json(&DfaTable::from_automaton(&input.read()?)?),
        Commands::Info(input) => print_json(&input.read()?.summary()),
        Commands::Dot(input) => {
            println!("{}", to_dot(&input.read()?));
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet {
        LevelFilter::Error
    } else {
        match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let envelope = ErrorEnvelope {
                error: ErrorRecord {
                    kind: FailureKind::of(&err),
                    message: format!("{err:#}"),
                },
            };
            match serde_json::to_string_pretty(&envelope) {
                Ok(text) => println!("{text}"),
                Err(_) => eprintln!("{err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // `name` keeps concurrently running tests off each other's files
    fn limits_from(name: &str, text: &str) -> anyhow::Result<Limits> {
        let path = std::env::temp_dir().join(format!("machina-{}-{}.json", name, std::process::id()));
        fs::write(&path, text)?;
        let cli = Cli::parse_from(["machina", "--limits", path.to_str().unwrap_or_default(), "info"]);
        let result = load_limits(&cli);
        let _ = fs::remove_file(&path);
        result
    }

    #[test]
    fn malformed_limits_file_is_malformed() {
        let err = limits_from("malformed", "{ not json").unwrap_err();
        let kind = FailureKind::of(&err);
        assert_eq!(kind, FailureKind::Machina(ErrorKind::Malformed));
        assert_eq!(serde_json::to_string(&kind).unwrap(), r#""malformed""#);
    }

    #[test]
    fn limits_file_and_flags() {
        let limits = limits_from("partial", r#"{"max_subset_states": 7}"#).unwrap();
        assert_eq!(limits.max_subset_states, 7);
        assert_eq!(limits.generate_count, Limits::default().generate_count);

        let cli = Cli::parse_from(["machina", "--max-pair-checks", "12", "info"]);
        assert_eq!(load_limits(&cli).unwrap().max_pair_checks, 12);
    }

    #[test]
    fn failure_kinds() {
        let missing = anyhow::Error::from(MachinaError::MissingInitial);
        assert_eq!(serde_json::to_string(&FailureKind::of(&missing)).unwrap(), r#""invalid-automaton""#);

        let io = anyhow::Error::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(serde_json::to_string(&FailureKind::of(&io)).unwrap(), r#""io""#);
    }
}
