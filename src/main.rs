//! Command-line front end: runs FIND and CHECK commands against a bundled model

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use relfind::instance::Bounds;
use relfind::model::Model;
use relfind::models;
use relfind::report::Report;
use relfind::solver::{Budget, Command, Options, Solver};

/// Exit code for definition errors found before search
const EXIT_LOAD_ERROR: u8 = 2;

#[derive(Parser)]
#[command(name = "relfind")]
#[command(about = "Bounded relational model finder")]
#[command(version)]
struct Cli {
    /// Bundled model to load
    #[arg(long, global = true, default_value = "rar")]
    model: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SearchArgs {
    /// Upper bound for a type, as `Type=N` (repeatable)
    #[arg(long = "scope", value_parser = parse_bound)]
    scopes: Vec<(String, i64)>,

    /// Exact atom count for a type, as `Type=N` (repeatable)
    #[arg(long = "exact", value_parser = parse_bound)]
    exact: Vec<(String, i64)>,

    /// Bound for types not given a scope
    #[arg(long)]
    default_scope: Option<i64>,

    /// Number of integer atoms (values 0..N-1)
    #[arg(long)]
    int_scope: Option<i64>,

    /// Give up after exploring this many search nodes
    #[arg(long)]
    max_nodes: Option<u64>,

    /// Give up after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Worker threads (1 gives deterministic witnesses)
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Print the report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Find an instance satisfying the facts and a predicate
    Find {
        /// Predicate name
        predicate: String,
        #[command(flatten)]
        args: SearchArgs,
    },
    /// Search for a counterexample to an assertion
    Check {
        /// Assertion name
        assertion: String,
        #[command(flatten)]
        args: SearchArgs,
    },
    /// List the model's types, relations and constraints
    List,
}

fn parse_bound(s: &str) -> Result<(String, i64), String> {
    let (name, count) = s
        .split_once('=')
        .ok_or_else(|| format!("expected `Type=N`, got `{s}`"))?;
    let count = count
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid count in `{s}`: {e}"))?;
    Ok((name.trim().to_string(), count))
}

impl SearchArgs {
    fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::new();
        if let Some(n) = self.default_scope {
            bounds = bounds.with_default(n);
        }
        if let Some(n) = self.int_scope {
            bounds = bounds.int_scope(n);
        }
        for (name, n) in &self.scopes {
            bounds = bounds.bound(name, *n);
        }
        for (name, n) in &self.exact {
            bounds = bounds.exactly(name, *n);
        }
        bounds
    }

    fn options(&self) -> Options {
        Options {
            budget: Budget {
                max_nodes: self.max_nodes,
                timeout_ms: self.timeout_ms,
            },
            threads: self.threads.max(1),
            ..Options::default()
        }
    }
}

fn run(model: &Model, command: Command, args: &SearchArgs) -> ExitCode {
    let solver = Solver::new(args.options());
    let solution = match solver.solve(model, &command, &args.bounds()) {
        Ok(solution) => solution,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(EXIT_LOAD_ERROR);
        }
    };

    let report = Report::new(model, &command, &solution);
    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: cannot serialize report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{report}");
    }
    ExitCode::from(report.exit_code())
}

fn list(model: &Model) {
    let schema = model.schema();
    println!("types:");
    for id in schema.sig_ids() {
        let sig = schema.sig(id);
        if sig.is_builtin() {
            continue;
        }
        let mut line = format!("  {}", sig.name());
        if sig.is_abstract() {
            line = format!("  abstract {}", sig.name());
        } else if sig.is_one() {
            line = format!("  one {}", sig.name());
        }
        if let Some(parent) = sig.parent() {
            line.push_str(&format!(" extends {}", schema.sig(parent).name()));
        }
        println!("{line}");
    }
    println!("relations:");
    for id in schema.field_ids() {
        let field = schema.field(id);
        println!(
            "  {}: {} -> {} {}",
            field.name(),
            schema.sig(field.source()).name(),
            field.multiplicity(),
            schema.sig(field.target()).name()
        );
    }
    println!("constraints:");
    for constraint in model.constraints() {
        println!("  {} {}", constraint.kind(), constraint.name());
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let model = match models::by_name(&cli.model) {
        Some(Ok(model)) => model,
        Some(Err(e)) => {
            eprintln!("error: {e}");
            return ExitCode::from(EXIT_LOAD_ERROR);
        }
        None => {
            eprintln!(
                "error: unknown model `{}` (available: {})",
                cli.model,
                models::MODELS.join(", ")
            );
            return ExitCode::from(EXIT_LOAD_ERROR);
        }
    };

    match cli.command {
        Commands::Find { predicate, args } => run(&model, Command::Find(predicate), &args),
        Commands::Check { assertion, args } => run(&model, Command::Check(assertion), &args),
        Commands::List => {
            list(&model);
            ExitCode::SUCCESS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bounds() {
        assert_eq!(parse_bound("Processor=2"), Ok(("Processor".to_string(), 2)));
        assert_eq!(parse_bound(" RAR = 0 "), Ok(("RAR".to_string(), 0)));
        assert!(parse_bound("Processor").is_err());
        assert!(parse_bound("Processor=x").is_err());
    }

    #[test]
    fn cli_builds_options() {
        let cli = Cli::try_parse_from([
            "relfind",
            "check",
            "noRarTargetsInit",
            "--scope",
            "Processor=2",
            "--scope",
            "RAR=2",
            "--max-nodes",
            "1000",
            "--threads",
            "0",
        ])
        .unwrap();
        let Commands::Check { assertion, args } = cli.command else {
            panic!("expected check");
        };
        assert_eq!(assertion, "noRarTargetsInit");
        assert_eq!(args.scopes.len(), 2);
        let options = args.options();
        assert_eq!(options.threads, 1);
        assert_eq!(options.budget.max_nodes, Some(1000));
        assert!(options.early_pruning);
    }

    #[test]
    fn empty_scope_is_a_load_error() {
        let model = models::rar_model().unwrap();
        let cli = Cli::try_parse_from(["relfind", "check", "enabledImpliesInterruptible", "--scope", "Bool=1"])
            .unwrap();
        let Commands::Check { assertion, args } = cli.command else {
            panic!("expected check");
        };
        let result = Solver::new(args.options()).solve(&model, &Command::Check(assertion), &args.bounds());
        assert!(matches!(result, Err(relfind::ModelError::ScopeExceeded { ref name, .. }) if name == "Bool"));
        let code = run(&model, Command::Check("enabledImpliesInterruptible".to_string()), &args);
        assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::from(EXIT_LOAD_ERROR)));
    }
}
