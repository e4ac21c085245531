use chemcore::prelude::*;
use clap::{Parser, Subcommand};
use std::env;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::Registry;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the canonical SMILES of each input
    Canon {
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Print the Morgan fingerprint of a molecule as a bit string
    Fp {
        #[arg(short, long, default_value_t = 2)]
        radius: u32,
        #[arg(short, long, default_value_t = 2048)]
        bits: usize,
        input: String,
    },
    /// Check if a SMARTS query matches a molecule, and print the atom mapping
    Match {
        #[arg(long)]
        max_steps: Option<u64>,
        #[arg(long)]
        timeout_ms: Option<u64>,
        smiles: String,
        smarts: String,
    },
    /// Report whether each input is valid
    Check {
        #[arg(required = true)]
        inputs: Vec<String>,
    },
}

fn init_tracing() {
    let targets = match env::var("RUST_LOG") {
        Ok(name) => Targets::from_str(&name).unwrap_or_else(|e| {
            eprintln!("Error in RUST_LOG environment variable: {e}");
            Targets::new().with_default(LevelFilter::ERROR)
        }),
        Err(env::VarError::NotPresent) => Targets::new().with_default(LevelFilter::ERROR),
        Err(env::VarError::NotUnicode(_)) => {
            eprintln!("Error in RUST_LOG environment variable: not valid UTF-8");
            Targets::new().with_default(LevelFilter::ERROR)
        }
    };
    Registry::default()
        .with(targets)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let mut ok = true;
    match cli.command {
        Command::Canon { inputs } => {
            for input in inputs {
                match SmilesParser::new(&input).parse() {
                    Ok(mol) => println!("{}", generate_smiles(&mol, SmilesConfig::new())),
                    Err(err) => {
                        tracing::error!("{err}");
                        ok = false;
                    }
                }
            }
        }
        Command::Fp {
            radius,
            bits,
            input,
        } => match SmilesParser::new(&input).parse() {
            Ok(mol) => {
                let cfg = FingerprintConfig::new().with_radius(radius).with_bits(bits);
                println!("{}", morgan_fingerprint(&mol, cfg));
            }
            Err(err) => {
                tracing::error!("{err}");
                ok = false;
            }
        },
        Command::Match {
            max_steps,
            timeout_ms,
            smiles,
            smarts,
        } => {
            let mol = match SmilesParser::new(&smiles).parse() {
                Ok(mol) => mol,
                Err(err) => {
                    tracing::error!("{err}");
                    return ExitCode::FAILURE;
                }
            };
            let query = match SmartsParser::new(&smarts).parse() {
                Ok(query) => query,
                Err(err) => {
                    tracing::error!("{err}");
                    return ExitCode::FAILURE;
                }
            };
            let mut budget = SearchBudget::unlimited();
            if let Some(steps) = max_steps {
                budget = budget.with_max_steps(steps);
            }
            if let Some(ms) = timeout_ms {
                budget = budget.with_timeout(Duration::from_millis(ms));
            }
            match substruct_match(&mol, &query, budget) {
                Ok(Some(m)) => {
                    let pairs = m
                        .atoms
                        .iter()
                        .map(|(q, t)| format!("{}->{}", q.index(), t.index()))
                        .collect::<Vec<_>>();
                    println!("match {}", pairs.join(" "));
                }
                Ok(None) => {
                    println!("no match");
                    ok = false;
                }
                Err(err) => {
                    tracing::error!("{err}");
                    ok = false;
                }
            }
        }
        Command::Check { inputs } => {
            for input in inputs {
                let mol = parse(&input);
                match mol.error() {
                    None => println!("{input}: valid"),
                    Some(err) => {
                        println!("{input}: invalid ({:?}): {}", err.category(), err.kind);
                        ok = false;
                    }
                }
            }
        }
    }
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
