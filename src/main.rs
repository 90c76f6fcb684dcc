use clap::{Parser, Subcommand};
use cnf_norm::{Grammar, GrammarSchema, language, normalize};
use std::fs;
use std::path::PathBuf;

/// Context-free grammar to Chomsky Normal Form converter
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the grammar file
    #[arg(help = "Path to the grammar file (.json description or rule-per-line text)")]
    grammar_file: Option<PathBuf>,

    /// The start variable
    #[arg(help = "Start variable")]
    start_variable: Option<String>,

    /// Number of random strings to draw from the converted grammar
    #[arg(long, default_value = "0")]
    samples: usize,

    /// Expansion depth bound used when sampling
    #[arg(long, default_value = "32")]
    max_depth: usize,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an example grammar file
    Example {
        /// Output file path
        #[arg(help = "Output file path")]
        output: Option<PathBuf>,
    },
}

const EXAMPLE_GRAMMAR: &str = "# balanced pairs: a^n b^n\nS -> a S b | ε\n";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Commands::Example { output }) = cli.command {
        let output_path = output.unwrap_or_else(|| PathBuf::from("example_grammar.txt"));
        fs::write(&output_path, EXAMPLE_GRAMMAR)?;
        println!("Created example grammar at: {}", output_path.display());
        return Ok(());
    }

    let grammar_file = cli.grammar_file.ok_or("Grammar file path required")?;

    println!("Loading grammar from {}...", grammar_file.display());
    let mut grammar = load_grammar(&grammar_file, cli.start_variable.as_deref())?;

    println!("Loaded {} rules.\n", grammar.rule_count());
    println!("Input grammar:\n{}\n", grammar);

    normalize::to_cnf(&mut grammar);
    println!("Chomsky Normal Form:\n{}", grammar);

    if cli.samples > 0 {
        println!("\nSampling {} strings:", cli.samples);
        let mut rng = rand::thread_rng();
        for i in 1..=cli.samples {
            match language::sample(&grammar, &mut rng, cli.max_depth) {
                Some(text) if text.is_empty() => println!("{}. ε", i),
                Some(text) => println!("{}. {}", i, text),
                None => println!("{}. (depth limit reached)", i),
            }
        }
    }

    Ok(())
}

fn load_grammar(
    path: &PathBuf,
    start_variable: Option<&str>,
) -> Result<Grammar, Box<dyn std::error::Error>> {
    if path.extension().is_some_and(|extension| extension == "json") {
        let schema = GrammarSchema::from_file(path)?;
        if let Some(start) = start_variable {
            if start != schema.start_variable {
                return Err(format!(
                    "start variable {} does not match the description's {}",
                    start, schema.start_variable
                )
                .into());
            }
        }
        Ok(schema.into_grammar()?)
    } else {
        let start = start_variable.ok_or("Start variable required for text grammars")?;
        Ok(Grammar::from_file(path, start)?)
    }
}
