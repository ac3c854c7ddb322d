use std::{sync::Arc, time::Duration};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use lobby_core::{
    grid::{generate_grid_with, MAX_GRID_SIZE, MIN_GRID_SIZE},
    validator::normalize,
    WordValidator,
};
use rand::{rngs::StdRng, SeedableRng};
use service_clients::{DictionaryApiClient, DEFAULT_DICTIONARY_URL};
use shared::domain::Grid;

#[derive(Parser, Debug)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a letter grid drawn from the same distribution the server uses.
    GenerateGrid {
        #[arg(long, default_value_t = 5)]
        size: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Ask the dictionary service about one or more words.
    CheckWord {
        #[arg(required = true)]
        words: Vec<String>,
        #[arg(long, default_value = DEFAULT_DICTIONARY_URL)]
        dictionary_url: String,
        #[arg(long, default_value_t = 5000)]
        timeout_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateGrid { size, seed } => {
            if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&size) {
                bail!("grid size must be between {MIN_GRID_SIZE} and {MAX_GRID_SIZE}");
            }
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            print!("{}", render_grid(&generate_grid_with(size, &mut rng)));
        }
        Command::CheckWord {
            words,
            dictionary_url,
            timeout_ms,
        } => {
            let timeout = Duration::from_millis(timeout_ms);
            let dictionary = DictionaryApiClient::new(&dictionary_url, timeout)?;
            let validator = WordValidator::new(Arc::new(dictionary)).with_timeout(timeout);
            for word in words {
                let verdict = if validator.is_valid(&word).await {
                    "valid"
                } else {
                    "invalid"
                };
                println!("{}\t{verdict}", normalize(&word));
            }
        }
    }

    Ok(())
}

fn render_grid(grid: &Grid) -> String {
    grid.iter()
        .map(|row| {
            let cells: Vec<String> = row.iter().map(char::to_string).collect();
            format!("{}\n", cells.join(" "))
        })
        .collect()
}
