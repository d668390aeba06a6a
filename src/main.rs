use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use gridgen::cbic::{
    build_grid, build_grid_quiet, BuildConfig, BuildEvent, BuildObserver, SupportLetters,
    DEFAULT_CENTRAL_WORD, DEFAULT_MAX_ROUNDS,
};
use gridgen::gaddag::Gaddag;

/// Generates a Scrabble coaching grid: every review word is placed so that it
/// connects back to the central word through real intersections.
#[derive(Parser)]
#[command(name = "gridgen")]
struct Args {
    /// Dictionary file, one word per line
    #[arg(long)]
    dictionary: PathBuf,

    /// Review list as JSON: [{"word": "CHAT", "support": {"T": 3}}, ...]
    #[arg(long)]
    words: PathBuf,

    /// Seed word written to the centre of the empty board
    #[arg(long, default_value = DEFAULT_CENTRAL_WORD)]
    central: String,

    /// Construction round budget
    #[arg(long, default_value_t = DEFAULT_MAX_ROUNDS)]
    max_rounds: usize,

    /// Compact the automaton after loading the dictionary
    #[arg(long)]
    minimize: bool,

    /// Print each construction step
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Deserialize)]
struct ReviewWord {
    word: String,
    /// Practice letter -> index within the word
    #[serde(default)]
    support: HashMap<char, usize>,
}

struct PrintObserver;

impl BuildObserver for PrintObserver {
    fn notify(&mut self, event: BuildEvent<'_>) {
        match event {
            BuildEvent::CentralPlaced { word, pos } => {
                println!("central word '{}' at ({}, {})", word, pos.row, pos.col);
            }
            BuildEvent::PlacementApplied { round, placement } => {
                println!(
                    "round {}: '{}' at ({}, {}) {:?}, score {:.1}",
                    round,
                    placement.word,
                    placement.pos.row,
                    placement.pos.col,
                    placement.dir,
                    placement.score
                );
            }
            BuildEvent::WordsUnplaced { words } => {
                println!("no legal placement left for: {:?}", words);
            }
            BuildEvent::RoundLimitReached { max_rounds } => {
                println!("round budget exhausted ({})", max_rounds);
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut gaddag = Gaddag::new();
    let loaded = gaddag.load_dictionary(&args.dictionary)?;
    if args.minimize {
        gaddag.semi_minimize();
    }
    let stats = gaddag.statistics();
    println!(
        "loaded {} words ({} nodes, {} transitions)",
        loaded, stats.node_count, stats.transition_count
    );

    let raw = fs::read_to_string(&args.words)
        .with_context(|| format!("review list not found: {}", args.words.display()))?;
    let review: Vec<ReviewWord> = serde_json::from_str(&raw)
        .with_context(|| format!("malformed review list: {}", args.words.display()))?;

    let words: Vec<String> = review.iter().map(|r| r.word.clone()).collect();
    let support: SupportLetters = review
        .iter()
        .filter(|r| !r.support.is_empty())
        .map(|r| {
            let letters = r
                .support
                .iter()
                .map(|(&letter, &index)| (letter.to_ascii_uppercase(), index))
                .collect();
            (r.word.clone(), letters)
        })
        .collect();

    let config = BuildConfig {
        central_word: args.central,
        max_rounds: args.max_rounds,
    };
    let mut result = if args.verbose {
        build_grid(&words, &gaddag, &support, &config, &mut PrintObserver)
    } else {
        build_grid_quiet(&words, &gaddag, &support, &config)
    };

    println!("\n{}", result.board);
    println!(
        "placed {}/{} words in {} rounds{}",
        result.placed.len(),
        words.len() + 1,
        result.rounds,
        if result.capped { " (budget hit)" } else { "" }
    );

    let central = result.graph.central().unwrap_or_default().to_string();
    for word in result.placed.clone() {
        if word == central {
            continue;
        }
        match result.graph.distance(&central, &word) {
            Some(hops) => println!("  {}: {} hop(s) from {}", word, hops, central),
            None => println!("  {}: placed", word),
        }
    }
    for report in result.graph.unconnected_words() {
        println!("  {}: NOT PLACED", report.word);
    }

    Ok(())
}
