use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use rayon::prelude::*;

use crate::board::Board;
use crate::gaddag::{is_valid_word, normalize_word, Gaddag};
use crate::graph::{Connection, WordGraph};
use crate::util::{letter_value, Direction, Position};
use crate::BOARD_SIZE;

// Weights of the unified placement score
pub const WEIGHT_BASE_SCORE: f64 = 1.0;
pub const WEIGHT_CROSS_WORDS: f64 = 1.5;
pub const SUPPORT_LETTER_BONUS: f64 = 50.0;
pub const WEIGHT_DENSITY: f64 = 20.0;
pub const WEIGHT_CENTRALITY: f64 = 0.1;
pub const WEIGHT_CONNECTIONS: f64 = 30.0;

pub const DEFAULT_CENTRAL_WORD: &str = "DATAIS";
pub const DEFAULT_MAX_ROUNDS: usize = 1000;

/// Designated practice letters per target word: letter -> index in the word.
pub type SupportLetters = HashMap<String, HashMap<char, usize>>;

/// A candidate placement for one construction round. Ephemeral: produced,
/// scored and either applied or dropped within the round.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub word: String,
    pub pos: Position,
    pub dir: Direction,
    pub intersection: Position,
    pub intersection_letter: char,
    pub score: f64,
}

/// Why a candidate was excluded from scoring. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reject {
    OutOfBounds,
    OverlapConflict {
        at: Position,
        existing: char,
        placed: char,
    },
    InvalidCrossWord(String),
}

#[derive(Debug)]
pub enum BuildEvent<'a> {
    CentralPlaced {
        word: &'a str,
        pos: Position,
    },
    PlacementApplied {
        round: usize,
        placement: &'a Placement,
    },
    WordsUnplaced {
        words: &'a BTreeSet<String>,
    },
    RoundLimitReached {
        max_rounds: usize,
    },
}

/// Structured progress sink. The construction loop never branches on what an
/// observer does with the events.
pub trait BuildObserver {
    fn notify(&mut self, event: BuildEvent<'_>);
}

pub struct NullObserver;

impl BuildObserver for NullObserver {
    fn notify(&mut self, _event: BuildEvent<'_>) {}
}

#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub central_word: String,
    /// Step budget: hard bound on construction rounds.
    pub max_rounds: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            central_word: DEFAULT_CENTRAL_WORD.to_string(),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

#[derive(Debug)]
pub struct BuildResult {
    pub board: Board,
    pub graph: WordGraph,
    pub placed: BTreeSet<String>,
    pub unplaced: BTreeSet<String>,
    pub rounds: usize,
    pub capped: bool,
}

fn cell_at(pos: Position, offset: usize, dir: Direction) -> Position {
    match dir {
        Direction::Horizontal => Position::new(pos.row, pos.col + offset),
        Direction::Vertical => Position::new(pos.row + offset, pos.col),
    }
}

/// The perpendicular run that writing `new_letter` at `pos` would close,
/// if it is longer than one letter.
pub fn cross_word(
    board: &Board,
    pos: Position,
    main_dir: Direction,
    new_letter: char,
) -> Option<String> {
    let cross_dir = main_dir.flip();

    let mut start = pos;
    while let Some(prev) = start.prev(cross_dir) {
        if board.letter_at(prev.row, prev.col).is_none() {
            break;
        }
        start = prev;
    }

    let mut word = String::new();
    let mut current = Some(start);
    while let Some(c) = current {
        if c == pos {
            word.push(new_letter);
        } else {
            match board.letter_at(c.row, c.col) {
                Some(letter) => word.push(letter),
                None => break,
            }
        }
        current = c.next(cross_dir);
    }

    if word.len() > 1 {
        Some(word)
    } else {
        None
    }
}

/// Legality check: fits the board, agrees with every overlapped cell, and
/// every perpendicular run it closes is a dictionary word.
pub fn validate_placement(
    placement: &Placement,
    board: &Board,
    gaddag: &Gaddag,
) -> Result<(), Reject> {
    let len = placement.word.chars().count();
    let end = placement.pos[placement.dir] + len;
    if end > BOARD_SIZE {
        return Err(Reject::OutOfBounds);
    }

    for (i, letter) in placement.word.chars().enumerate() {
        let cell = cell_at(placement.pos, i, placement.dir);
        match board.letter_at(cell.row, cell.col) {
            Some(existing) if existing != letter => {
                return Err(Reject::OverlapConflict {
                    at: cell,
                    existing,
                    placed: letter,
                });
            }
            Some(_) => {}
            None => {
                if let Some(cross) = cross_word(board, cell, placement.dir, letter) {
                    if !gaddag.contains(&cross) {
                        return Err(Reject::InvalidCrossWord(cross));
                    }
                }
            }
        }
    }
    Ok(())
}

/// Core candidate generation: every legal placement of `word` that crosses an
/// anchor cell, in both orientations. An empty board yields nothing — the
/// central word must already be down.
pub fn connected_placements(word: &str, board: &Board, gaddag: &Gaddag) -> Vec<Placement> {
    let letters: Vec<char> = word.chars().collect();
    let mut placements = Vec::new();

    for anchor in board.occupied_cells() {
        let anchor_letter = match board.letter_at(anchor.row, anchor.col) {
            Some(letter) => letter,
            None => continue,
        };
        for (i, &letter) in letters.iter().enumerate() {
            if letter != anchor_letter {
                continue;
            }
            // Horizontal start shifted left of the anchor by the letter index
            if anchor.col >= i && anchor.col - i + letters.len() <= BOARD_SIZE {
                let candidate = Placement {
                    word: word.to_string(),
                    pos: Position::new(anchor.row, anchor.col - i),
                    dir: Direction::Horizontal,
                    intersection: anchor,
                    intersection_letter: anchor_letter,
                    score: 0.0,
                };
                if validate_placement(&candidate, board, gaddag).is_ok() {
                    placements.push(candidate);
                }
            }
            // Vertical start shifted up by the same rule
            if anchor.row >= i && anchor.row - i + letters.len() <= BOARD_SIZE {
                let candidate = Placement {
                    word: word.to_string(),
                    pos: Position::new(anchor.row - i, anchor.col),
                    dir: Direction::Vertical,
                    intersection: anchor,
                    intersection_letter: anchor_letter,
                    score: 0.0,
                };
                if validate_placement(&candidate, board, gaddag).is_ok() {
                    placements.push(candidate);
                }
            }
        }
    }
    placements
}

/// All perpendicular words a placement would close over its empty cells.
pub fn find_cross_words(placement: &Placement, board: &Board) -> Vec<String> {
    placement
        .word
        .chars()
        .enumerate()
        .filter_map(|(i, letter)| {
            let cell = cell_at(placement.pos, i, placement.dir);
            if board.letter_at(cell.row, cell.col).is_none() {
                cross_word(board, cell, placement.dir, letter)
            } else {
                None
            }
        })
        .collect()
}

/// Occupancy ratio of the 3x3 rings around every cell of the placement.
pub fn local_density(placement: &Placement, board: &Board) -> f64 {
    let mut occupied = 0usize;
    let mut total = 0usize;
    for i in 0..placement.word.chars().count() {
        let cell = cell_at(placement.pos, i, placement.dir);
        for dr in -1i32..=1 {
            for dc in -1i32..=1 {
                let row = cell.row as i32 + dr;
                let col = cell.col as i32 + dc;
                if (0..BOARD_SIZE as i32).contains(&row) && (0..BOARD_SIZE as i32).contains(&col) {
                    total += 1;
                    if board.letter_at(row as usize, col as usize).is_some() {
                        occupied += 1;
                    }
                }
            }
        }
    }
    occupied as f64 / total.max(1) as f64
}

/// Manhattan distance from the placement's start cell to the board centre.
pub fn centre_distance(placement: &Placement, board: &Board) -> f64 {
    placement.pos.manhattan(board.center()) as f64
}

/// Number of intersections and perpendicular adjacencies the placement makes.
pub fn count_connections(placement: &Placement, board: &Board) -> usize {
    let mut connections = 0;
    for (i, letter) in placement.word.chars().enumerate() {
        let cell = cell_at(placement.pos, i, placement.dir);
        if board.letter_at(cell.row, cell.col) == Some(letter) {
            connections += 1;
        }
        let (side_a, side_b) = match placement.dir {
            Direction::Horizontal => (cell.prev(Direction::Vertical), cell.next(Direction::Vertical)),
            Direction::Vertical => (cell.prev(Direction::Horizontal), cell.next(Direction::Horizontal)),
        };
        let touches = |p: Option<Position>| {
            p.map_or(false, |p| board.letter_at(p.row, p.col).is_some())
        };
        if touches(side_a) || touches(side_b) {
            connections += 1;
        }
    }
    connections
}

/// Unified placement quality score. Higher is better.
pub fn score_placement(placement: &Placement, board: &Board, support: &SupportLetters) -> f64 {
    let mut score = 0.0;

    // Base Scrabble value of newly written letters, with live multipliers
    let mut base = 0;
    for (i, letter) in placement.word.chars().enumerate() {
        let cell = cell_at(placement.pos, i, placement.dir);
        if board.letter_at(cell.row, cell.col).is_none() {
            let (letter_mult, _) = board.active_multipliers(cell);
            base += letter_value(letter) * letter_mult;
        }
    }
    score += base as f64 * WEIGHT_BASE_SCORE;

    for cross in find_cross_words(placement, board) {
        let cross_score: i32 = cross.chars().map(letter_value).sum();
        score += cross_score as f64 * WEIGHT_CROSS_WORDS;
    }

    // Connecting through the designated practice letter is worth a flat bonus
    if let Some(designated) = support.get(&placement.word) {
        if designated.contains_key(&placement.intersection_letter) {
            score += SUPPORT_LETTER_BONUS;
        }
    }

    score += local_density(placement, board) * WEIGHT_DENSITY;
    score -= centre_distance(placement, board) * WEIGHT_CENTRALITY;
    score += count_connections(placement, board) as f64 * WEIGHT_CONNECTIONS;

    score
}

/// Total order used to pick the round winner: score first, then the explicit
/// tie-break key (word, row, col, direction) so equal scores resolve the same
/// way on every run.
pub fn placement_order(a: &Placement, b: &Placement) -> Ordering {
    let key = |p: &Placement| (p.word.clone(), p.pos.row, p.pos.col, p.dir);
    a.score
        .total_cmp(&b.score)
        .then_with(|| key(b).cmp(&key(a)))
}

/// Writes a validated placement: fills only empty cells, consumes their
/// multipliers, registers the word node and records every span overlap with
/// an existing word as a mirrored connection.
pub fn apply_placement(board: &mut Board, graph: &mut WordGraph, placement: &Placement) {
    let letters: Vec<char> = placement.word.chars().collect();

    for (i, &letter) in letters.iter().enumerate() {
        let cell = cell_at(placement.pos, i, placement.dir);
        if board.letter_at(cell.row, cell.col).is_none() {
            board.place_letter(cell, letter);
            board.use_multiplier(cell);
        }
    }

    let word_id = graph.add_word(&placement.word, placement.pos, placement.dir);

    // Snapshot the other nodes before mutating the graph
    let others: Vec<(crate::graph::WordId, Position, Direction, usize)> = graph
        .word_nodes()
        .filter(|node| node.word != word_id)
        .map(|node| {
            (
                node.word,
                node.position,
                node.direction,
                graph.word(node.word).chars().count(),
            )
        })
        .collect();

    for (i, &letter) in letters.iter().enumerate() {
        let cell = cell_at(placement.pos, i, placement.dir);
        for &(other, other_pos, other_dir, other_len) in &others {
            let offset = match other_dir {
                Direction::Horizontal => {
                    if other_pos.row != cell.row
                        || cell.col < other_pos.col
                        || cell.col >= other_pos.col + other_len
                    {
                        continue;
                    }
                    cell.col - other_pos.col
                }
                Direction::Vertical => {
                    if other_pos.col != cell.col
                        || cell.row < other_pos.row
                        || cell.row >= other_pos.row + other_len
                    {
                        continue;
                    }
                    cell.row - other_pos.row
                }
            };
            let is_support = graph.is_support_connection(word_id, i, other, offset, letter);
            graph.add_connection(Connection {
                word1: word_id,
                word2: other,
                position: cell,
                letter,
                is_support,
                distance: 1,
            });
        }
    }
}

/// Incremental constrained construction: grows the board from the central
/// word by repeatedly applying the globally best-scoring legal placement.
/// Connectivity is guaranteed by construction.
pub fn build_grid(
    review_words: &[String],
    gaddag: &Gaddag,
    support: &SupportLetters,
    config: &BuildConfig,
    observer: &mut dyn BuildObserver,
) -> BuildResult {
    let central = normalize_word(&config.central_word);
    assert!(
        is_valid_word(&central),
        "central word must be 2-15 letters: {:?}",
        config.central_word
    );

    let mut board = Board::empty();
    let mut graph = WordGraph::new();

    let targets: BTreeSet<String> = review_words.iter().map(|w| normalize_word(w)).collect();
    let support: SupportLetters = support
        .iter()
        .map(|(word, map)| (normalize_word(word), map.clone()))
        .collect();
    for word in &targets {
        graph.expect_word(word);
    }
    for (word, map) in &support {
        graph.set_support_letters(word, map.clone());
    }

    // Central word goes down vertically through the centre column
    let center = board.center();
    let start = Position::new(center.row.saturating_sub(central.len() / 2), center.col);
    for (i, letter) in central.chars().enumerate() {
        board.place_letter(cell_at(start, i, Direction::Vertical), letter);
    }
    graph.add_word(&central, start, Direction::Vertical);
    graph.set_central(&central);
    observer.notify(BuildEvent::CentralPlaced {
        word: &central,
        pos: start,
    });

    let mut placed: BTreeSet<String> = [central.clone()].into();
    let mut remaining: BTreeSet<String> = targets.difference(&placed).cloned().collect();

    let mut rounds = 0;
    let mut capped = false;
    while !remaining.is_empty() {
        if rounds >= config.max_rounds {
            capped = true;
            observer.notify(BuildEvent::RoundLimitReached {
                max_rounds: config.max_rounds,
            });
            break;
        }
        rounds += 1;

        // Candidate generation and scoring are read-only over the board, so
        // the remaining words can be evaluated in parallel
        let best = remaining
            .par_iter()
            .flat_map_iter(|word| {
                let mut candidates = connected_placements(word, &board, gaddag);
                for candidate in &mut candidates {
                    candidate.score = score_placement(candidate, &board, &support);
                }
                candidates
            })
            .max_by(placement_order);

        match best {
            Some(placement) => {
                apply_placement(&mut board, &mut graph, &placement);
                observer.notify(BuildEvent::PlacementApplied {
                    round: rounds,
                    placement: &placement,
                });
                remaining.remove(&placement.word);
                placed.insert(placement.word);
            }
            None => break,
        }
    }

    if !remaining.is_empty() {
        observer.notify(BuildEvent::WordsUnplaced { words: &remaining });
    }

    BuildResult {
        board,
        graph,
        placed,
        unplaced: remaining,
        rounds,
        capped,
    }
}

/// `build_grid` without progress reporting.
pub fn build_grid_quiet(
    review_words: &[String],
    gaddag: &Gaddag,
    support: &SupportLetters,
    config: &BuildConfig,
) -> BuildResult {
    build_grid(review_words, gaddag, support, config, &mut NullObserver)
}
