use std::collections::HashSet;
use std::fmt;

use anyhow::{bail, Result};
use itertools::iproduct;

use crate::util::{Direction, Position};
use crate::BOARD_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SquareEffect {
    DoubleLetter,
    TripleLetter,
    DoubleWord,
    TripleWord,
    Center,
}

const TRIPLE_WORD: [(usize, usize); 8] = [
    (0, 0),
    (0, 7),
    (0, 14),
    (7, 0),
    (7, 14),
    (14, 0),
    (14, 7),
    (14, 14),
];

const DOUBLE_WORD: [(usize, usize); 16] = [
    (1, 1),
    (1, 13),
    (2, 2),
    (2, 12),
    (3, 3),
    (3, 11),
    (4, 4),
    (4, 10),
    (10, 4),
    (10, 10),
    (11, 3),
    (11, 11),
    (12, 2),
    (12, 12),
    (13, 1),
    (13, 13),
];

const TRIPLE_LETTER: [(usize, usize); 12] = [
    (1, 5),
    (1, 9),
    (5, 1),
    (5, 5),
    (5, 9),
    (5, 13),
    (9, 1),
    (9, 5),
    (9, 9),
    (9, 13),
    (13, 5),
    (13, 9),
];

const DOUBLE_LETTER: [(usize, usize); 24] = [
    (0, 3),
    (0, 11),
    (2, 6),
    (2, 8),
    (3, 0),
    (3, 7),
    (3, 14),
    (6, 2),
    (6, 6),
    (6, 8),
    (6, 12),
    (7, 3),
    (7, 11),
    (8, 2),
    (8, 6),
    (8, 8),
    (8, 12),
    (11, 0),
    (11, 7),
    (11, 14),
    (12, 6),
    (12, 8),
    (14, 3),
    (14, 11),
];

/// The 15x15 coaching grid. Cells hold at most one uppercase letter and are
/// never rewritten with a different one.
#[derive(Debug, Clone)]
pub struct Board {
    state: Vec<Vec<Option<char>>>,
    used_multipliers: HashSet<Position>,
}

impl Board {
    pub fn empty() -> Self {
        Self {
            state: vec![vec![None; BOARD_SIZE]; BOARD_SIZE],
            used_multipliers: HashSet::new(),
        }
    }

    pub fn size(&self) -> usize {
        BOARD_SIZE
    }

    pub fn center(&self) -> Position {
        Position::new(BOARD_SIZE / 2, BOARD_SIZE / 2)
    }

    pub fn is_empty(&self) -> bool {
        self.state.iter().flatten().all(|cell| cell.is_none())
    }

    /// Reads a cell. Out-of-bounds positions read as empty.
    pub fn letter_at(&self, row: usize, col: usize) -> Option<char> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            self.state[row][col]
        } else {
            None
        }
    }

    /// Writes a letter. Re-placing the same letter is a no-op; replacing a
    /// different letter would corrupt an already-validated word.
    pub fn place_letter(&mut self, pos: Position, letter: char) {
        match self.state[pos.row][pos.col] {
            Some(existing) => {
                assert!(
                    existing == letter,
                    "placement would overwrite '{}' at ({}, {}) with '{}'",
                    existing,
                    pos.row,
                    pos.col,
                    letter
                );
            }
            None => self.state[pos.row][pos.col] = Some(letter),
        }
    }

    pub fn clear_letter(&mut self, pos: Position) {
        self.state[pos.row][pos.col] = None;
    }

    /// All occupied cells in row-major order. These are the anchors the
    /// construction loop grows from.
    pub fn occupied_cells(&self) -> Vec<Position> {
        iproduct!(0..BOARD_SIZE, 0..BOARD_SIZE)
            .filter(|&(row, col)| self.state[row][col].is_some())
            .map(|(row, col)| Position::new(row, col))
            .collect()
    }

    pub fn is_adjacent_to_letter(&self, pos: Position) -> bool {
        pos.adjacent()
            .into_iter()
            .any(|n| self.letter_at(n.row, n.col).is_some())
    }

    /// Parses coordinates like "H8": row letter A-O, 1-based column.
    pub fn parse_coordinates(coord: &str) -> Result<Position> {
        let coord = coord.trim().to_ascii_uppercase();
        let mut chars = coord.chars();
        let row = match chars.next() {
            Some(c @ 'A'..='O') => c as usize - 'A' as usize,
            _ => bail!("invalid coordinate format: {coord}"),
        };
        let col: usize = match chars.as_str().parse::<usize>() {
            Ok(n) if (1..=BOARD_SIZE).contains(&n) => n - 1,
            _ => bail!("coordinate out of range: {coord}"),
        };
        Ok(Position::new(row, col))
    }

    pub fn square_effect(&self, pos: Position) -> Option<SquareEffect> {
        let key = (pos.row, pos.col);
        if TRIPLE_WORD.contains(&key) {
            Some(SquareEffect::TripleWord)
        } else if DOUBLE_WORD.contains(&key) {
            Some(SquareEffect::DoubleWord)
        } else if TRIPLE_LETTER.contains(&key) {
            Some(SquareEffect::TripleLetter)
        } else if DOUBLE_LETTER.contains(&key) {
            Some(SquareEffect::DoubleLetter)
        } else if pos == self.center() {
            Some(SquareEffect::Center)
        } else {
            None
        }
    }

    /// Raw (letter, word) multipliers for a square, ignoring prior use.
    pub fn multiplier(&self, pos: Position) -> (i32, i32) {
        match self.square_effect(pos) {
            Some(SquareEffect::TripleWord) => (1, 3),
            // The centre star counts as a double-word square
            Some(SquareEffect::DoubleWord) | Some(SquareEffect::Center) => (1, 2),
            Some(SquareEffect::TripleLetter) => (3, 1),
            Some(SquareEffect::DoubleLetter) => (2, 1),
            _ => (1, 1),
        }
    }

    /// Multipliers still in effect for a square; consumed squares are neutral.
    pub fn active_multipliers(&self, pos: Position) -> (i32, i32) {
        if self.used_multipliers.contains(&pos) {
            (1, 1)
        } else {
            self.multiplier(pos)
        }
    }

    pub fn use_multiplier(&mut self, pos: Position) {
        self.used_multipliers.insert(pos);
    }

    pub fn reset_multipliers(&mut self) {
        self.used_multipliers.clear();
    }

    /// Walks a full word from its start cell, stopping at the first gap.
    pub fn read_word(&self, start: Position, dir: Direction, len: usize) -> Option<String> {
        let mut pos = start;
        let mut word = String::with_capacity(len);
        for i in 0..len {
            word.push(self.letter_at(pos.row, pos.col)?);
            if i + 1 < len {
                pos = pos.next(dir)?;
            }
        }
        Some(word)
    }
}

impl std::ops::Index<Position> for Board {
    type Output = Option<char>;

    fn index(&self, index: Position) -> &Self::Output {
        &self.state[index.row][index.col]
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for col in 0..BOARD_SIZE {
            write!(f, "{:2} ", col + 1)?;
        }
        writeln!(f)?;
        for row in 0..BOARD_SIZE {
            write!(f, "{} |", (b'A' + row as u8) as char)?;
            for col in 0..BOARD_SIZE {
                write!(f, " {} ", self.state[row][col].unwrap_or('.'))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_and_read() {
        let mut board = Board::empty();
        assert!(board.is_empty());
        board.place_letter(Position::new(7, 7), 'T');
        assert_eq!(board.letter_at(7, 7), Some('T'));
        assert_eq!(board.letter_at(7, 8), None);
        // Same letter again is fine
        board.place_letter(Position::new(7, 7), 'T');
        assert!(!board.is_empty());
        board.clear_letter(Position::new(7, 7));
        assert!(board.is_empty());
    }

    #[test]
    #[should_panic]
    fn test_conflicting_overwrite_panics() {
        let mut board = Board::empty();
        board.place_letter(Position::new(3, 3), 'A');
        board.place_letter(Position::new(3, 3), 'B');
    }

    #[test]
    fn test_out_of_bounds_reads_empty() {
        let board = Board::empty();
        assert_eq!(board.letter_at(15, 0), None);
        assert_eq!(board.letter_at(0, 99), None);
    }

    #[test]
    fn test_occupied_cells_order() {
        let mut board = Board::empty();
        board.place_letter(Position::new(7, 9), 'S');
        board.place_letter(Position::new(7, 7), 'T');
        board.place_letter(Position::new(7, 8), 'E');
        assert_eq!(
            board.occupied_cells(),
            vec![
                Position::new(7, 7),
                Position::new(7, 8),
                Position::new(7, 9)
            ]
        );
    }

    #[test]
    fn test_parse_coordinates() {
        assert_eq!(Board::parse_coordinates("H8").unwrap(), Position::new(7, 7));
        assert_eq!(
            Board::parse_coordinates("a12").unwrap(),
            Position::new(0, 11)
        );
        assert!(Board::parse_coordinates("P1").is_err());
        assert!(Board::parse_coordinates("H16").is_err());
        assert!(Board::parse_coordinates("8H").is_err());
    }

    #[test]
    fn test_multipliers() {
        let mut board = Board::empty();
        assert_eq!(board.multiplier(Position::new(0, 0)), (1, 3));
        assert_eq!(board.multiplier(Position::new(1, 1)), (1, 2));
        assert_eq!(board.multiplier(Position::new(1, 5)), (3, 1));
        assert_eq!(board.multiplier(Position::new(0, 3)), (2, 1));
        assert_eq!(board.multiplier(Position::new(6, 4)), (1, 1));
        assert_eq!(
            board.square_effect(Position::new(7, 7)),
            Some(SquareEffect::Center)
        );
        assert_eq!(board.multiplier(Position::new(7, 7)), (1, 2));

        board.use_multiplier(Position::new(0, 0));
        assert_eq!(board.active_multipliers(Position::new(0, 0)), (1, 1));
        board.reset_multipliers();
        assert_eq!(board.active_multipliers(Position::new(0, 0)), (1, 3));
    }

    #[test]
    fn test_read_word() {
        let mut board = Board::empty();
        for (i, letter) in "CHAT".chars().enumerate() {
            board.place_letter(Position::new(4, 2 + i), letter);
        }
        assert_eq!(
            board.read_word(Position::new(4, 2), Direction::Horizontal, 4),
            Some("CHAT".to_string())
        );
        assert_eq!(
            board.read_word(Position::new(4, 2), Direction::Horizontal, 5),
            None
        );
    }
}
