use std::slice::Iter;

use crate::BOARD_SIZE;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Horizontal,
    Vertical,
}

impl Direction {
    pub fn iter() -> Iter<'static, Direction> {
        static DIRS: [Direction; 2] = [Direction::Horizontal, Direction::Vertical];
        DIRS.iter()
    }

    pub fn flip(&self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Returns the next position in the given direction, if still on the board
    pub fn next(&self, dir: Direction) -> Option<Position> {
        match dir {
            Direction::Horizontal => {
                if self.col + 1 < BOARD_SIZE {
                    Some(Position {
                        row: self.row,
                        col: self.col + 1,
                    })
                } else {
                    None
                }
            }
            Direction::Vertical => {
                if self.row + 1 < BOARD_SIZE {
                    Some(Position {
                        row: self.row + 1,
                        col: self.col,
                    })
                } else {
                    None
                }
            }
        }
    }

    /// Returns the previous position in the given direction
    pub fn prev(&self, dir: Direction) -> Option<Position> {
        match dir {
            Direction::Horizontal => {
                if self.col != 0 {
                    Some(Position {
                        row: self.row,
                        col: self.col - 1,
                    })
                } else {
                    None
                }
            }
            Direction::Vertical => {
                if self.row != 0 {
                    Some(Position {
                        row: self.row - 1,
                        col: self.col,
                    })
                } else {
                    None
                }
            }
        }
    }

    /// Returns all the valid orthogonal neighbours of this position
    pub fn adjacent(&self) -> Vec<Position> {
        let mut result = Vec::new();
        for d in Direction::iter() {
            if let Some(pos) = self.next(*d) {
                result.push(pos);
            }
            if let Some(pos) = self.prev(*d) {
                result.push(pos);
            }
        }
        result
    }

    /// Moves the position forward a fixed number of steps
    pub fn step_n(&self, n: usize, dir: Direction) -> Option<Position> {
        let mut p = *self;
        for _ in 0..n {
            p = p.next(dir)?;
        }
        Some(p)
    }

    /// Manhattan distance to another position
    pub fn manhattan(&self, other: Position) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl std::ops::Index<Direction> for Position {
    type Output = usize;

    fn index(&self, index: Direction) -> &Self::Output {
        match index {
            Direction::Horizontal => &self.col,
            Direction::Vertical => &self.row,
        }
    }
}

impl std::ops::IndexMut<Direction> for Position {
    fn index_mut(&mut self, index: Direction) -> &mut Self::Output {
        match index {
            Direction::Horizontal => &mut self.col,
            Direction::Vertical => &mut self.row,
        }
    }
}

/// French Scrabble letter values. Anything outside A-Z scores zero.
pub fn letter_value(letter: char) -> i32 {
    match letter {
        'A' | 'E' | 'I' | 'L' | 'N' | 'O' | 'R' | 'S' | 'T' | 'U' => 1,
        'D' | 'G' | 'M' => 2,
        'B' | 'C' | 'P' => 3,
        'F' | 'H' | 'V' => 4,
        'J' | 'Q' => 8,
        'K' | 'W' | 'X' | 'Y' | 'Z' => 10,
        _ => 0,
    }
}
