pub mod board;
pub mod cbic;
pub mod gaddag;
pub mod graph;
pub mod util;

pub const BOARD_SIZE: usize = 15;
