// Custom Connections – A word grouping game
// Copyright (C) 2024  Neil Roberts
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use super::puzzle::{
    Puzzle, Category, N_CATEGORIES, N_WORDS, N_WORDS_PER_CATEGORY,
};
use super::shuffle;
use rand::Rng;

/// Number of incorrect groups after which the game is lost and the
/// solution is revealed
pub const MAX_MISTAKES: u32 = 7;

pub const SELECTION_SIZE: usize = N_WORDS_PER_CATEGORY;

/// How long a transient message stays visible
pub const MESSAGE_TIMEOUT_MS: i32 = 2000;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Status {
    Playing,
    Solved,
    GameOver,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Message {
    Correct,
    Incorrect,
    Solved,
    GameOver,
}

impl Message {
    pub fn text(self) -> &'static str {
        match self {
            Message::Correct => "Correct group found!",
            Message::Incorrect => "Incorrect grouping. Try again!",
            Message::Solved => "Congratulations! You solved the puzzle!",
            Message::GameOver => "Game over! All solutions revealed.",
        }
    }

    pub fn is_error(self) -> bool {
        matches!(self, Message::Incorrect | Message::GameOver)
    }

    /// Transient messages should be cleared after
    /// [MESSAGE_TIMEOUT_MS]. The others stay until the page is left.
    pub fn is_transient(self) -> bool {
        matches!(self, Message::Correct | Message::Incorrect)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Word {
    pub text: String,
    pub category: usize,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CompletedCategory {
    pub category: usize,
    /// Board indices of the words, in the order they were selected
    pub words: [usize; N_WORDS_PER_CATEGORY],
    /// Set when the category was shown because the game was lost
    pub revealed: bool,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TileState {
    Normal,
    Selected,
    Completed { category: usize },
}

pub struct Game {
    puzzle: Puzzle,
    board: Vec<Word>,
    selection: Vec<usize>,
    completed: Vec<CompletedCategory>,
    completed_tiles: [Option<usize>; N_WORDS],
    mistakes: u32,
    status: Status,

    pending_message: Option<Message>,

    tiles_dirty: u32,
    selection_dirty: bool,
    n_completed_flushed: usize,
    mistakes_dirty: bool,
    status_dirty: bool,
}

impl Game {
    /// Starts a game with the words of the puzzle laid out in a
    /// random order. The order stays fixed for the whole game.
    pub fn new<R>(puzzle: Puzzle, rng: &mut R) -> Game
        where R: Rng + ?Sized
    {
        let mut board = flatten_words(&puzzle);

        shuffle::shuffle(&mut board, rng);

        Game::with_board(puzzle, board)
    }

    fn with_board(puzzle: Puzzle, board: Vec<Word>) -> Game {
        Game {
            puzzle,
            board,
            selection: Vec::with_capacity(SELECTION_SIZE),
            completed: Vec::with_capacity(N_CATEGORIES),
            completed_tiles: [None; N_WORDS],
            mistakes: 0,
            status: Status::Playing,

            pending_message: None,

            tiles_dirty: u32::MAX >> (u32::BITS - N_WORDS as u32),
            selection_dirty: true,
            n_completed_flushed: 0,
            mistakes_dirty: true,
            status_dirty: false,
        }
    }

    fn dirty_tile(&mut self, index: usize) {
        self.tiles_dirty |= 1 << index;
    }

    fn show_message(&mut self, message: Message) {
        self.pending_message = Some(message);
    }

    /// Selects or deselects the word at the given board position.
    /// Selecting the last word of a group checks the group straight
    /// away.
    pub fn toggle_word(&mut self, index: usize) {
        if self.status != Status::Playing ||
            index >= self.board.len() ||
            self.completed_tiles[index].is_some()
        {
            return;
        }

        if let Some(pos) = self.selection.iter().position(|&i| i == index) {
            self.selection.remove(pos);
        } else if self.selection.len() < SELECTION_SIZE {
            self.selection.push(index);
        } else {
            return;
        }

        self.dirty_tile(index);
        self.selection_dirty = true;

        if self.selection.len() >= SELECTION_SIZE {
            self.check_selection();
        }
    }

    fn check_selection(&mut self) {
        let selection = std::mem::take(&mut self.selection);

        for &index in selection.iter() {
            self.dirty_tile(index);
        }

        let category = self.board[selection[0]].category;

        if selection.iter().all(|&i| self.board[i].category == category) {
            let words = std::array::from_fn(|i| selection[i]);

            self.complete_category(category, words, false);

            if self.completed.len() >= N_CATEGORIES {
                self.set_status(Status::Solved);
                self.show_message(Message::Solved);
            } else {
                self.show_message(Message::Correct);
            }
        } else {
            self.mistakes += 1;
            self.mistakes_dirty = true;

            if self.mistakes >= MAX_MISTAKES {
                self.reveal_solution();
                self.set_status(Status::GameOver);
                self.show_message(Message::GameOver);
            } else {
                self.show_message(Message::Incorrect);
            }
        }
    }

    fn complete_category(
        &mut self,
        category: usize,
        words: [usize; N_WORDS_PER_CATEGORY],
        revealed: bool,
    ) {
        for &index in words.iter() {
            self.completed_tiles[index] = Some(category);
            self.dirty_tile(index);
        }

        self.completed.push(CompletedCategory {
            category,
            words,
            revealed,
        });
    }

    fn reveal_solution(&mut self) {
        for category in 0..N_CATEGORIES {
            if self.completed.iter().any(|c| c.category == category) {
                continue;
            }

            let indices = self.board.iter()
                .enumerate()
                .filter_map(|(index, word)| {
                    (word.category == category).then_some(index)
                })
                .collect::<Vec<_>>();

            let Ok(words) = <[usize; N_WORDS_PER_CATEGORY]>::try_from(indices)
            else {
                continue;
            };

            self.complete_category(category, words, true);
        }
    }

    fn set_status(&mut self, status: Status) {
        self.status = status;
        self.status_dirty = true;
    }

    pub fn pending_message(&mut self) -> Option<Message> {
        self.pending_message.take()
    }

    pub fn changed_tiles(&mut self) -> ChangedTiles {
        ChangedTiles::new(std::mem::take(&mut self.tiles_dirty))
    }

    pub fn changed_selection(&mut self) -> bool {
        std::mem::replace(&mut self.selection_dirty, false)
    }

    /// Returns the categories completed since the last call
    pub fn changed_completed(&mut self) -> &[CompletedCategory] {
        let start = std::mem::replace(
            &mut self.n_completed_flushed,
            self.completed.len(),
        );

        &self.completed[start..]
    }

    pub fn changed_mistakes(&mut self) -> Option<u32> {
        if self.mistakes_dirty {
            self.mistakes_dirty = false;
            Some(self.mistakes)
        } else {
            None
        }
    }

    pub fn changed_status(&mut self) -> Option<Status> {
        if self.status_dirty {
            self.status_dirty = false;
            Some(self.status)
        } else {
            None
        }
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    pub fn category(&self, index: usize) -> &Category {
        &self.puzzle.categories[index]
    }

    pub fn board(&self) -> &[Word] {
        &self.board
    }

    pub fn word(&self, index: usize) -> &Word {
        &self.board[index]
    }

    pub fn selection(&self) -> &[usize] {
        &self.selection
    }

    /// Text of each selected word in the order it was picked, padded
    /// with `None` up to the size of a group.
    pub fn selection_slots(&self) -> [Option<&str>; SELECTION_SIZE] {
        std::array::from_fn(|slot| {
            self.selection.get(slot)
                .map(|&index| self.board[index].text.as_str())
        })
    }

    pub fn completed(&self) -> &[CompletedCategory] {
        &self.completed
    }

    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_game_over(&self) -> bool {
        self.status == Status::GameOver
    }

    pub fn tile_state(&self, index: usize) -> TileState {
        if let Some(category) = self.completed_tiles[index] {
            TileState::Completed { category }
        } else if self.selection.contains(&index) {
            TileState::Selected
        } else {
            TileState::Normal
        }
    }
}

fn flatten_words(puzzle: &Puzzle) -> Vec<Word> {
    puzzle.words()
        .map(|(text, category)| Word { text: text.to_string(), category })
        .collect()
}

pub struct ChangedTiles {
    tiles_dirty: u32,
}

impl ChangedTiles {
    fn new(tiles_dirty: u32) -> ChangedTiles {
        ChangedTiles {
            tiles_dirty,
        }
    }
}

impl Iterator for ChangedTiles {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.tiles_dirty == 0 {
            None
        } else {
            let index = self.tiles_dirty.trailing_zeros();
            self.tiles_dirty &= u32::MAX.wrapping_shl(index).wrapping_shl(1);
            Some(index as usize)
        }
    }
}
