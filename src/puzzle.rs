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

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

pub const N_CATEGORIES: usize = 4;
pub const N_WORDS_PER_CATEGORY: usize = 4;
pub const N_WORDS: usize = N_CATEGORIES * N_WORDS_PER_CATEGORY;

/// Colours given to the category slots on the creator page
pub const DEFAULT_COLORS: [&'static str; N_CATEGORIES] = [
    "#f8ca9d",
    "#a0c1b9",
    "#70a0af",
    "#725e82",
];

/// An RGB colour in CSS hex notation. The colour ends up in the
/// style of the page so anything else is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidColor;

impl fmt::Display for InvalidColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid colour")
    }
}

impl Color {
    pub fn for_slot(slot: usize) -> Color {
        Color(DEFAULT_COLORS[slot % N_CATEGORIES].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Color {
    type Err = InvalidColor;

    fn from_str(s: &str) -> Result<Color, InvalidColor> {
        let Some(digits) = s.strip_prefix('#')
        else {
            return Err(InvalidColor);
        };

        if (digits.len() == 6 || digits.len() == 3) &&
            digits.chars().all(|ch| ch.is_ascii_hexdigit())
        {
            Ok(Color(s.to_string()))
        } else {
            Err(InvalidColor)
        }
    }
}

impl TryFrom<String> for Color {
    type Error = InvalidColor;

    fn try_from(s: String) -> Result<Color, InvalidColor> {
        s.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> String {
        color.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub words: [String; N_WORDS_PER_CATEGORY],
    pub color: Color,
}

impl Category {
    pub fn new(
        name: &str,
        words: [&str; N_WORDS_PER_CATEGORY],
        color: Color,
    ) -> Category {
        Category {
            name: name.to_string(),
            words: words.map(str::to_string),
            color,
        }
    }
}

/// The four categories of a puzzle. This serializes as a plain JSON
/// array so that it matches the payload of a share link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Puzzle {
    pub categories: [Category; N_CATEGORIES],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    EmptyName { category: usize },
    EmptyWord { category: usize, word: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationError::EmptyName { .. } => {
                write!(f, "All category names must be filled")
            },
            ValidationError::EmptyWord { .. } => {
                write!(f, "All words must be filled")
            },
        }
    }
}

impl Puzzle {
    pub fn new(categories: [Category; N_CATEGORIES]) -> Puzzle {
        Puzzle { categories }
    }

    /// The puzzle behind the “Fill Test Data” button
    pub fn sample() -> Puzzle {
        Puzzle::new([
            Category::new(
                "Animals",
                ["Elephant", "Giraffe", "Zebra", "Lion"],
                Color::for_slot(0),
            ),
            Category::new(
                "Fruits",
                ["Apple", "Banana", "Orange", "Strawberry"],
                Color::for_slot(1),
            ),
            Category::new(
                "Countries",
                ["France", "Japan", "Brazil", "Canada"],
                Color::for_slot(2),
            ),
            Category::new(
                "Programming Languages",
                ["JavaScript", "Python", "Java", "C++"],
                Color::for_slot(3),
            ),
        ])
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (category_num, category) in self.categories.iter().enumerate() {
            if category.name.trim().is_empty() {
                return Err(ValidationError::EmptyName {
                    category: category_num,
                });
            }

            if let Some(word_num) = category.words.iter()
                .position(|word| word.trim().is_empty())
            {
                return Err(ValidationError::EmptyWord {
                    category: category_num,
                    word: word_num,
                });
            }
        }

        Ok(())
    }

    /// Iterates all sixteen words along with the index of the
    /// category that they belong to.
    pub fn words(&self) -> impl Iterator<Item = (&str, usize)> {
        self.categories.iter().enumerate().flat_map(|(index, category)| {
            category.words.iter().map(move |word| (word.as_str(), index))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    WrongCategoryCount(usize),
    MissingName { line: usize },
    WrongWordCount { line: usize, count: usize },
    InvalidColor { line: usize },
    Invalid(ValidationError),
}

impl From<ValidationError> for ParseError {
    fn from(e: ValidationError) -> ParseError {
        ParseError::Invalid(e)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::WrongCategoryCount(count) => write!(
                f,
                "expected {} categories but found {}",
                N_CATEGORIES,
                count,
            ),
            ParseError::MissingName { line } => {
                write!(f, "line {}: missing “:” after the category name", line)
            },
            ParseError::WrongWordCount { line, count } => write!(
                f,
                "line {}: expected {} words but found {}",
                line,
                N_WORDS_PER_CATEGORY,
                count,
            ),
            ParseError::InvalidColor { line } => {
                write!(f, "line {}: invalid colour", line)
            },
            ParseError::Invalid(e) => e.fmt(f),
        }
    }
}

const ESCAPE: char = '\\';

fn needs_escape(ch: char) -> bool {
    matches!(ch, '\\' | ':' | ',' | '|')
}

/// Escapes a name or word so that it can be written in a category
/// line and read back unchanged.
fn escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());

    // A leading “#” would otherwise turn the line into a comment
    if s.starts_with('#') {
        result.push(ESCAPE);
    }

    for ch in s.chars() {
        if needs_escape(ch) {
            result.push(ESCAPE);
        }
        result.push(ch);
    }

    result
}

fn unescape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch == ESCAPE {
            if let Some(next) = chars.next() {
                result.push(next);
                continue;
            }
        }

        result.push(ch);
    }

    result
}

/// Byte offsets of every occurrence of `separator` that isn’t
/// preceded by the escape character.
fn separator_positions(s: &str, separator: char) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut escaped = false;

    for (pos, ch) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == ESCAPE {
            escaped = true;
        } else if ch == separator {
            positions.push(pos);
        }
    }

    positions
}

fn split_unescaped(s: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;

    for pos in separator_positions(s, separator) {
        parts.push(&s[start..pos]);
        start = pos + separator.len_utf8();
    }

    parts.push(&s[start..]);

    parts
}

fn parse_category(
    s: &str,
    line: usize,
    slot: usize,
) -> Result<Category, ParseError> {
    let (s, color) = match separator_positions(s, '|').last() {
        None => (s, Color::for_slot(slot)),
        Some(&pos) => {
            let Ok(color) = s[pos + 1..].trim().parse::<Color>()
            else {
                return Err(ParseError::InvalidColor { line });
            };

            (&s[..pos], color)
        },
    };

    let Some(&colon) = separator_positions(s, ':').first()
    else {
        return Err(ParseError::MissingName { line });
    };

    let (name, words) = (&s[..colon], &s[colon + 1..]);

    let words = split_unescaped(words, ',').into_iter()
        .map(|word| unescape(word.trim()))
        .collect::<Vec<_>>();
    let count = words.len();

    let Ok(words) = <[String; N_WORDS_PER_CATEGORY]>::try_from(words)
    else {
        return Err(ParseError::WrongWordCount { line, count });
    };

    Ok(Category {
        name: unescape(name.trim()),
        words,
        color,
    })
}

impl FromStr for Puzzle {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Puzzle, ParseError> {
        let mut categories = Vec::with_capacity(N_CATEGORIES);

        for (line_num, line) in s.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            categories.push(
                parse_category(line, line_num + 1, categories.len())?
            );
        }

        let count = categories.len();

        let Ok(categories) = <[Category; N_CATEGORIES]>::try_from(categories)
        else {
            return Err(ParseError::WrongCategoryCount(count));
        };

        let puzzle = Puzzle::new(categories);

        puzzle.validate()?;

        Ok(puzzle)
    }
}

impl fmt::Display for Puzzle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for category in self.categories.iter() {
            write!(
                f,
                "{}: {} | {}\n",
                escape(&category.name),
                category.words.iter()
                    .map(|word| escape(word))
                    .collect::<Vec<_>>()
                    .join(", "),
                category.color,
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn color() {
        assert_eq!("#f8ca9d".parse::<Color>().unwrap().as_str(), "#f8ca9d");
        assert_eq!("#ABC".parse::<Color>().unwrap().to_string(), "#ABC");
        assert_eq!("f8ca9d".parse::<Color>(), Err(InvalidColor));
        assert_eq!("#f8ca9".parse::<Color>(), Err(InvalidColor));
        assert_eq!("#f8ca9g".parse::<Color>(), Err(InvalidColor));
        assert_eq!("red".parse::<Color>(), Err(InvalidColor));
        assert_eq!(Color::for_slot(3).as_str(), "#725e82");
        assert_eq!(Color::for_slot(4).as_str(), "#f8ca9d");
    }

    #[test]
    fn validate() {
        assert!(Puzzle::sample().validate().is_ok());

        let mut puzzle = Puzzle::sample();
        puzzle.categories[2].name = "  ".to_string();
        puzzle.categories[1].words[3] = String::new();
        assert_eq!(
            puzzle.validate(),
            Err(ValidationError::EmptyWord { category: 1, word: 3 }),
        );
        assert_eq!(
            &puzzle.validate().unwrap_err().to_string(),
            "All words must be filled",
        );

        puzzle.categories[0].name = String::new();
        assert_eq!(
            puzzle.validate(),
            Err(ValidationError::EmptyName { category: 0 }),
        );
        assert_eq!(
            &puzzle.validate().unwrap_err().to_string(),
            "All category names must be filled",
        );
    }

    #[test]
    fn words() {
        let puzzle = Puzzle::sample();
        let words = puzzle.words().collect::<Vec<_>>();

        assert_eq!(words.len(), N_WORDS);
        assert_eq!(words[0], ("Elephant", 0));
        assert_eq!(words[5], ("Banana", 1));
        assert_eq!(words[15], ("C++", 3));
    }

    #[test]
    fn parse() {
        let puzzle = "# Sample\n\
                      Animals: Elephant, Giraffe, Zebra, Lion\n\
                      \n\
                      Fruits: Apple, Banana, Orange, Strawberry | #a0c1b9\n\
                      Countries:France,Japan,Brazil,Canada\n\
                      Programming Languages: JavaScript, Python, Java, C++"
            .parse::<Puzzle>()
            .unwrap();

        assert_eq!(puzzle, Puzzle::sample());

        let puzzle = "A: a, b, c, d | #123\n\
                      B: e, f, g, h\n\
                      C: i, j, k, l\n\
                      D: m, n, o, p"
            .parse::<Puzzle>()
            .unwrap();

        assert_eq!(puzzle.categories[0].color.as_str(), "#123");
        assert_eq!(puzzle.categories[1].color.as_str(), "#a0c1b9");
    }

    #[test]
    fn parse_error() {
        assert_eq!(
            &"".parse::<Puzzle>().unwrap_err().to_string(),
            "expected 4 categories but found 0",
        );
        assert_eq!(
            &"A: a, b, c, d\nB e, f, g, h"
                .parse::<Puzzle>().unwrap_err().to_string(),
            "line 2: missing “:” after the category name",
        );
        assert_eq!(
            &"A: a, b, c".parse::<Puzzle>().unwrap_err().to_string(),
            "line 1: expected 4 words but found 3",
        );
        assert_eq!(
            &"A: a, b, c, d | blue"
                .parse::<Puzzle>().unwrap_err().to_string(),
            "line 1: invalid colour",
        );
        assert_eq!(
            &"A: a, b, c, d\nB: e, f, g, h\nC: i, j, k, l\n: m, n, o, p"
                .parse::<Puzzle>().unwrap_err().to_string(),
            "All category names must be filled",
        );
        assert_eq!(
            &"A: a, b, c, d\nB: e, f, g, h\nC: i, j, k, l\nD: m, , o, p"
                .parse::<Puzzle>().unwrap_err().to_string(),
            "All words must be filled",
        );
    }

    #[test]
    fn display() {
        let text = Puzzle::sample().to_string();

        assert!(text.starts_with(
            "Animals: Elephant, Giraffe, Zebra, Lion | #f8ca9d\n"
        ));
        assert_eq!(text.parse::<Puzzle>().unwrap(), Puzzle::sample());
    }

    #[test]
    fn display_special_characters() {
        let mut puzzle = Puzzle::sample();
        puzzle.categories[0].name = "Time: units".to_string();
        puzzle.categories[1].words[0] = "1,000".to_string();
        puzzle.categories[2].name = "#1 hits".to_string();
        puzzle.categories[3].words[1] = "a|b\\c".to_string();

        let text = puzzle.to_string();

        assert!(text.starts_with("Time\\: units: "));
        assert!(text.contains("1\\,000, "));
        assert!(text.contains("\\#1 hits: "));
        assert!(text.contains("a\\|b\\\\c"));

        assert_eq!(text.parse::<Puzzle>().unwrap(), puzzle);
    }

    #[test]
    fn parse_escapes() {
        let puzzle = "A\\: b: c\\, d, e, f, g | #123\n\
                      \\# B: h, i, j, k\n\
                      C: l, m, n, o\\|\n\
                      D: p, q, r, s\\"
            .parse::<Puzzle>()
            .unwrap();

        assert_eq!(puzzle.categories[0].name, "A: b");
        assert_eq!(puzzle.categories[0].words[0], "c, d");
        assert_eq!(puzzle.categories[0].color.as_str(), "#123");
        assert_eq!(puzzle.categories[1].name, "# B");
        assert_eq!(puzzle.categories[2].words[3], "o|");
        assert_eq!(puzzle.categories[3].words[3], "s\\");
    }
}
