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

//! The token is the only thing that is ever persisted. It is the
//! JSON list of categories encoded with the URL-safe base64 alphabet
//! so that it can be put directly in the query string of a link.

use std::fmt;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use super::puzzle::{Puzzle, ValidationError};

/// Name of the query parameter that carries the token
pub const QUERY_PARAM: &'static str = "puzzle";

#[derive(Debug)]
pub enum Error {
    Base64,
    Utf8,
    Json(serde_json::Error),
    Invalid(ValidationError),
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Error {
        Error::Invalid(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Json(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Base64 => write!(f, "invalid base64"),
            Error::Utf8 => write!(f, "invalid UTF-8"),
            Error::Json(e) => write!(f, "invalid puzzle JSON: {}", e),
            Error::Invalid(e) => e.fmt(f),
        }
    }
}

pub fn encode(puzzle: &Puzzle) -> Result<String, Error> {
    puzzle.validate()?;

    let json = serde_json::to_string(puzzle)?;

    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Converts a token that might have been made with the standard
/// alphabet into the URL-safe one. A “+” from the standard alphabet
/// turns into a space if the link wasn’t escaped properly.
fn normalize(token: &str) -> String {
    token.trim()
        .trim_end_matches('=')
        .chars()
        .map(|ch| match ch {
            '+' | ' ' => '-',
            '/' => '_',
            ch => ch,
        })
        .collect()
}

pub fn decode(token: &str) -> Result<Puzzle, Error> {
    let Ok(bytes) = URL_SAFE_NO_PAD.decode(normalize(token))
    else {
        return Err(Error::Base64);
    };

    let Ok(json) = String::from_utf8(bytes)
    else {
        return Err(Error::Utf8);
    };

    let puzzle = serde_json::from_str::<Puzzle>(&json)?;

    puzzle.validate()?;

    Ok(puzzle)
}

#[derive(Debug)]
pub enum LoadError {
    NoPuzzle,
    Invalid(Error),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoadError::NoPuzzle => write!(
                f,
                "No puzzle found. Ask your friend for a valid puzzle link!",
            ),
            LoadError::Invalid(_) => write!(
                f,
                "Invalid puzzle data. Please check your link.",
            ),
        }
    }
}

/// Loads the puzzle for the play page from the value of the query
/// parameter, if there was one.
pub fn load(token: Option<&str>) -> Result<Puzzle, LoadError> {
    match token {
        None => Err(LoadError::NoPuzzle),
        Some(token) if token.trim().is_empty() => Err(LoadError::NoPuzzle),
        Some(token) => decode(token).map_err(LoadError::Invalid),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use super::super::puzzle::{Category, Color};
    use base64::engine::general_purpose::STANDARD;

    fn unusual_puzzle() -> Puzzle {
        Puzzle::new([
            Category::new(
                "Café & “quotes”",
                ["naïve", "a/b", "x+y", "日本"],
                "#fff".parse().unwrap(),
            ),
            Category::new(
                "Same",
                ["one", "two", "three", "four"],
                Color::for_slot(1),
            ),
            Category::new(
                "Same",
                ["five", "six", "seven", "eight"],
                Color::for_slot(2),
            ),
            Category::new(
                "Emoji 🎯",
                ["😎", "?", "&", "="],
                Color::for_slot(3),
            ),
        ])
    }

    #[test]
    fn round_trip() {
        for puzzle in [Puzzle::sample(), unusual_puzzle()] {
            let token = encode(&puzzle).unwrap();

            assert!(
                token.chars().all(|ch| {
                    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
                }),
                "{}",
                token,
            );

            assert_eq!(decode(&token).unwrap(), puzzle);
        }
    }

    #[test]
    fn payload_is_category_list() {
        let token = encode(&Puzzle::sample()).unwrap();
        let json = String::from_utf8(URL_SAFE_NO_PAD.decode(token).unwrap())
            .unwrap();
        let value = serde_json::from_str::<serde_json::Value>(&json).unwrap();

        assert_eq!(value.as_array().unwrap().len(), 4);
        assert_eq!(value[0]["name"], "Animals");
        assert_eq!(value[0]["words"][1], "Giraffe");
        assert_eq!(value[3]["color"], "#725e82");
    }

    #[test]
    fn encode_validates() {
        let mut puzzle = Puzzle::sample();
        puzzle.categories[3].words[0] = " ".to_string();

        assert_eq!(
            &encode(&puzzle).unwrap_err().to_string(),
            "All words must be filled",
        );
    }

    #[test]
    fn standard_alphabet() {
        let puzzle = unusual_puzzle();
        let json = serde_json::to_string(&puzzle).unwrap();
        let token = STANDARD.encode(json);

        assert_eq!(decode(&token).unwrap(), puzzle);

        // Query string decoding turns “+” into a space
        assert_eq!(decode(&token.replace('+', " ")).unwrap(), puzzle);
    }

    #[test]
    fn decode_error() {
        assert!(matches!(decode("!!!"), Err(Error::Base64)));
        assert!(matches!(
            decode(&URL_SAFE_NO_PAD.encode([0xffu8, 0xfe])),
            Err(Error::Utf8),
        ));
        assert!(matches!(
            decode(&URL_SAFE_NO_PAD.encode("not json")),
            Err(Error::Json(_)),
        ));
        assert!(matches!(
            decode(&URL_SAFE_NO_PAD.encode("[]")),
            Err(Error::Json(_)),
        ));

        let mut value = serde_json::to_value(Puzzle::sample()).unwrap();
        value[1]["words"] = serde_json::json!(["a", "b", "c"]);
        assert!(matches!(
            decode(&URL_SAFE_NO_PAD.encode(value.to_string())),
            Err(Error::Json(_)),
        ));

        let mut value = serde_json::to_value(Puzzle::sample()).unwrap();
        value[2]["color"] = serde_json::json!("red; background: url(x)");
        assert!(matches!(
            decode(&URL_SAFE_NO_PAD.encode(value.to_string())),
            Err(Error::Json(_)),
        ));

        let mut value = serde_json::to_value(Puzzle::sample()).unwrap();
        value[0]["name"] = serde_json::json!("");
        assert!(matches!(
            decode(&URL_SAFE_NO_PAD.encode(value.to_string())),
            Err(Error::Invalid(ValidationError::EmptyName { category: 0 })),
        ));
    }

    #[test]
    fn load_puzzle() {
        assert!(matches!(load(None), Err(LoadError::NoPuzzle)));
        assert!(matches!(load(Some("")), Err(LoadError::NoPuzzle)));
        assert_eq!(
            &load(None).unwrap_err().to_string(),
            "No puzzle found. Ask your friend for a valid puzzle link!",
        );

        let err = load(Some("garbage!")).unwrap_err();
        assert!(matches!(err, LoadError::Invalid(_)));
        assert_eq!(
            &err.to_string(),
            "Invalid puzzle data. Please check your link.",
        );

        let token = encode(&Puzzle::sample()).unwrap();
        assert_eq!(load(Some(&token)).unwrap(), Puzzle::sample());
    }
}
