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

use std::{fs, process::ExitCode, ffi::OsString};
use clap::Parser;
use custom_connections::{puzzle::Puzzle, share, token};

#[derive(Parser)]
#[command(name = "make-puzzle")]
struct Cli {
    #[arg(value_name = "PUZZLE", required_unless_present_any = ["sample", "decode"])]
    puzzles: Vec<OsString>,
    /// Origin of the server that the links should point to
    #[arg(short, long, value_name = "URL", default_value = "http://localhost:8080")]
    origin: String,
    /// Print only the token instead of the full link
    #[arg(short, long)]
    token_only: bool,
    /// Use the built-in sample puzzle
    #[arg(short, long, conflicts_with = "decode")]
    sample: bool,
    /// Print the puzzle in a token or a link in the text format
    #[arg(short, long, value_name = "TOKEN", conflicts_with = "puzzles")]
    decode: Option<String>,
}

/// Accepts either a bare token or a whole link containing one.
fn token_from_argument(argument: &str) -> &str {
    let query = match argument.split_once('?') {
        Some((_, query)) => query,
        None => return argument,
    };

    let prefix = format!("{}=", token::QUERY_PARAM);

    query.split('&')
        .find_map(|part| part.strip_prefix(prefix.as_str()))
        .unwrap_or(argument)
}

fn print_puzzle(cli: &Cli, puzzle: &Puzzle) -> Result<(), token::Error> {
    let token = token::encode(puzzle)?;

    if cli.token_only {
        println!("{}", token);
    } else {
        println!("{}", share::share_url(&cli.origin, &token));
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(argument) = cli.decode.as_ref() {
        return match token::decode(token_from_argument(argument)) {
            Ok(puzzle) => {
                print!("{}", puzzle);
                ExitCode::SUCCESS
            },
            Err(e) => {
                eprintln!("{}: {}", argument, e);
                ExitCode::FAILURE
            },
        };
    }

    if cli.sample {
        if let Err(e) = print_puzzle(&cli, &Puzzle::sample()) {
            eprintln!("sample: {}", e);
            return ExitCode::FAILURE;
        }
    }

    for filename in cli.puzzles.iter() {
        let source = match fs::read_to_string(filename) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{}: {}", filename.to_string_lossy(), e);
                return ExitCode::FAILURE;
            },
        };

        let puzzle = match source.parse::<Puzzle>() {
            Ok(p) => p,
            Err(e) => {
                eprintln!("{}: {}", filename.to_string_lossy(), e);
                return ExitCode::FAILURE;
            },
        };

        if let Err(e) = print_puzzle(&cli, &puzzle) {
            eprintln!("{}: {}", filename.to_string_lossy(), e);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
