use std::io::{self, BufRead};

use citadel::board::Board;
use citadel::game::Game;
use citadel::moves::perft::{perft, perft_divide};
use citadel::moves::tables::init_tables;
use citadel::search::search::search;
use citadel::status::{GameStatus, position_status};

const DEFAULT_DEPTH: u32 = 6;

fn main() {
    init_tables();
    citadel::logger::init_logging("logs/citadel.log", "info");

    let mut game = Game::new();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l.trim().to_string(),
            Err(_) => break,
        };
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "uci" => {
                println!("id name citadel");
                println!("id author citadel developers");
                println!("uciok");
            }
            "isready" => println!("readyok"),
            "ucinewgame" | "new" => game.new_game(),
            "position" => handle_position(&mut game, &parts),
            "go" => handle_go(&mut game, &parts),
            "perft" => handle_perft(&mut game, &parts, false),
            "divide" => handle_perft(&mut game, &parts, true),
            "d" | "display" => {
                print!("{}", game.board.ascii());
                println!("fen: {}", game.board.to_fen());
            }
            "fen" => println!("{}", game.board.to_fen()),
            "status" => println!("{:?}", position_status(&game)),
            "quit" => break,
            other => println!("unknown command: {other}"),
        }
    }
}

/// `position startpos [moves ...]` or `position fen <fen> [moves ...]`.
/// On any parse failure the current position is left untouched.
fn handle_position(game: &mut Game, parts: &[&str]) {
    let moves_at = parts.iter().position(|&p| p == "moves");
    let board = match parts.get(1) {
        Some(&"startpos") | None => Ok(Board::startpos()),
        Some(&"fen") => {
            let end = moves_at.unwrap_or(parts.len());
            Board::from_fen(&parts[2..end].join(" "))
        }
        // Bare FEN without the `fen` keyword is accepted too.
        Some(_) => {
            let end = moves_at.unwrap_or(parts.len());
            Board::from_fen(&parts[1..end].join(" "))
        }
    };

    let board = match board {
        Ok(b) => b,
        Err(err) => {
            println!("bad position: {err}");
            return;
        }
    };

    let mut staged = Game::default();
    staged.set_board(board);
    if let Some(idx) = moves_at {
        for text in &parts[idx + 1..] {
            match staged.find_move(text) {
                Some(mv) => staged.push(mv),
                None => {
                    println!("illegal move in sequence: {text}");
                    return;
                }
            }
        }
    }
    *game = staged;
}

/// `go [depth D]`: fixed-depth search, reports `bestmove`.
fn handle_go(game: &mut Game, parts: &[&str]) {
    match position_status(game) {
        GameStatus::InPlay | GameStatus::DrawThreefold | GameStatus::DrawFiftyMove => {}
        status => {
            println!("info string game over: {status:?}");
            println!("bestmove 0000");
            return;
        }
    }

    let mut depth = DEFAULT_DEPTH;
    let mut i = 1;
    while i < parts.len() {
        if parts[i] == "depth"
            && let Some(d) = parts.get(i + 1).and_then(|s| s.parse().ok())
        {
            depth = d;
            i += 2;
        } else {
            i += 1;
        }
    }

    let result = search(game, depth);
    println!(
        "info depth {} score cp {} nodes {}",
        depth, result.score, result.nodes
    );
    match result.best_move {
        Some(mv) => println!("bestmove {}", mv.to_uci()),
        None => println!("bestmove 0000"),
    }
}

fn handle_perft(game: &mut Game, parts: &[&str], divide: bool) {
    let depth: u32 = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(1);
    let mut board = game.board.clone();
    if divide {
        let mut total = 0;
        for (mv, nodes) in perft_divide(&mut board, depth.max(1)) {
            println!("{mv}: {nodes}");
            total += nodes;
        }
        println!("total: {total}");
    } else {
        println!("{}", perft(&mut board, depth));
    }
}
