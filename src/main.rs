use clap::Parser;
use pushhint::board::{ALL_DIRECTIONS, Board, Direction, Position, Tile};
use pushhint::levels::Levels;
use pushhint::session::{MoveOutcome, Session};
use pushhint::solver::SearchConfig;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn arrow(dir: Direction) -> char {
    match dir {
        Direction::Up => '^',
        Direction::Down => 'v',
        Direction::Left => '<',
        Direction::Right => '>',
    }
}

/// Draw the board with the hint path as arrows and, optionally, free cells as `-`.
fn render(board: &Board, show_free: bool) -> String {
    let mut out = String::new();
    for y in 0..board.height() {
        let mut line = String::new();
        for x in 0..board.width() {
            let pos = Position::new(x, y);
            let cell = board.cell(pos);
            let ch = if pos == board.player() {
                match cell.tile {
                    Tile::Goal => '+',
                    _ => '@',
                }
            } else if cell.has_box() {
                match cell.tile {
                    Tile::Goal => '*',
                    _ => '$',
                }
            } else if let Some(dir) = cell.hint {
                arrow(dir)
            } else {
                match cell.tile {
                    Tile::Wall => '#',
                    Tile::Goal => '.',
                    Tile::Empty if show_free && cell.is_free => '-',
                    Tile::Empty => ' ',
                }
            };
            line.push(ch);
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn print_pushes(board: &Board) {
    for (i, state) in board.boxes().iter().enumerate() {
        let pushes: Vec<String> = ALL_DIRECTIONS
            .iter()
            .filter(|&&dir| state.can_move(dir))
            .map(|&dir| {
                let verdict = if state.shall_not_move(dir) { "unsafe" } else { "safe" };
                format!("{} {}", dir, verdict)
            })
            .collect();
        let dead = if state.is_dead { " (dead)" } else { "" };
        println!(
            "box #{} {}{}: {}",
            i + 1,
            state.position,
            dead,
            if pushes.is_empty() { "-".to_string() } else { pushes.join(", ") }
        );
    }
}

fn print_hint(session: &Session) {
    let Some(hint) = session.hint() else {
        println!("hint: none (search budget exceeded)");
        return;
    };

    if session.is_complete() {
        println!("hint: level complete in {} moves", session.moves());
        return;
    }

    match hint.suggestion.push {
        Some(push) => {
            let walk: String = hint.path.iter().map(|dir| dir.to_char()).collect();
            println!(
                "hint: push box at {} {}  walk: {}  estimate: {}",
                push.target,
                push.direction,
                if walk.is_empty() { "-" } else { walk.as_str() },
                hint.suggestion.cost
            );
        }
        None => println!("hint: no safe push ({})", hint.suggestion.cost),
    }
}

fn print_stats(session: &Session, elapsed_ms: u128) {
    println!(
        "moves: {}  boards: {}  nodes: {}  elapsed: {} ms",
        session.moves(),
        session.solver().len(),
        session.solver().nodes_explored(),
        elapsed_ms
    );
}

struct PlayOpts {
    moves: Option<String>,
    autoplay: Option<usize>,
    show_free: bool,
    show_pushes: bool,
}

fn play_level(board: &Board, config: SearchConfig, opts: &PlayOpts) {
    let start = Instant::now();
    let mut session = Session::new(board.duplicate(), config);

    if let Some(moves) = &opts.moves {
        for ch in moves.chars() {
            let Some(dir) = Direction::from_char(ch) else {
                eprintln!("Error: invalid move '{}' (expected U, D, L or R)", ch);
                std::process::exit(1);
            };
            let outcome = session.try_move(dir);
            if let MoveOutcome::Blocked(_) = outcome {
                println!("{}: {}", dir, outcome);
            }
        }
    }

    if let Some(steps) = opts.autoplay {
        for _ in 0..steps {
            if session.is_complete() {
                break;
            }
            if session.step_hint().is_none() {
                break;
            }
        }
    }

    print!("\n{}", render(session.board(), opts.show_free));
    print_hint(&session);
    if opts.show_pushes {
        print_pushes(session.board());
    }
    print_stats(&session, start.elapsed().as_millis());
}

fn summarize_level(level_num: usize, board: &Board, config: SearchConfig) -> bool {
    let start = Instant::now();
    let session = Session::new(board.duplicate(), config);
    let elapsed_ms = start.elapsed().as_millis();

    let (verdict, hinted) = match session.hint() {
        Some(hint) if hint.suggestion.push.is_some() => ('Y', true),
        Some(_) if session.is_complete() => ('Y', true),
        Some(_) => ('N', false),
        None => ('?', false),
    };
    let cost = session
        .hint()
        .map_or_else(|| "-".to_string(), |hint| hint.suggestion.cost.to_string());

    println!(
        "level: {:<3}  hint: {}  estimate: {:<10}  boards: {:<10}  elapsed: {} ms",
        level_num,
        verdict,
        cost,
        session.solver().len(),
        elapsed_ms
    );
    hinted
}

#[derive(Parser)]
#[command(name = "pushhint")]
#[command(about = "Push hints and dead-end detection for Sokoban levels", long_about = None)]
struct Args {
    /// Path to the levels file (XSB format)
    #[arg(value_name = "FILE")]
    levels_file: String,

    /// Level number to analyse (1-indexed), or start of range
    #[arg(value_name = "LEVEL")]
    level_start: usize,

    /// Optional end of level range (inclusive, 1-indexed)
    #[arg(value_name = "LEVEL_END")]
    level_end: Option<usize>,

    /// Moves to play before showing the hint, as a string of U, D, L and R
    #[arg(short, long)]
    moves: Option<String>,

    /// Follow the hint for up to this many moves
    #[arg(short, long, value_name = "N")]
    autoplay: Option<usize>,

    /// Mark cells the player can reach with '-'
    #[arg(short = 'f', long)]
    show_free: bool,

    /// List every legal push and whether it is safe
    #[arg(short = 'p', long)]
    show_pushes: bool,

    /// Maximum number of distinct boards to cache before giving up
    #[arg(short = 'n', long, default_value = "200000")]
    max_boards: usize,

    /// Maximum number of map cells held by cached boards
    #[arg(short = 'c', long, default_value = "20000000")]
    max_cells: usize,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load levels from file
    let levels = match Levels::from_file(&args.levels_file) {
        Ok(levels) => levels,
        Err(e) => {
            eprintln!("Error loading levels: {}", e);
            std::process::exit(1);
        }
    };

    let level_end = args.level_end.unwrap_or(args.level_start);

    if args.level_start == 0 {
        eprintln!("Error: level numbers must be at least 1");
        std::process::exit(1);
    }

    if level_end < args.level_start {
        eprintln!("Error: level end must be >= level start");
        std::process::exit(1);
    }

    if level_end > levels.len() {
        eprintln!(
            "Error: level {} not found (file contains {} levels)",
            level_end,
            levels.len()
        );
        std::process::exit(1);
    }

    let num_levels = level_end - args.level_start + 1;
    let interactive = args.moves.is_some() || args.autoplay.is_some();
    if interactive && num_levels > 1 {
        eprintln!("Error: moves and autoplay only supported for a single level");
        std::process::exit(1);
    }

    let config = SearchConfig {
        max_boards: args.max_boards,
        max_cells: args.max_cells,
    };

    if num_levels == 1 {
        let Some(board) = levels.get(args.level_start - 1) else {
            eprintln!("Error: level {} not found", args.level_start);
            std::process::exit(1);
        };
        let opts = PlayOpts {
            moves: args.moves,
            autoplay: args.autoplay,
            show_free: args.show_free,
            show_pushes: args.show_pushes,
        };
        play_level(board, config, &opts);
        return;
    }

    let mut total_hinted = 0;
    for level_num in args.level_start..=level_end {
        let Some(board) = levels.get(level_num - 1) else {
            continue;
        };
        if summarize_level(level_num, board, config) {
            total_hinted += 1;
        }
    }

    println!("---");
    println!("hinted: {:>3}/{:<3}", total_hinted, num_levels);
}
