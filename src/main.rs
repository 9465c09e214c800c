use std::process;
use std::time::Duration;

use clap::{App, Arg};

use sokoban_fess::config::{Method, SolverConfig};
use sokoban_fess::{LoadLevel, Solve};

fn main() {
    env_logger::init();

    let matches = App::new("sokoban-fess")
        .version("0.1.0")
        .about("Sokoban solver - feature-space search (FESS) with an A* fallback")
        .arg(
            Arg::with_name("method")
                .short("m")
                .long("method")
                .takes_value(true)
                .possible_values(&["fess", "astar"])
                .default_value("fess")
                .help("Which search engine to use"),
        )
        .arg(
            Arg::with_name("max-states")
                .long("max-states")
                .takes_value(true)
                .help("Give up after storing this many states"),
        )
        .arg(
            Arg::with_name("time-limit")
                .long("time-limit")
                .takes_value(true)
                .help("Give up after this many seconds"),
        )
        .arg(
            Arg::with_name("stats")
                .long("stats")
                .help("Print search statistics"),
        )
        .arg(Arg::with_name("file").required(true))
        .get_matches();

    let method = match matches.value_of("method").unwrap() {
        "astar" => Method::AStar,
        _ => Method::Fess,
    };

    let defaults = SolverConfig::default();
    let max_states = match matches.value_of("max-states") {
        Some(s) => s.parse().unwrap_or_else(|_| {
            eprintln!("--max-states must be a number");
            process::exit(2);
        }),
        None => defaults.max_states,
    };
    let time_limit = match matches.value_of("time-limit") {
        Some(s) => {
            let secs: u64 = s.parse().unwrap_or_else(|_| {
                eprintln!("--time-limit must be a number of seconds");
                process::exit(2);
            });
            Duration::from_secs(secs)
        }
        None => defaults.time_limit,
    };
    let config = SolverConfig::new(max_states, time_limit).unwrap_or_else(|err| {
        eprintln!("Invalid configuration: {}", err);
        process::exit(2);
    });

    let path = matches.value_of("file").unwrap();
    let level = path.load_level().unwrap_or_else(|err| {
        eprintln!("Can't load level {}: {}", path, err);
        process::exit(1);
    });

    println!("Solving {} using {}...", path, method);
    let result = level.solve(method, config, true).unwrap_or_else(|err| {
        eprintln!("Level can't be processed: {}", err);
        process::exit(1);
    });

    match result.moves {
        Some(ref moves) => {
            println!("Found solution: {}", moves);
            println!("Moves: {}", moves.move_cnt());
        }
        None => {
            println!("No solution: {}", result.failure.unwrap());
        }
    }
    if matches.is_present("stats") {
        print!("{}", result.stats);
    }
}
