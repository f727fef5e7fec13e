/// CLI tool for the description engine
use description_engine::diagnostic::report_markup_diagnostic;
use description_engine::parser::parse;
use description_engine::{
    insert_item_detailed, remove_item_detailed, render, resolve_procedural, Diagnostics,
    EditOutcome, Entity, GameContext, Item, RenderOptions, Scope,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum CliError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("missing value for {0}")]
    MissingValue(String),
    #[error("missing input file")]
    MissingInput,
    #[error("invalid number '{value}' for {option}")]
    InvalidNumber { option: String, value: String },
    #[error("--item expects <single>|<plural>, got '{0}'")]
    InvalidItem(String),
    #[error("the {0} command needs --item")]
    MissingItem(&'static str),
    #[error("--receiver expects <kind>:<name>, got '{0}'")]
    InvalidReceiver(String),
    #[error("no {kind} named '{name}' in the context")]
    UnknownEntity { kind: String, name: String },
    #[error("error reading '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("error parsing context '{path}': {source}")]
    Context {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("error writing JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Render,
    Insert,
    Remove,
    Procedural,
}

#[derive(Debug)]
struct Args {
    command: Command,
    input: String,
    context: Option<String>,
    receiver: Option<String>,
    player: Option<String>,
    seed: Option<u64>,
    item: Option<Item>,
    list: String,
    quantity: Option<u32>,
    json: bool,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  describe render <file> [options]       Render a description to text");
    eprintln!("  describe insert <file> --item <s>|<p>  Add an item to an item list");
    eprintln!("  describe remove <file> --item <s>|<p>  Take an item out of an item list");
    eprintln!("  describe procedural <file> [--seed n]  Settle procedural blocks");
    eprintln!("  describe --help                        Show this help message");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  <file>                  Path to a description, or - for stdin");
    eprintln!("  --context <json>        Game snapshot used by expressions");
    eprintln!("  --receiver <kind>:<name>  Entity bound to 'this' (room, object, item, puzzle,");
    eprintln!("                          prefab, player, inventory, event, status)");
    eprintln!("  --player <name>         Player bound to 'player'");
    eprintln!("  --seed <n>              Seed for procedural blocks (default: random)");
    eprintln!("  --item <single>|<plural>  Phrases for one unit and for several units");
    eprintln!("  --list <name>           Item list to edit (default: the unnamed list)");
    eprintln!("  --quantity <n>          Units to add or remove (remove: default whole clause)");
    eprintln!("  --json                  Print the full result as JSON");
    eprintln!();
    eprintln!("Logging is controlled with DESCRIBE_LOG (default: warn).");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  describe render room.desc --context game.json --receiver room:kitchen");
    eprintln!("  describe insert shelf.desc --item 'a bottle of RUM|bottles of RUM' --quantity 2");
}

fn parse_number<T: std::str::FromStr>(option: &str, value: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::InvalidNumber {
        option: option.to_string(),
        value: value.to_string(),
    })
}

fn parse_item(value: &str) -> Result<Item, CliError> {
    let (single, plural) = value
        .split_once('|')
        .filter(|(single, plural)| !single.trim().is_empty() && !plural.trim().is_empty())
        .ok_or_else(|| CliError::InvalidItem(value.to_string()))?;
    Ok(Item::new(single.trim(), single.trim(), plural.trim()))
}

fn parse_args(args: &[String]) -> Result<Args, CliError> {
    let command = match args.first().map(String::as_str) {
        Some("render") => Command::Render,
        Some("insert") => Command::Insert,
        Some("remove") => Command::Remove,
        Some("procedural") => Command::Procedural,
        Some(other) => return Err(CliError::UnknownCommand(other.to_string())),
        None => return Err(CliError::MissingInput),
    };

    let mut parsed = Args {
        command,
        input: String::new(),
        context: None,
        receiver: None,
        player: None,
        seed: None,
        item: None,
        list: String::new(),
        quantity: None,
        json: false,
    };

    let mut rest = args[1..].iter();
    while let Some(arg) = rest.next() {
        if arg == "--json" {
            parsed.json = true;
            continue;
        }
        if !arg.starts_with("--") {
            parsed.input = arg.clone();
            continue;
        }
        let value = rest
            .next()
            .ok_or_else(|| CliError::MissingValue(arg.clone()))?;
        match arg.as_str() {
            "--context" => parsed.context = Some(value.clone()),
            "--receiver" => parsed.receiver = Some(value.clone()),
            "--player" => parsed.player = Some(value.clone()),
            "--seed" => parsed.seed = Some(parse_number(arg, value)?),
            "--item" => parsed.item = Some(parse_item(value)?),
            "--list" => parsed.list = value.clone(),
            "--quantity" => parsed.quantity = Some(parse_number(arg, value)?),
            _ => return Err(CliError::UnknownOption(arg.clone())),
        }
    }

    if parsed.input.is_empty() {
        return Err(CliError::MissingInput);
    }
    Ok(parsed)
}

fn read_source(path: &str) -> Result<String, CliError> {
    if path == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|source| CliError::Read {
                path: "<stdin>".to_string(),
                source,
            })?;
        return Ok(buffer);
    }
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_string(),
        source,
    })
}

fn load_context(path: Option<&str>) -> Result<GameContext, CliError> {
    let Some(path) = path else {
        return Ok(GameContext::default());
    };
    let text = read_source(path)?;
    serde_json::from_str(&text).map_err(|source| CliError::Context {
        path: path.to_string(),
        source,
    })
}

fn resolve_receiver<'a>(game: &'a GameContext, spec: &str) -> Result<Entity<'a>, CliError> {
    let (kind, name) = spec
        .split_once(':')
        .ok_or_else(|| CliError::InvalidReceiver(spec.to_string()))?;
    let found = match kind {
        "room" => game.find_room(name).map(Entity::Room),
        "object" => game.find_object(name, None).map(Entity::Object),
        "item" => game.find_item(name, None, None).map(Entity::Item),
        "prefab" => game.find_prefab(name).map(Entity::Prefab),
        "puzzle" => game.find_puzzle(name, None).map(Entity::Puzzle),
        "player" => game.find_player(name).map(Entity::Player),
        "inventory" => game
            .find_inventory_item(name, None, None, None)
            .map(Entity::InventoryItem),
        "event" => game.find_event(name).map(Entity::Event),
        "status" => game.find_status_effect(name).map(Entity::StatusEffect),
        _ => return Err(CliError::InvalidReceiver(spec.to_string())),
    };
    found.ok_or_else(|| CliError::UnknownEntity {
        kind: kind.to_string(),
        name: name.to_string(),
    })
}

/// Print markup problems as labelled reports, returning their messages
fn report_markup(source_name: &str, source: &str) -> HashSet<String> {
    let mut reported = HashSet::new();
    for diagnostic in &parse(source).diagnostics {
        eprint!(
            "{}",
            report_markup_diagnostic(source_name, source, diagnostic)
        );
        reported.insert(diagnostic.to_string());
    }
    reported
}

/// Print whatever the labelled reports did not already cover
fn print_diagnostics(diagnostics: &Diagnostics, reported: &HashSet<String>) {
    for warning in diagnostics.warnings.iter().filter(|w| !reported.contains(*w)) {
        eprintln!("warning: {}", warning);
    }
    for error in diagnostics.errors.iter().filter(|e| !reported.contains(*e)) {
        eprintln!("error: {}", error);
    }
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn run(args: &Args) -> Result<String, CliError> {
    let source = read_source(&args.input)?;
    let source_name = if args.input == "-" {
        "<stdin>"
    } else {
        args.input.as_str()
    };
    let reported = report_markup(source_name, &source);

    match args.command {
        Command::Render => {
            let game = load_context(args.context.as_deref())?;
            let mut scope = Scope::new(&game);
            if let Some(receiver) = &args.receiver {
                scope = scope.with_receiver(resolve_receiver(&game, receiver)?);
            }
            if let Some(name) = &args.player {
                let player = game.find_player(name).ok_or_else(|| CliError::UnknownEntity {
                    kind: "player".to_string(),
                    name: name.clone(),
                })?;
                scope = scope.with_player(player);
            }

            let rendered = render(&source, &scope, RenderOptions::new(rng_for(args.seed)));
            if args.json {
                return Ok(serde_json::to_string_pretty(&rendered)?);
            }
            let diagnostics = Diagnostics {
                warnings: rendered.warnings,
                errors: rendered.errors,
            };
            print_diagnostics(&diagnostics, &reported);
            Ok(rendered.text)
        }
        Command::Insert | Command::Remove => {
            let item = args.item.as_ref().ok_or(CliError::MissingItem(
                if args.command == Command::Insert {
                    "insert"
                } else {
                    "remove"
                },
            ))?;
            let outcome: EditOutcome = if args.command == Command::Insert {
                insert_item_detailed(&source, item, &args.list, args.quantity.unwrap_or(1))
            } else {
                remove_item_detailed(&source, item, &args.list, args.quantity)
            };
            tracing::info!(status = ?outcome.status, "edit finished");
            if args.json {
                return Ok(serde_json::to_string_pretty(&outcome)?);
            }
            print_diagnostics(&outcome.diagnostics, &reported);
            Ok(outcome.markup)
        }
        Command::Procedural => {
            let mut rng = rng_for(args.seed);
            Ok(resolve_procedural(&source, &mut rng))
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("DESCRIBE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    if args.is_empty() {
        print_usage();
        process::exit(1);
    }

    if args[0] == "--help" || args[0] == "-h" {
        print_usage();
        process::exit(0);
    }

    let parsed = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage();
        process::exit(1);
    });

    match run(&parsed) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
