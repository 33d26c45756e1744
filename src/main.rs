use std::path::PathBuf;

use clap::{Parser, Subcommand};

use line_caller::config::{Config, ServerConfig};
use line_caller::display::{format_player, render_history, render_line, render_roster};
use line_caller::roster::{Gender, PlayerEdit, PlayerId, Position, Preference};
use line_caller::rotation::{Context, PoolFilter, RatioSelection};
use line_caller::state::{Session, StateStore};
use line_caller::{logging, web};

/// Suggests balanced seven-player lines and keeps playing time fair
#[derive(Parser, Debug)]
#[command(name = "line-caller")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show or change the roster
    Roster {
        #[command(subcommand)]
        action: Option<RosterAction>,
    },

    /// Suggest a line for the next point
    Suggest,

    /// List players who could come onto the suggested line
    Pool {
        #[arg(short, long, value_parser = parse_gender)]
        gender: Option<Gender>,

        #[arg(short, long, value_parser = parse_position)]
        position: Option<Position>,
    },

    /// Record a point as played
    Confirm {
        /// Play exactly these players instead of the suggestion
        #[arg(long = "player")]
        players: Vec<String>,

        /// Swap players on the suggestion, as OUT:IN
        #[arg(long = "swap", value_parser = parse_swap)]
        swaps: Vec<(String, String)>,
    },

    /// Take back the last recorded point
    Undo,

    /// Set the ratio for the next points
    Ratio {
        /// 4M-3W, 3M-4W or auto
        selection: RatioSelection,
    },

    /// Set whether the next point is played on offense or defense
    Context {
        /// O or D
        context: Context,
    },

    /// Show recent points
    History,

    /// Write the full state as JSON
    Export {
        /// Output file (default: stdout)
        file: Option<PathBuf>,
    },

    /// Replace the state with a JSON file
    Import { file: PathBuf },

    /// Serve the JSON API
    Web {
        #[command(flatten)]
        server: ServerConfig,
    },
}

#[derive(Subcommand, Debug)]
enum RosterAction {
    /// Add a player
    Add {
        name: String,
        #[arg(value_parser = parse_gender)]
        gender: Gender,
        #[arg(short, long, value_parser = parse_position, default_value = "both")]
        position: Position,
        #[arg(long, value_parser = parse_pref, default_value = "either")]
        pref: Preference,
    },

    /// Change a player's details
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_parser = parse_gender)]
        gender: Option<Gender>,
        #[arg(long, value_parser = parse_position)]
        position: Option<Position>,
        #[arg(long, value_parser = parse_pref)]
        pref: Option<Preference>,
    },

    /// Toggle whether a player is available
    Available { id: String },

    /// Remove a player
    Delete { id: String },
}

fn parse_gender(s: &str) -> Result<Gender, String> {
    Gender::parse(s).ok_or_else(|| format!("unknown gender '{}', expected M or W", s))
}

fn parse_position(s: &str) -> Result<Position, String> {
    Position::parse(s).ok_or_else(|| format!("unknown position '{}'", s))
}

fn parse_pref(s: &str) -> Result<Preference, String> {
    Preference::parse(s).ok_or_else(|| format!("unknown preference '{}'", s))
}

fn parse_swap(s: &str) -> Result<(String, String), String> {
    s.split_once(':')
        .map(|(out, inc)| (out.trim().to_string(), inc.trim().to_string()))
        .filter(|(out, inc)| !out.is_empty() && !inc.is_empty())
        .ok_or_else(|| format!("expected OUT:IN, got '{}'", s))
}

fn run_roster(session: &mut Session, action: Option<RosterAction>) -> line_caller::Result<bool> {
    let Some(action) = action else {
        print!("{}", render_roster(session.roster()));
        return Ok(false);
    };
    match action {
        RosterAction::Add { name, gender, position, pref } => {
            let id = session.add_player(&name, gender, position, pref)?;
            println!("Added {} ({})", name.trim(), id);
        }
        RosterAction::Edit { id, name, gender, position, pref } => {
            session.edit_player(&PlayerId::new(id), PlayerEdit { name, gender, position, pref })?;
        }
        RosterAction::Available { id } => {
            let available = session.toggle_available(&PlayerId::new(id.as_str()))?;
            println!("{} is now {}", id, if available { "available" } else { "unavailable" });
        }
        RosterAction::Delete { id } => {
            let removed = session.delete_player(&PlayerId::new(id))?;
            println!("Deleted {}", removed.name);
        }
    }
    print!("{}", render_roster(session.roster()));
    Ok(true)
}

/// Builds the line to record: the given players, or the suggestion with swaps
fn build_line(
    session: &mut Session,
    players: Vec<String>,
    swaps: Vec<(String, String)>,
) -> line_caller::Result<()> {
    let any = PoolFilter::default();
    if players.is_empty() {
        session.suggest();
        for (out, inc) in swaps {
            session.substitute(Some(&PlayerId::new(out)), &PlayerId::new(inc), &any)?;
        }
    } else {
        session.clear_line();
        for id in players {
            session.substitute(None, &PlayerId::new(id), &any)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init(&args.config.log_filter);

    let store = StateStore::new(&args.config.state_path);
    let mut session = Session::new(store.load());

    let changed = match args.command {
        Commands::Web { server } => {
            println!("Starting web server on {}:{}...", server.host, server.port);
            println!("State file: {}", store.path().display());
            web::start_server(server, session, store).await?;
            return Ok(());
        }
        Commands::Roster { action } => run_roster(&mut session, action)?,
        Commands::Suggest => {
            session.suggest();
            println!("Next point: {} • {}", session.rotation().next_context, session.next_ratio());
            print!("{}", render_line(&session));
            false
        }
        Commands::Pool { gender, position } => {
            session.suggest();
            let filter = PoolFilter { gender, position };
            for p in session.substitution_pool(&filter) {
                println!("  {:<8} {}  Pts: {}", p.id.as_str(), format_player(p), p.points_played);
            }
            false
        }
        Commands::Confirm { players, swaps } => {
            build_line(&mut session, players, swaps)?;
            print!("{}", render_line(&session));
            match session.confirm() {
                Some(entry) => {
                    println!("Recorded point {} ({} • {})", session.history().len(), entry.context, entry.ratio);
                    true
                }
                None => {
                    println!("Line is empty, nothing recorded");
                    false
                }
            }
        }
        Commands::Undo => match session.undo() {
            Some(entry) => {
                println!("Undid point with {} players", entry.line.len());
                true
            }
            None => {
                println!("Nothing to undo");
                false
            }
        },
        Commands::Ratio { selection } => {
            session.select_ratio(selection);
            println!("Ratio: {} (next point {})", selection, session.next_ratio());
            true
        }
        Commands::Context { context } => {
            session.set_context(context);
            println!("Next point: {}", context);
            true
        }
        Commands::History => {
            print!("{}", render_history(session.history(), session.roster()));
            false
        }
        Commands::Export { file } => {
            let json = serde_json::to_string_pretty(&session.export())?;
            match file {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{}", json),
            }
            false
        }
        Commands::Import { file } => {
            let raw = std::fs::read_to_string(&file)?;
            let document: serde_json::Value = serde_json::from_str(&raw)?;
            session.import(&document)?;
            println!(
                "Imported {} players and {} points",
                session.roster().len(),
                session.history().len()
            );
            true
        }
    };

    if changed {
        store.save(session.state())?;
    }
    Ok(())
}
