// Squad optimizer entry point.
//
// Run sequence:
// 1. Initialize tracing (stderr)
// 2. Parse command-line arguments
// 3. Load squad configuration (TOML, or engine defaults)
// 4. Load the candidate pool CSV
// 5. Run the selection engine
// 6. Print the squad report (text, or JSON with --json)

use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

use squad_optimizer::config::{self, SquadConfig};
use squad_optimizer::optimize::{self, LpSolver, SquadResult};
use squad_optimizer::pool;

struct CliArgs {
    players_path: PathBuf,
    config_path: Option<PathBuf>,
    json: bool,
}

const USAGE: &str = "usage: squadopt <players.csv> [--config squad.toml] [--json]";

fn main() -> anyhow::Result<()> {
    init_tracing().context("failed to initialize tracing")?;

    let args = parse_args(std::env::args().skip(1).collect())
        .map_err(|message| anyhow::anyhow!("{message}\n{USAGE}"))?;

    let config = match &args.config_path {
        Some(path) => config::load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SquadConfig::default(),
    };
    info!(
        budget = config.total_budget,
        max_per_club = config.max_per_club,
        "configuration ready"
    );

    let pool = pool::load_players_csv(&args.players_path).with_context(|| {
        format!("failed to load players from {}", args.players_path.display())
    })?;
    info!(players = pool.len(), clubs = pool.clubs().len(), "candidate pool loaded");

    let result = optimize::select_squad(&pool, &config, &LpSolver)
        .context("squad selection failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result);
    }

    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<CliArgs, String> {
    let mut players_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut json = false;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--config requires a path".to_string())?;
                config_path = Some(PathBuf::from(value));
            }
            "--json" => json = true,
            other if other.starts_with("--") => {
                return Err(format!("unknown flag `{other}`"));
            }
            other => {
                if players_path.is_some() {
                    return Err(format!("unexpected extra argument `{other}`"));
                }
                players_path = Some(PathBuf::from(other));
            }
        }
    }

    Ok(CliArgs {
        players_path: players_path.ok_or_else(|| "missing players CSV path".to_string())?,
        config_path,
        json,
    })
}

fn print_report(result: &SquadResult) {
    println!("status: {:?}", result.status);
    if result.starters.is_empty() {
        println!("no legal squad could be assembled from this pool");
        return;
    }

    println!("\nstarting lineup:");
    for player in &result.starters {
        println!(
            "  {:<4} {:<24} {:<16} {:>5.1}  {:>6.2}",
            player.position.display_str(),
            player.id,
            player.club,
            player.cost,
            player.projected_points
        );
    }
    println!("\nbench:");
    for player in &result.substitutes {
        println!(
            "  {:<4} {:<24} {:<16} {:>5.1}  {:>6.2}",
            player.position.display_str(),
            player.id,
            player.club,
            player.cost,
            player.projected_points
        );
    }
    println!(
        "\ntotal cost: {:.1}   projected points: {:.2}",
        result.total_cost, result.total_projected_points
    );
}

/// Initialize tracing to stderr so stdout stays clean for the report.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("squad_optimizer=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
