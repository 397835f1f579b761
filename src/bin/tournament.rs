use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use trains::config::TournamentConfig;
use trains::manager::{Manager, TournamentResult};
use trains::participant::Participant;

#[derive(Debug, Parser)]
#[command(name = "tournament")]
#[command(about = "Runs a knock-out Trains tournament between built-in strategies")]
struct Args {
    /// Tournament configuration, in JSON
    #[arg(short, long)]
    config: PathBuf,

    /// Random seed, overriding the configuration's
    #[arg(long)]
    seed: Option<u64>,

    /// Log every game and turn
    #[arg(short, long)]
    verbose: bool,
}

fn log(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();

    // Results go to stdout, so logs stay on stderr.
    if simplelog::TermLogger::init(
        level,
        config,
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )
    .is_err()
    {
        eprintln!("a logger was already set");
    }
}

fn run(args: &Args) -> Result<TournamentResult, Box<dyn Error>> {
    let config = TournamentConfig::load(&args.config)?;
    let mut rng = StdRng::seed_from_u64(args.seed.unwrap_or(config.seed));

    let mut players = config.players()?;
    let deck = config.deck(&mut rng);
    let participants: Vec<&mut dyn Participant> = players
        .iter_mut()
        .map(|player| player as &mut dyn Participant)
        .collect();

    let mut manager = Manager::new(participants, deck, rng)?;
    if config.use_default_map {
        manager = manager.with_fallback_map(config.default_map()?);
    }

    Ok(manager.run()?)
}

fn main() -> ExitCode {
    let args = Args::parse();
    log(args.verbose);

    match run(&args).and_then(|result| Ok(serde_json::to_string_pretty(&result)?)) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
