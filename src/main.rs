mod animator;
mod config;
mod export;
mod loader;
mod models;
mod ui;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::AppConfig;
use crate::loader::load_all;

#[derive(Parser)]
#[command(name = "stock-replay", about = "Animated multi-company stock price replay", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Load all configured company CSVs and play the animation
    Play,

    /// Load the dataset and print its stats without animating
    Inspect,

    /// Dump every frame as NDJSON for an external encoder
    Export {
        /// Output path (default: export.out_path from config)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "stock_replay=info,warn",
        1 => "stock_replay=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Play => {
            let _t = utils::Timer::start("Price replay");
            let dataset = load_all(&config.data.companies)?;

            if config.export.enabled {
                let path = export::write_frames(&dataset, &config)?;
                info!("Frame dump written to {:?}", path);
            }

            info!(
                "Animating {} companies over {} frames",
                dataset.companies.len(),
                config.animation.frame_count
            );
            ui::run(&dataset, &config)?;
        }

        Command::Inspect => {
            let dataset = load_all(&config.data.companies)?;
            let (lo, hi) = dataset.price_axis_bounds();
            println!("─────────────────────────────────");
            println!("  Stock Replay — Dataset");
            println!("─────────────────────────────────");
            println!("  Companies : {}", dataset.companies.len());
            println!("  Points    : {}", utils::fmt_number(dataset.point_count() as i64));
            println!("  From      : {}", dataset.min_date);
            println!("  To        : {}", dataset.max_date);
            println!("  Price     : {} – {}", utils::fmt_usd(dataset.min_price), utils::fmt_usd(dataset.max_price));
            println!("  Y axis    : {} – {}", utils::fmt_usd(lo), utils::fmt_usd(hi));
            println!("─────────────────────────────────");
            for c in &dataset.companies {
                println!(
                    "  {:<12} {:>6} pts  {} → {}",
                    c.name,
                    c.points.len(),
                    c.first_date().map(|d| d.to_string()).unwrap_or("—".into()),
                    c.last_date().map(|d| d.to_string()).unwrap_or("—".into()),
                );
            }
        }

        Command::Export { out } => {
            let _t = utils::Timer::start("Frame export");
            let dataset = load_all(&config.data.companies)?;
            let path = match out {
                Some(out) => export::write_frames_to(&dataset, &config, &out)?,
                None => export::write_frames(&dataset, &config)?,
            };
            println!("Wrote {:?}", path);
        }
    }

    Ok(())
}
