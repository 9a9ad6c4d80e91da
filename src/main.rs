use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use gps_tracker::config::{parse_period, Config};
use gps_tracker::console::{parse_line, ConsoleCommand};
use gps_tracker::export::{export_track, DirectorySink};
use gps_tracker::projection::{project_track, PixelPoint, ProjectedTrack, Viewport};
use gps_tracker::render::{render_svg, HEADING_MARKER_LENGTH};
use gps_tracker::sampler::{Sampler, SamplerError, SensorFeed};
use gps_tracker::track_log::TrackLog;

#[derive(Parser)]
#[command(name = "gps-tracker")]
#[command(about = "Record, plot and export GPS tracks")]
struct Cli {
    /// Configuration file (YAML)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample fixes fed on stdin into the track log
    Record {
        /// Sampling period, e.g. 2s
        #[arg(long)]
        period: Option<String>,
    },
    /// Print the track log
    Show,
    /// Export the track log as GPX
    Export {
        /// Destination directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Remove all recorded fixes
    Clear,
    /// Project the track into a viewport
    Plot {
        #[arg(long)]
        width: Option<f64>,
        #[arg(long)]
        height: Option<f64>,
        /// Device heading in degrees clockwise from north
        #[arg(long)]
        bearing: Option<f64>,
        #[arg(long, value_enum, default_value_t = PlotFormat::Svg)]
        format: PlotFormat,
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PlotFormat {
    Svg,
    Json,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    match cli.command {
        Commands::Record { period } => record(&config, period.as_deref()),
        Commands::Show => show(&config),
        Commands::Export { out } => export(&config, out),
        Commands::Clear => clear(&config),
        Commands::Plot {
            width,
            height,
            bearing,
            format,
            output,
        } => plot(&config, width, height, bearing, format, output),
    }
}

fn record(config: &Config, period: Option<&str>) -> ExitCode {
    let period = match period.map(parse_period).unwrap_or_else(|| config.sampler.period()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(record_session(config, period));
    // A pending stdin read must not hold up exit.
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Recording failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn record_session(config: &Config, period: Duration) -> Result<(), SamplerError> {
    let log = Arc::new(TrackLog::new(&config.log.path));
    let feed = SensorFeed::new();
    let mut sampler = Sampler::new(
        log.clone(),
        feed.clone(),
        config.sampler.altitude.source(),
        period,
    );

    log::info!(
        "Recording to {} ({} altitude)",
        config.log.path.display(),
        config.sampler.altitude
    );
    sampler.start().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("Failed to read input: {}", e);
                break;
            }
        };

        let command = match parse_line(&line, chrono::Utc::now().timestamp_millis()) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        match command {
            ConsoleCommand::Fix(reading) => feed.push_position(reading),
            ConsoleCommand::Pressure(hpa) => feed.push_pressure(hpa),
            ConsoleCommand::Bearing(deg) => feed.push_bearing(deg),
            ConsoleCommand::Plot(path) => {
                let track = project_log(&log, &config.viewport);
                let svg = render_svg(track.as_ref(), &config.viewport, feed.bearing());
                match fs::write(&path, svg) {
                    Ok(()) => println!("Plot written to {}", path.display()),
                    Err(e) => eprintln!("Error writing {}: {}", path.display(), e),
                }
            }
            ConsoleCommand::Pause => sampler.stop(),
            ConsoleCommand::Resume => sampler.resume().await?,
            ConsoleCommand::Clear => {
                if let Err(e) = log.clear() {
                    eprintln!("Error clearing track log: {}", e);
                }
            }
            ConsoleCommand::Export => {
                let sink = DirectorySink::new(&config.export.directory);
                match export_track(&log, &sink) {
                    Ok(report) => println!(
                        "GPX file written to {} ({} points)",
                        sink.dir().join(&report.file_name).display(),
                        report.stats.points
                    ),
                    Err(e) => eprintln!("Error exporting GPX file: {}", e),
                }
            }
            ConsoleCommand::Status => {
                let status = sampler.status();
                println!(
                    "state={} appended={} duplicates={} failed={}",
                    status.state, status.appended, status.duplicates, status.failed
                );
                if let Some(fix) = status.last_fix {
                    println!(
                        "last fix: {:.6}, {:.6}, {:.2} m",
                        fix.latitude, fix.longitude, fix.altitude
                    );
                }
                if let Some(deg) = feed.bearing() {
                    println!("heading: {:.1}°", deg);
                }
            }
            ConsoleCommand::Quit => break,
        }
    }

    sampler.shutdown().await?;
    log::info!("Recording finished");
    Ok(())
}

fn show(config: &Config) -> ExitCode {
    match TrackLog::new(&config.log.path).contents() {
        Ok(Some(contents)) => {
            print!("{}", contents);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            println!("No CSV data found.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error reading CSV file: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn export(config: &Config, out: Option<PathBuf>) -> ExitCode {
    let log = TrackLog::new(&config.log.path);
    let sink = DirectorySink::new(out.unwrap_or_else(|| config.export.directory.clone()));

    match export_track(&log, &sink) {
        Ok(report) => {
            println!(
                "GPX file written to {} ({} points, {} rows skipped)",
                sink.dir().join(&report.file_name).display(),
                report.stats.points,
                report.stats.skipped
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error exporting GPX file: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn clear(config: &Config) -> ExitCode {
    match TrackLog::new(&config.log.path).clear() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error clearing track log: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn project_log(log: &TrackLog, viewport: &Viewport) -> Option<ProjectedTrack> {
    let points: Vec<_> = log.points().collect();
    let track = project_track(&points, viewport);
    if track.is_none() {
        log::info!("No track points to plot");
    }
    track
}

#[derive(Serialize)]
struct PlotOutput<'a> {
    viewport: Viewport,
    track: Option<&'a ProjectedTrack>,
    heading: Option<PixelPoint>,
}

fn plot(
    config: &Config,
    width: Option<f64>,
    height: Option<f64>,
    bearing: Option<f64>,
    format: PlotFormat,
    output: Option<PathBuf>,
) -> ExitCode {
    let viewport = Viewport {
        width: width.unwrap_or(config.viewport.width),
        height: height.unwrap_or(config.viewport.height),
        padding: config.viewport.padding,
    };

    let track = project_log(&TrackLog::new(&config.log.path), &viewport);

    let rendered = match format {
        PlotFormat::Svg => render_svg(track.as_ref(), &viewport, bearing),
        PlotFormat::Json => {
            let heading = track
                .as_ref()
                .zip(bearing)
                .and_then(|(t, b)| t.heading_marker(b, HEADING_MARKER_LENGTH));
            let out = PlotOutput {
                viewport,
                track: track.as_ref(),
                heading,
            };
            match serde_json::to_string_pretty(&out) {
                Ok(json) => json + "\n",
                Err(e) => {
                    eprintln!("Error serializing plot: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
    };

    match output {
        Some(path) => match fs::write(&path, rendered) {
            Ok(()) => {
                println!("Plot written to {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error writing {}: {}", path.display(), e);
                ExitCode::FAILURE
            }
        },
        None => {
            print!("{}", rendered);
            ExitCode::SUCCESS
        }
    }
}
