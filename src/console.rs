//! Line protocol read from stdin while recording. Stands in for the platform
//! location and pressure callbacks and for the start/pause/clear controls.
//!
//! ```text
//! fix <lat> <lon> [alt] [time_ms]
//! pressure <hPa>
//! bearing <deg>
//! plot <file.svg>
//! pause | resume | clear | export | status | quit
//! ```
//!
//! The last `bearing` orients the heading marker drawn by `plot`.

use std::path::PathBuf;

use thiserror::Error;

use crate::sampler::PositionReading;

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Fix(PositionReading),
    Pressure(f64),
    Bearing(f64),
    Plot(PathBuf),
    Pause,
    Resume,
    Clear,
    Export,
    Status,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConsoleError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("{command}: expected {expected}")]
    Arguments {
        command: &'static str,
        expected: &'static str,
    },
    #[error("invalid number: {0}")]
    Number(String),
}

/// Parses one input line. Blank lines and `#` comments yield `Ok(None)`.
/// `now_ms` stamps fixes that carry no time of their own.
pub fn parse_line(line: &str, now_ms: i64) -> Result<Option<ConsoleCommand>, ConsoleError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match head.to_lowercase().as_str() {
        "fix" => {
            if !(2..=4).contains(&args.len()) {
                return Err(ConsoleError::Arguments {
                    command: "fix",
                    expected: "<lat> <lon> [alt] [time_ms]",
                });
            }
            let latitude = number(args[0])?;
            let longitude = number(args[1])?;
            if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
                return Err(ConsoleError::Number(format!("{} {}", args[0], args[1])));
            }
            let altitude = args.get(2).map(|a| number(a)).transpose()?;
            let timestamp = args
                .get(3)
                .map(|t| t.parse::<i64>().map_err(|_| ConsoleError::Number(t.to_string())))
                .transpose()?
                .unwrap_or(now_ms);
            ConsoleCommand::Fix(PositionReading {
                timestamp,
                latitude,
                longitude,
                altitude,
            })
        }
        "pressure" => {
            let hpa = single(&args, "pressure", "<hPa>")?;
            if hpa <= 0.0 {
                return Err(ConsoleError::Number(args[0].to_string()));
            }
            ConsoleCommand::Pressure(hpa)
        }
        "bearing" => ConsoleCommand::Bearing(single(&args, "bearing", "<deg>")?),
        "plot" => match args.as_slice() {
            [path] => ConsoleCommand::Plot(PathBuf::from(path)),
            _ => {
                return Err(ConsoleError::Arguments {
                    command: "plot",
                    expected: "<file.svg>",
                })
            }
        },
        "pause" | "stop" => ConsoleCommand::Pause,
        "resume" | "start" => ConsoleCommand::Resume,
        "clear" => ConsoleCommand::Clear,
        "export" => ConsoleCommand::Export,
        "status" => ConsoleCommand::Status,
        "quit" | "exit" => ConsoleCommand::Quit,
        _ => return Err(ConsoleError::UnknownCommand(head.to_string())),
    };

    Ok(Some(command))
}

fn single(
    args: &[&str],
    command: &'static str,
    expected: &'static str,
) -> Result<f64, ConsoleError> {
    match args {
        [value] => number(value),
        _ => Err(ConsoleError::Arguments { command, expected }),
    }
}

fn number(s: &str) -> Result<f64, ConsoleError> {
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConsoleError::Number(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fix_with_defaults() {
        let cmd = parse_line("fix 52.5 13.4", 42).unwrap().unwrap();
        assert_eq!(
            cmd,
            ConsoleCommand::Fix(PositionReading {
                timestamp: 42,
                latitude: 52.5,
                longitude: 13.4,
                altitude: None,
            })
        );
    }

    #[test]
    fn fix_with_altitude_and_time() {
        let cmd = parse_line("  FIX 52.5 13.4 34 1000 ", 42).unwrap().unwrap();
        assert_eq!(
            cmd,
            ConsoleCommand::Fix(PositionReading {
                timestamp: 1000,
                latitude: 52.5,
                longitude: 13.4,
                altitude: Some(34.0),
            })
        );
    }

    #[test]
    fn lifecycle_words() {
        assert_eq!(parse_line("pause", 0).unwrap(), Some(ConsoleCommand::Pause));
        assert_eq!(parse_line("resume", 0).unwrap(), Some(ConsoleCommand::Resume));
        assert_eq!(parse_line("quit", 0).unwrap(), Some(ConsoleCommand::Quit));
        assert_eq!(
            parse_line("pressure 1000.5", 0).unwrap(),
            Some(ConsoleCommand::Pressure(1000.5))
        );
    }

    #[test]
    fn blank_and_comment_lines() {
        assert_eq!(parse_line("   ", 0).unwrap(), None);
        assert_eq!(parse_line("# note", 0).unwrap(), None);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            parse_line("teleport", 0),
            Err(ConsoleError::UnknownCommand("teleport".into()))
        );
        assert!(matches!(parse_line("fix 1", 0), Err(ConsoleError::Arguments { .. })));
        assert!(matches!(parse_line("fix 95 13", 0), Err(ConsoleError::Number(_))));
        assert!(matches!(parse_line("bearing NaN", 0), Err(ConsoleError::Number(_))));
        assert!(matches!(parse_line("pressure", 0), Err(ConsoleError::Arguments { .. })));
    }

    #[test]
    fn pressure_must_be_positive() {
        assert_eq!(parse_line("pressure 0", 0), Err(ConsoleError::Number("0".into())));
        assert_eq!(parse_line("pressure -3", 0), Err(ConsoleError::Number("-3".into())));
    }

    #[test]
    fn plot_takes_one_path() {
        assert_eq!(
            parse_line("plot track.svg", 0).unwrap(),
            Some(ConsoleCommand::Plot(PathBuf::from("track.svg")))
        );
        assert!(matches!(parse_line("plot", 0), Err(ConsoleError::Arguments { .. })));
        assert!(matches!(parse_line("plot a b", 0), Err(ConsoleError::Arguments { .. })));
    }
}
