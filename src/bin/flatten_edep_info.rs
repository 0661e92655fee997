//! Flatten simulated events into one summary record per event.
//!
//! ```bash
//! flatten_edep_info sim_output.json flat_output.jsonl volumes.txt
//! ```
//!
//! The volume list has one volume name per line; lines starting with `#` are
//! comments. Without a volume list only channel and primary information is
//! extracted. Set `RUST_LOG` to control verbosity (default `info`).
use anyhow::{Context, Result};
use clap::Parser;
use edep::sink::{JsonLinesSink, RecordSink};
use edep::volumes::VolumeFilterSet;
use edep::Aggregator;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flatten_edep_info")]
#[command(about = "Flatten per-event energy deposit and waveform information", long_about = None)]
struct Cli {
    /// JSON file with `daq_events` and `truth_events` collections
    input: PathBuf,
    /// Output file, one JSON record per line
    output: PathBuf,
    /// Optional text file with volume names (one per line)
    volumes: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let records_written = run(&cli)?;
    info!(records_written, output = %cli.output.display(), "done");

    Ok(())
}

/// Flatten the input file into the output file and return the number of
/// records written. On failure no output file is left behind.
fn run(cli: &Cli) -> Result<usize> {
    let volumes = match &cli.volumes {
        Some(path) => {
            info!(path = %path.display(), "reading volume names");
            let volumes = VolumeFilterSet::load_or_empty(path)
                .with_context(|| format!("invalid volumes file `{}`", path.display()))?;
            info!(n_volumes = volumes.len(), "found volumes");
            volumes
        }
        None => {
            info!("no volumes file provided, extracting channel and primary info only");
            VolumeFilterSet::new()
        }
    };
    for volume in volumes.iter() {
        info!(volume, "volume to extract");
    }
    info!(input = %cli.input.display(), output = %cli.output.display(), "starting");

    let (daq, truth) = edep::input::open(&cli.input)?;

    let file = File::create(&cli.output)
        .with_context(|| format!("cannot create output file `{}`", cli.output.display()))?;
    let result = Aggregator::builder()
        .volumes(&volumes)
        .sink(JsonLinesSink::new(BufWriter::new(file)))
        .build()
        .run(&daq, &truth);

    match result {
        Ok(sink) => Ok(sink.count_written()),
        Err(error) => {
            discard(&cli.output);
            Err(error.into())
        }
    }
}

// A partially written output is not a valid output.
fn discard(path: &Path) {
    if let Err(error) = std::fs::remove_file(path) {
        tracing::warn!(path = %path.display(), %error, "cannot remove partial output file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const INPUT: &str = r#"{
        "daq_events": [
            [{"waveforms": [{"chid": 0, "samples": [1, 2], "sample_period": 1.0}]}],
            []
        ],
        "truth_events": [
            {"segment_detectors": {"TPC": [{"volume": "LArVol", "energy_deposit": 0.5}]}},
            {}
        ]
    }"#;

    fn cli(dir: &TempDir, input: &str, volumes: Option<&str>) -> Cli {
        let path = dir.path().join("input.json");
        std::fs::write(&path, input).unwrap();

        Cli {
            input: path,
            output: dir.path().join("output.jsonl"),
            volumes: volumes.map(|name| dir.path().join(name)),
        }
    }

    #[test]
    fn cli_writes_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("volumes.txt"), "LArVol\n").unwrap();
        let cli = cli(&dir, INPUT, Some("volumes.txt"));

        assert_eq!(run(&cli).unwrap(), 2);

        let output = std::fs::read_to_string(&cli.output).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(r#""edep_LArVol":0.5}"#));
    }

    #[test]
    fn cli_missing_volumes_file() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli(&dir, INPUT, Some("missing.txt"));

        assert_eq!(run(&cli).unwrap(), 2);

        let output = std::fs::read_to_string(&cli.output).unwrap();
        assert_eq!(output.lines().count(), 2);
        assert!(!output.contains("edep_"));
    }

    #[test]
    fn cli_removes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli(
            &dir,
            r#"{"daq_events": [[], "oops"], "truth_events": [{}, {}]}"#,
            None,
        );

        assert!(run(&cli).is_err());
        assert!(!cli.output.exists());
    }

    #[test]
    fn cli_missing_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            input: dir.path().join("missing.json"),
            output: dir.path().join("output.jsonl"),
            volumes: None,
        };

        assert!(run(&cli).is_err());
        assert!(!cli.output.exists());
    }
}
