use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{io_utils::FileFormat, review::Override};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Match the columns of a CSV export to a template schema",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Suggest a source column for every template column
    Map(MapArgs),
    /// Map a source file onto the template and write the result
    Apply(ApplyArgs),
    /// Describe the columns of a dataset and flag overlapping values
    Profile(ProfileArgs),
    /// Summarize a saved configuration and check it against datasets
    Inspect(InspectArgs),
}

/// Options shared by every command that reads datasets.
#[derive(Debug, Args, Clone, Default)]
pub struct InputOptions {
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Input format; inferred from the file extension when omitted
    #[arg(long = "input-format", value_enum)]
    pub input_format: Option<FileFormat>,
}

#[derive(Debug, Args, Clone)]
pub struct MatchOptions {
    /// Source dataset to map (use '-' for stdin)
    #[arg(short, long)]
    pub source: PathBuf,
    /// Template dataset whose columns define the target schema
    #[arg(short, long)]
    pub template: PathBuf,
    /// YAML settings file with thresholds and extra vocabulary
    #[arg(long)]
    pub settings: Option<PathBuf>,
    /// Minimum header score (0-100) for a name-based match
    #[arg(long)]
    pub threshold: Option<f64>,
    /// Skip the value-pattern matching pass
    #[arg(long = "no-patterns")]
    pub no_patterns: bool,
    /// Force a mapping, e.g. `--set "Email=contact_mail"`
    #[arg(long = "set", value_name = "TARGET=SOURCE", action = clap::ArgAction::Append)]
    pub set: Vec<Override>,
    /// Leave a target column unmapped
    #[arg(long = "unset", value_name = "TARGET", action = clap::ArgAction::Append)]
    pub unset: Vec<String>,
    /// Start from a saved configuration instead of matching from scratch
    #[arg(long)]
    pub reuse: Option<PathBuf>,
    /// Seed for contamination sampling
    #[arg(long)]
    pub seed: Option<u64>,
    #[command(flatten)]
    pub input: InputOptions,
}

#[derive(Debug, Args)]
pub struct MapArgs {
    #[command(flatten)]
    pub matching: MatchOptions,
    /// Write the resulting mapping as a reusable configuration
    #[arg(long = "save-config")]
    pub save_config: Option<PathBuf>,
    /// Print the mapping as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub matching: MatchOptions,
    /// Output file path (use '-' for stdout)
    #[arg(short, long)]
    pub output: PathBuf,
    /// Output format; inferred from the output extension when omitted
    #[arg(long, value_enum)]
    pub format: Option<FileFormat>,
    /// Delimiter for delimited output (defaults to the input delimiter)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Write the mapping used as a reusable configuration
    #[arg(long = "save-config")]
    pub save_config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Dataset to profile (use '-' for stdin)
    #[arg(short, long)]
    pub source: PathBuf,
    /// YAML settings file
    #[arg(long)]
    pub settings: Option<PathBuf>,
    /// Maximum values sampled per column for overlap detection
    #[arg(long = "sample-cap")]
    pub sample_cap: Option<usize>,
    /// Seed for overlap sampling; runs with the same seed agree
    #[arg(long)]
    pub seed: Option<u64>,
    /// Print the profile as JSON instead of tables
    #[arg(long)]
    pub json: bool,
    #[command(flatten)]
    pub input: InputOptions,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Saved configuration file
    #[arg(short, long)]
    pub config: PathBuf,
    /// Source dataset to check for compatibility
    #[arg(short, long, requires = "template")]
    pub source: Option<PathBuf>,
    /// Template dataset to check for compatibility
    #[arg(short, long, requires = "source")]
    pub template: Option<PathBuf>,
    #[command(flatten)]
    pub input: InputOptions,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_names_are_accepted() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
    }

    #[test]
    fn map_command_collects_overrides() {
        let cli = Cli::try_parse_from([
            "csv-mapper",
            "map",
            "-s",
            "raw.csv",
            "-t",
            "template.csv",
            "--set",
            "Email=mail",
            "--set",
            "City=town",
            "--unset",
            "Phone",
            "--delimiter",
            "tab",
        ])
        .unwrap();
        let Commands::Map(args) = cli.command else {
            panic!("expected map command");
        };
        assert_eq!(args.matching.set.len(), 2);
        assert_eq!(args.matching.set[1], Override::set("City", "town"));
        assert_eq!(args.matching.unset, ["Phone"]);
        assert_eq!(args.matching.input.delimiter, Some(b'\t'));
    }

    #[test]
    fn inspect_requires_both_datasets() {
        assert!(Cli::try_parse_from(["csv-mapper", "inspect", "-c", "c.json", "-s", "a.csv"]).is_err());
        assert!(Cli::try_parse_from(["csv-mapper", "inspect", "-c", "c.json"]).is_ok());
    }
}
