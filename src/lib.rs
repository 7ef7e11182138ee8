pub mod assign;
pub mod cli;
pub mod config;
pub mod contamination;
pub mod data;
pub mod dataset;
pub mod enhance;
pub mod io_utils;
pub mod lexicon;
pub mod mapping;
pub mod matcher;
pub mod normalize;
pub mod pattern;
pub mod report;
pub mod review;
pub mod settings;
pub mod similarity;
pub mod transform;
pub mod uniqueness;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{Cli, Commands, InputOptions, MatchOptions},
    config::SavedConfiguration,
    contamination::detect_contamination,
    dataset::{Dataset, LoadOptions, load_dataset},
    io_utils::FileFormat,
    mapping::Mapping,
    matcher::ColumnMatcher,
    review::Override,
    settings::MatcherSettings,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_mapper", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Map(args) => handle_map(&args),
        Commands::Apply(args) => handle_apply(&args),
        Commands::Profile(args) => handle_profile(&args),
        Commands::Inspect(args) => handle_inspect(&args),
    }
}

/// Datasets, settings and the reviewed mapping for one source/template pair.
struct MappingSession {
    source: Dataset,
    template: Dataset,
    settings: MatcherSettings,
    mapping: Mapping,
}

fn load_options(input: &InputOptions) -> Result<LoadOptions> {
    Ok(LoadOptions {
        format: input.input_format,
        delimiter: input.delimiter,
        encoding: io_utils::resolve_encoding(input.input_encoding.as_deref())?,
    })
}

fn load_settings(path: Option<&Path>) -> Result<MatcherSettings> {
    match path {
        Some(path) => {
            info!("Loading settings from {path:?}");
            MatcherSettings::load(path)
        }
        None => Ok(MatcherSettings::default()),
    }
}

fn prepare_session(opts: &MatchOptions) -> Result<MappingSession> {
    let mut settings = load_settings(opts.settings.as_deref())?;
    if let Some(threshold) = opts.threshold {
        settings.threshold = threshold;
    }
    if opts.no_patterns {
        settings.patterns.enabled = false;
    }
    if opts.seed.is_some() {
        settings.contamination.seed = opts.seed;
    }
    settings.validate().context("Validating matcher settings")?;

    let load = load_options(&opts.input)?;
    let source = load_dataset(&opts.source, &load)?;
    let template = load_dataset(&opts.template, &load)?;
    info!(
        "Matching {} source column(s) against {} template column(s)",
        source.column_count(),
        template.column_count()
    );

    let matcher = ColumnMatcher::new(settings);
    let mut mapping = None;
    if let Some(path) = &opts.reuse {
        let saved = SavedConfiguration::load(path)?;
        let compatibility = saved.check_compatibility(source.columns(), template.columns());
        info!("{}", compatibility.recommendation);
        if compatibility.can_reuse_mappings {
            mapping = Some(saved.restore_mapping(source.columns()));
        } else {
            warn!("Saved configuration {path:?} does not fit this template; matching from scratch");
        }
    }
    let mapping = match mapping {
        Some(mapping) => mapping,
        None => matcher.suggest(&template, &source),
    };

    let overrides = opts
        .set
        .iter()
        .cloned()
        .chain(opts.unset.iter().map(Override::unset))
        .collect::<Vec<_>>();
    debug!("Applying {} override(s)", overrides.len());
    let mapping = review::apply_overrides(mapping, &overrides)?;

    Ok(MappingSession {
        source,
        template,
        settings: matcher.settings().clone(),
        mapping,
    })
}

fn save_configuration(session: &MappingSession, path: &Path) -> Result<()> {
    SavedConfiguration::create(&session.source, &session.template, &session.mapping).save(path)?;
    info!("Configuration written to {path:?}");
    Ok(())
}

fn handle_map(args: &cli::MapArgs) -> Result<()> {
    let session = prepare_session(&args.matching)?;
    let contamination = detect_contamination(&session.source, &session.settings.contamination);
    if args.json {
        let document = serde_json::json!({
            "mappings": &session.mapping,
            "quality": session.mapping.quality(),
            "contamination": &contamination,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&document).context("Serializing mapping to JSON")?
        );
    } else {
        print!(
            "{}",
            report::render_mapping(&session.mapping, session.settings.patterns.review_cutoff)
        );
        if !contamination.is_empty() {
            println!("\nColumns with overlapping values:");
            print!("{}", report::render_contamination(&contamination));
        }
    }
    for (left, right, percentage) in contamination.pairs() {
        warn!("Columns '{left}' and '{right}' share {percentage}% of their sampled values");
    }
    if let Some(path) = &args.save_config {
        save_configuration(&session, path)?;
    }
    Ok(())
}

fn handle_apply(args: &cli::ApplyArgs) -> Result<()> {
    let session = prepare_session(&args.matching)?;
    let output = transform::apply_mapping(
        &session.source,
        &session.template,
        &session.mapping,
        session.settings.patterns.sample_size,
    );
    info!(
        "Transformed {} row(s) into {} column(s), {:.1}% complete",
        output.row_count(),
        output.column_count(),
        output.completeness()
    );
    match FileFormat::resolve(&args.output, args.format) {
        FileFormat::Csv => {
            let delimiter = args
                .output_delimiter
                .or(args.matching.input.delimiter)
                .unwrap_or_else(|| io_utils::resolve_delimiter(&args.output, None));
            transform::write_csv(&output, &args.output, delimiter)?;
        }
        FileFormat::Json => transform::write_json(&output, &args.output)?,
    }
    if let Some(path) = &args.save_config {
        save_configuration(&session, path)?;
    }
    Ok(())
}

fn handle_profile(args: &cli::ProfileArgs) -> Result<()> {
    let mut settings = load_settings(args.settings.as_deref())?;
    if let Some(cap) = args.sample_cap {
        settings.contamination.sample_cap = cap;
    }
    if args.seed.is_some() {
        settings.contamination.seed = args.seed;
    }
    settings.validate().context("Validating matcher settings")?;

    let dataset = load_dataset(&args.source, &load_options(&args.input)?)?;
    info!(
        "Profiling {} column(s) over {} row(s)",
        dataset.column_count(),
        dataset.row_count()
    );
    let profile = matcher::profile_dataset(&dataset, &settings);
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&profile).context("Serializing profile to JSON")?
        );
    } else {
        print!("{}", report::render_profile(&profile));
    }
    Ok(())
}

fn handle_inspect(args: &cli::InspectArgs) -> Result<()> {
    let saved = SavedConfiguration::load(&args.config)?;
    println!("{}", saved.summary());
    if let (Some(source_path), Some(template_path)) = (&args.source, &args.template) {
        let load = load_options(&args.input)?;
        let source = load_dataset(source_path, &load)?;
        let template = load_dataset(template_path, &load)?;
        let compatibility = saved.check_compatibility(source.columns(), template.columns());
        println!();
        print!("{}", report::render_compatibility(&compatibility));
    }
    Ok(())
}
