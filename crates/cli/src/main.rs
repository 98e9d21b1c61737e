mod logging;

use anyhow::Result;
use autoname_core::{
    app_paths, load_config, plan_and_execute, save_config, AppConfig, BatchReport, FileOutcome,
    NativeProbe, RenameAction,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "autoname", version)]
#[command(about = "写真・動画のファイル名を撮影日時で一括リネームします")]
struct Cli {
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Rename(RenameArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
}

#[derive(Debug, Args)]
struct RenameArgs {
    path: PathBuf,
    #[arg(short, long)]
    format: Option<String>,
    #[arg(short, long, overrides_with = "no_recursive")]
    recursive: bool,
    #[arg(long, overrides_with = "recursive")]
    no_recursive: bool,
    #[arg(long, overrides_with = "no_include_hidden")]
    include_hidden: bool,
    #[arg(long, overrides_with = "include_hidden")]
    no_include_hidden: bool,
    #[arg(long, overrides_with = "no_images")]
    images: bool,
    #[arg(long, overrides_with = "images")]
    no_images: bool,
    #[arg(long, overrides_with = "no_videos")]
    videos: bool,
    #[arg(long, overrides_with = "videos")]
    no_videos: bool,
    #[arg(short, long = "ext")]
    extensions: Vec<String>,
    #[arg(long, overrides_with = "no_filename")]
    filename: bool,
    #[arg(long, overrides_with = "filename")]
    no_filename: bool,
    #[arg(long, default_value_t = false)]
    force: bool,
    #[arg(long, allow_hyphen_values = true)]
    offset_hours: Option<i64>,
    #[arg(short = 'n', long, default_value_t = false)]
    preview: bool,
    #[arg(long, default_value_t = false)]
    parallel: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[arg(long, default_value_t = false)]
    save_defaults: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose, cli.quiet)?;

    match cli.command {
        Commands::Rename(args) => cmd_rename(args),
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

fn cmd_rename(args: RenameArgs) -> Result<()> {
    let defaults = load_config()?;
    let merged = merge_args(defaults, &args);

    let mut config = merged.to_rename_config()?;
    config.force = args.force;
    config.preview = args.preview;
    config.parallel = args.parallel;

    let report = plan_and_execute(&args.path, &config, &NativeProbe)?;

    if args.save_defaults {
        save_config(&merged)?;
        eprintln!("既定値を保存しました: {}", app_paths()?.config_path.display());
    }

    match args.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            print_table(&report);
        }
    }

    if report.preview {
        eprintln!("プレビューモード: 実ファイルは変更していません。");
    }

    Ok(())
}

fn merge_args(mut config: AppConfig, args: &RenameArgs) -> AppConfig {
    if let Some(format) = &args.format {
        config.format = format.clone();
    }
    if let Some(on) = flag(args.recursive, args.no_recursive) {
        config.recursive_default = on;
    }
    if let Some(on) = flag(args.include_hidden, args.no_include_hidden) {
        config.include_hidden_default = on;
    }
    if let Some(on) = flag(args.images, args.no_images) {
        config.images_only = on;
    }
    if let Some(on) = flag(args.videos, args.no_videos) {
        config.videos_only = on;
    }
    if !args.extensions.is_empty() {
        config.extensions = args.extensions.clone();
    }
    if let Some(on) = flag(args.filename, args.no_filename) {
        config.extract_from_filename = on;
    }
    if let Some(offset) = args.offset_hours {
        config.filename_hour_offset = offset;
    }
    config
}

fn flag(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    println!("設定ファイル: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn print_table(report: &BatchReport) {
    println!("元ファイル -> 新ファイル (action, source)");
    for outcome in &report.outcomes {
        match outcome {
            FileOutcome::Planned { decision, .. } => {
                let via = decision.timestamp.as_ref().map(|t| t.label()).unwrap_or("-");
                let arrow = match decision.action {
                    RenameAction::SkipAlreadyNamed | RenameAction::SkipNoTimestamp => "==",
                    _ => "->",
                };
                println!(
                    "{} {} {} ({:?}, {})",
                    decision.source.display(),
                    arrow,
                    decision.destination.display(),
                    decision.action,
                    via
                );
            }
            FileOutcome::Failed { path, reason } => {
                println!("{} !! {}", path.display(), reason);
            }
            FileOutcome::Unsupported { .. }
            | FileOutcome::Hidden { .. }
            | FileOutcome::Unknown { .. } => {}
        }
    }

    let s = &report.stats;
    println!(
        "\n集計: scanned={} photo={} video={} renamed={} collision={} named_skip={} no_date_skip={} preview={} unsupported={} hidden={} unknown={} failed={}",
        s.scanned,
        s.photos,
        s.videos,
        s.renamed,
        s.collision_renamed,
        s.skipped_named,
        s.skipped_no_timestamp,
        s.previewed,
        s.unsupported,
        s.hidden,
        s.unknown,
        s.failed
    );
}
