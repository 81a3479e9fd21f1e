//! Mermaid Studio - a terminal editor for Mermaid diagrams with live preview.
//!
//! # Usage
//!
//! ```bash
//! mermaid-studio
//! mermaid-studio --watch flow.mmd
//! mermaid-studio --template "Pie Chart"
//! mermaid-studio flow.mmd --export pdf --out-dir build
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mermaid_studio::app::App;
use mermaid_studio::config::{
    ConfigFlags, PreferenceStore, ThemeMode, clear_config_flags, global_config_path,
    load_config_flags, local_override_path, parse_flag_tokens, preferences_path,
    save_config_flags,
};
use mermaid_studio::export::{ExportFormat, Exporter};
use mermaid_studio::preview::RenderDebouncer;
use mermaid_studio::render::MermaidRenderer;
use mermaid_studio::templates;
use mermaid_studio::theme::{self, Theme};

/// A terminal editor for Mermaid diagrams with live preview
#[derive(Parser, Debug)]
#[command(name = "mermaid-studio", version, about, long_about = None)]
struct Cli {
    /// Mermaid file to edit (created on first save if missing)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Start from a built-in template, e.g. "Sequence Diagram"
    #[arg(long, value_name = "NAME")]
    template: Option<String>,

    /// Render once, write the export, and exit without starting the editor
    #[arg(long, value_name = "FORMAT")]
    export: Option<ExportFormat>,

    /// Reload the file when it changes on disk
    #[arg(short, long)]
    watch: bool,

    /// Disable inline preview images (show a text summary only)
    #[arg(long)]
    no_images: bool,

    /// Force image rendering to use half-cell fallback mode
    #[arg(long)]
    force_half_cell: bool,

    /// Color theme; auto uses the stored preference, then the terminal
    #[arg(long, value_enum)]
    theme: Option<ThemeMode>,

    /// Directory exports are written to
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Quiet period after typing before the preview re-renders
    #[arg(long, value_name = "MS")]
    render_delay_ms: Option<u64>,

    /// Write INFO-level logs to a file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
            )
            .init();
    }
    Ok(())
}

/// Initial editor text: the named template, the file, or the default diagram.
fn initial_source(cli: &Cli) -> Result<String> {
    if let Some(name) = &cli.template {
        let template = templates::find(name).with_context(|| {
            let known: Vec<_> = templates::TEMPLATES.iter().map(|t| t.name).collect();
            format!("Unknown template {name:?}; available: {}", known.join(", "))
        })?;
        return Ok(template.source.to_string());
    }
    match &cli.file {
        Some(path) if path.exists() => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => Ok(templates::DEFAULT_SOURCE.to_string()),
    }
}

fn load_stored_theme(store: &PreferenceStore) -> Option<Theme> {
    match store.load() {
        Ok(prefs) => prefs.theme,
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "ignoring unreadable preferences");
            None
        }
    }
}

fn export_headless(
    source: &str,
    format: ExportFormat,
    theme: Theme,
    out_dir: PathBuf,
) -> Result<()> {
    let written = Exporter::new(out_dir)
        .export_source(&MermaidRenderer::new(), source, format, theme)
        .with_context(|| format!("Failed to export {format}"))?;
    match written {
        Some(path) => println!("{}", path.display()),
        None => eprintln!("Nothing to export: the diagram source is blank"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    init_logging(effective.log_file.as_deref())?;
    tracing::debug!(?effective, "effective flags");

    let source = initial_source(&cli)?;
    let store = PreferenceStore::new(preferences_path());
    let stored = load_stored_theme(&store);
    let explicit = effective.theme.and_then(ThemeMode::explicit);
    let out_dir = effective
        .out_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    if let Some(format) = cli.export {
        // No terminal query when scripting.
        let theme = theme::resolve_startup_theme(explicit, stored, || None);
        return export_headless(&source, format, theme, out_dir);
    }

    let theme = theme::resolve_startup_theme(explicit, stored, theme::detect_ambient);
    tracing::info!(%theme, "starting editor");

    let mut app = App::new(source)
        .with_file(cli.file)
        .with_theme(theme)
        .with_preferences(Some(store))
        .with_watch(effective.watch)
        .with_images_enabled(!effective.no_images)
        .with_force_half_cell(effective.force_half_cell)
        .with_out_dir(out_dir)
        .with_render_delay_ms(
            effective
                .render_delay_ms
                .unwrap_or(RenderDebouncer::DEFAULT_DELAY_MS),
        )
        .with_config_paths(
            Some(global_path.clone()),
            if local_path.exists() {
                Some(local_path.clone())
            } else {
                None
            },
        );

    app.run().context("Application error")
}
