//! WebCraft CLI - command line interface for the WebCraft site builder

use anyhow::{bail, Context};
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, Level};
use webcraft_core::{
    write_atomic, BuilderState, Config, ConfigLoadContext, ConfigMetadata, Exporter,
    HandoffStore, ValidationStatus, WebcraftError,
};
use webcraft_generator::{GeminiBackend, GenerationClient};
use webcraft_live_editor::{Gesture, LiveEditor, PassKind};
use webcraft_renderer::{RenderContext, RenderMode, SiteRenderer};

const DEFAULT_PREVIEW_FILE: &str = "webcraft-preview.html";
const DEFAULT_SITE_DIR: &str = "site";

/// What the invocation asks for
#[derive(Debug, Clone, PartialEq)]
enum Action {
    Generate { prompt: String, output: PathBuf },
    Export { output: Option<PathBuf> },
    Build { site: PathBuf, out_dir: PathBuf },
    Inspect { json: bool, select: Option<String> },
    ValidateConfig,
}

/// CLI arguments structure
#[derive(Debug, Clone)]
struct Args {
    config_file: Option<PathBuf>,
    handoff: Option<PathBuf>,
    verbose: bool,
    action: Action,
}

fn command() -> Command {
    Command::new("webcraft")
        .version("0.1.0")
        .about("Generate, live-edit and export websites")
        .long_about(
            "WebCraft generates starter websites from a prompt, keeps the generated \
            document in a local handoff file for the live editor, builds static pages \
            from structured site descriptions and exports finished documents.",
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .help("Path to configuration file (JSON format)")
                .long_help(
                    "Path to a JSON configuration file. Defaults to ./webcraft.json when \
                    present. WEBCRAFT_* environment variables override file settings.",
                )
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("handoff")
                .long("handoff")
                .global(true)
                .help("Handoff file shared between generation and editing")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .help("Enable debug logging with targets, files and line numbers")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("generate")
                .about("Generate a website from a prompt and hand it to the editor")
                .arg(
                    Arg::new("prompt")
                        .help("Description of the website to generate")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Where to write the preview document")
                        .default_value(DEFAULT_PREVIEW_FILE)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Capture the handoff document through the editor and export it")
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Export file path (defaults to the configured file name)")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("build")
                .about("Render every page of a structured site description")
                .arg(
                    Arg::new("site")
                        .help("Site description (JSON) as saved by the builder")
                        .required(true)
                        .index(1)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("out-dir")
                        .short('o')
                        .long("out-dir")
                        .help("Directory receiving one HTML file per page")
                        .default_value(DEFAULT_SITE_DIR)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("Report interactivity and editable elements of the handoff document")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the report as JSON")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("select")
                        .long("select")
                        .value_name("ID")
                        .help("Click the element with this id and report the resulting selection"),
                ),
        )
        .subcommand(
            Command::new("validate-config").about("Validate the configuration and exit"),
        )
}

impl Args {
    fn parse() -> Self {
        Self::from_matches(&command().get_matches()).unwrap_or_else(|e| e.exit())
    }

    fn from_matches(matches: &ArgMatches) -> Result<Self, clap::Error> {
        let action = match matches.subcommand() {
            Some(("generate", sub)) => Action::Generate {
                prompt: sub.get_one::<String>("prompt").cloned().unwrap_or_default(),
                output: path_arg(sub, "output", DEFAULT_PREVIEW_FILE),
            },
            Some(("export", sub)) => Action::Export {
                output: sub.get_one::<PathBuf>("output").cloned(),
            },
            Some(("build", sub)) => Action::Build {
                site: path_arg(sub, "site", ""),
                out_dir: path_arg(sub, "out-dir", DEFAULT_SITE_DIR),
            },
            Some(("inspect", sub)) => Action::Inspect {
                json: sub.get_flag("json"),
                select: sub.get_one::<String>("select").cloned(),
            },
            Some(("validate-config", _)) => Action::ValidateConfig,
            _ => return Err(command().error(ErrorKind::MissingSubcommand, "A subcommand is required")),
        };

        Ok(Self {
            config_file: matches.get_one::<PathBuf>("config").cloned(),
            handoff: matches.get_one::<PathBuf>("handoff").cloned(),
            verbose: matches.get_flag("verbose"),
            action,
        })
    }

    /// Load configuration from file and environment
    fn load_config(&self, strict: bool) -> anyhow::Result<(Config, ConfigMetadata)> {
        if let Some(path) = &self.config_file {
            if !path.exists() {
                bail!(
                    "Configuration file not found: {}\n\n\
                    Create one with defaults or drop --config to use built-in settings.",
                    path.display()
                );
            }
        }

        let mut context = ConfigLoadContext::default();
        if let Some(path) = &self.config_file {
            context.base_path = Some(path.clone());
        }
        context.environment_overrides = Config::environment_overrides_from_process();
        context.strict_mode = strict;

        Config::load_with_context(&context).context("Failed to load configuration")
    }

    /// The handoff file: flag, then configuration, then the user data directory
    fn handoff_path(&self, config: &Config) -> PathBuf {
        self.handoff
            .clone()
            .or_else(|| config.storage.handoff_path.clone())
            .unwrap_or_else(default_handoff_path)
    }
}

fn path_arg(matches: &ArgMatches, name: &str, default: &str) -> PathBuf {
    matches
        .get_one::<PathBuf>(name)
        .cloned()
        .unwrap_or_else(|| PathBuf::from(default))
}

fn default_handoff_path() -> PathBuf {
    match dirs::data_local_dir() {
        Some(dir) => dir.join("webcraft").join("handoff.json"),
        None => PathBuf::from(".webcraft-handoff.json"),
    }
}

async fn open_handoff(path: &Path) -> anyhow::Result<HandoffStore> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    debug!("Using handoff file {}", path.display());
    Ok(HandoffStore::open(path).await?)
}

/// Load the handoff document into a fresh editor
async fn open_editor(config: &Config, handoff: &HandoffStore) -> anyhow::Result<LiveEditor> {
    let document = handoff.editor_document().await?;
    let mut editor = LiveEditor::new(config.editor.clone());
    editor.load(&document).map_err(WebcraftError::from)?;
    Ok(editor)
}

async fn generate(args: &Args, config: &Config, prompt: &str, output: &Path) -> anyhow::Result<()> {
    let backend = GeminiBackend::new(&config.generator)?;
    let client = GenerationClient::new(Arc::new(backend), config.generator.clone());
    let handoff = open_handoff(&args.handoff_path(config)).await?;

    println!("✨ Generating website...");
    let (site, document) = client
        .generate_into(prompt, &handoff, &config.export.style_framework_url)
        .await?;
    write_atomic(output, document.as_bytes()).await?;

    println!("✅ Website generated");
    println!("   HTML: {} bytes", site.html.len());
    println!("   CSS:  {} bytes", site.css.len());
    println!("   JS:   {} bytes", site.js.len());
    println!("📄 Preview: {}", output.display());
    Ok(())
}

async fn export(args: &Args, config: &Config, output: Option<&Path>) -> anyhow::Result<()> {
    let handoff = open_handoff(&args.handoff_path(config)).await?;
    let editor = open_editor(config, &handoff).await?;

    let exporter = Exporter::new(config.export.clone());
    let path = match output {
        Some(path) => path.to_path_buf(),
        None => exporter.download_path(&std::env::current_dir()?),
    };
    let written = editor.export(&exporter, &path).await?;
    println!("📦 Exported {}", written.display());
    Ok(())
}

async fn build(config: &Config, site: &Path, out_dir: &Path) -> anyhow::Result<()> {
    let state = BuilderState::from_file(site)
        .with_context(|| format!("Failed to read site description {}", site.display()))?;
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let context = RenderContext::new(RenderMode::Preview)
        .with_style_framework(config.export.style_framework_url.clone());
    let written = SiteRenderer::new(context).write_site(&state, out_dir).await?;
    for path in &written {
        println!("📄 {}", path.display());
    }
    println!("✅ Built {} pages into {}", written.len(), out_dir.display());
    Ok(())
}

/// What clicking one element of the document does in the editor
#[derive(Debug, Clone, PartialEq)]
struct SelectionSummary {
    element_id: String,
    clicked_tag: String,
    selected_tag: Option<String>,
    mode: String,
    notice: Option<String>,
}

/// Click the element whose `id` attribute is `element_id`
fn select_element(editor: &mut LiveEditor, element_id: &str) -> anyhow::Result<SelectionSummary> {
    let (target, clicked_tag) = {
        let doc = editor.document().map_err(WebcraftError::from)?;
        let Some(target) = doc
            .elements()
            .into_iter()
            .find(|id| doc.get_attribute(*id, "id") == Some(element_id))
        else {
            bail!("No element with id \"{}\" in the handoff document", element_id);
        };
        (target, doc.tag_name(target).unwrap_or_default().to_string())
    };

    let outcome = editor
        .dispatch(Gesture::Click { target })
        .map_err(WebcraftError::from)?;
    debug!("Click on #{} gave {:?}", element_id, outcome);

    let mode = editor.selection_mode().to_string();
    let notice = editor.selection_notice().map(|notice| notice.message);
    let selected_tag = match (editor.selected_node(), editor.document()) {
        (Some(node), Ok(doc)) => doc.tag_name(node).map(str::to_string),
        _ => None,
    };
    editor.cancel_modal();

    Ok(SelectionSummary {
        element_id: element_id.to_string(),
        clicked_tag,
        selected_tag,
        mode,
        notice,
    })
}

async fn inspect(args: &Args, config: &Config, json: bool, select: Option<&str>) -> anyhow::Result<()> {
    let handoff = open_handoff(&args.handoff_path(config)).await?;
    let mut editor = open_editor(config, &handoff).await?;
    let selection = match select {
        Some(element_id) => Some(select_element(&mut editor, element_id)?),
        None => None,
    };
    let interactivity = editor.interactivity();
    let report = editor.report();

    if json {
        let mut value = serde_json::json!({
            "interactivity": interactivity,
            "instrumentation": report,
        });
        if let Some(selection) = &selection {
            value["selection"] = serde_json::json!({
                "elementId": selection.element_id,
                "clickedTag": selection.clicked_tag,
                "selectedTag": selection.selected_tag,
                "mode": selection.mode,
                "notice": selection.notice,
            });
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("🔍 Handoff document");
    println!("   Scripts: {}", interactivity.script_count);
    if interactivity.is_interactive() {
        println!("   Features: {}", interactivity.features().join(", "));
    }
    println!("\nEditable elements:");
    for summary in &report.passes {
        if summary.kind == PassKind::AffordanceStyles {
            continue;
        }
        let fallback = if summary.used_fallback { " (heuristic)" } else { "" };
        println!("   {}: {}{}", summary.kind, summary.marked, fallback);
    }
    for failure in &report.failures {
        println!("   ⚠️  {} pass failed: {}", failure.kind, failure.reason);
    }

    if let Some(selection) = selection {
        println!("\nSelection (#{} <{}>):", selection.element_id, selection.clicked_tag);
        match &selection.selected_tag {
            Some(tag) => println!("   Selected <{}> ({})", tag, selection.mode),
            None => println!("   Nothing selected"),
        }
        if let Some(notice) = &selection.notice {
            println!("   ℹ️  {}", notice);
        }
    }
    Ok(())
}

fn validate_config(args: &Args) -> anyhow::Result<()> {
    println!("🔍 Validating Configuration\n");
    let (config, metadata) = args.load_config(true)?;

    match metadata.source_files.first() {
        Some(path) => println!("Configuration file: {}", path.display()),
        None => println!("Configuration file: none (built-in defaults)"),
    }
    println!("Checksum: {}", metadata.checksum);
    if metadata.validation_status == ValidationStatus::Valid {
        println!("✅ Configuration is valid\n");
    }

    println!("Editor:");
    println!(
        "  Text marker: {}=\"{}\"",
        config.editor.text_marker.attribute, config.editor.text_marker.value
    );
    println!(
        "  Image marker: {}=\"{}\"",
        config.editor.image_marker.attribute, config.editor.image_marker.value
    );
    println!("  Sandbox: {}", config.editor.sandbox.join(" "));
    println!("  Upload limit: {} bytes", config.editor.max_upload_bytes);
    println!("\nGenerator:");
    println!("  Endpoint: {}", config.generator.endpoint);
    println!("  Model: {}", config.generator.model);
    let key = if config.generator.resolve_api_key().is_some() { "configured" } else { "missing" };
    println!("  API key: {}", key);
    println!("\nExport:");
    println!("  File name: {}", config.export.file_name);
    println!("  Handler shim: {}", config.export.inject_handler_shim);
    println!("  Handoff file: {}", args.handoff_path(&config).display());

    println!("\n✅ All validations passed!");
    Ok(())
}

async fn run(args: &Args) -> anyhow::Result<()> {
    if args.action == Action::ValidateConfig {
        return validate_config(args);
    }

    let (config, metadata) = args.load_config(true)?;
    debug!("Configuration checksum {}", metadata.checksum);

    match &args.action {
        Action::Generate { prompt, output } => generate(args, &config, prompt, output).await,
        Action::Export { output } => export(args, &config, output.as_deref()).await,
        Action::Build { site, out_dir } => build(&config, site, out_dir).await,
        Action::Inspect { json, select } => inspect(args, &config, *json, select.as_deref()).await,
        Action::ValidateConfig => validate_config(args),
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(args.verbose)
        .with_line_number(args.verbose)
        .with_file(args.verbose)
        .with_ansi(true)
        .init();

    info!("Running {:?}", args.action);
    if let Err(e) = run(&args).await {
        error!("Command failed: {:#}", e);
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}
