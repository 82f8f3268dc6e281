use std::env;
use std::time::Duration;

use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::controller::PageEvent;
use crate::output::{self, DisplaySurface, FileSurface, OutputFormat, TerminalSurface};
use crate::render::document::render_document;
use crate::runner::{self, BrowseResult, Runner, SourceKind};
use crate::source::VideoQuery;
use crate::state::{TimeWindow, DEFAULT_PAGE_SIZE};

const WATCH_COMMANDS: &[(&str, &str)] = &[
    ("search <term>", "filter by title, subtitle or id (alias: s, /)"),
    ("filter <window>", "all, today, week or month (alias: f)"),
    ("page <n>", "jump to page n (alias: p)"),
    ("open <id>", "open a surah, ayah (2:255) or video (alias: o)"),
    ("back", "return to the list and clear the search (alias: b)"),
    ("retry", "repeat the last failed fetch"),
    ("refresh", "fetch the list again (alias: r)"),
    ("auto", "toggle auto refresh"),
    ("quit", "leave watch mode (alias: q)"),
];

fn print_banner() {
    const BANNER: &str = r#"
                          _ _
   _ __   __ _  __ _  __ _(_|_)
  | '_ \ / _` |/ _` |/ _` | | |
  | | | | (_| | (_| | (_| | | |
  |_| |_|\__, |\__,_|\__,_/ |_|
         |___/          |__/
"#;
    eprint!("{}", BANNER);
    eprintln!("       v{} - surah & kajian browser", env!("CARGO_PKG_VERSION"));
    eprintln!();
}

fn format_kv_line(label: &str, value: &str) {
    eprintln!(":: {:<10}: {}", label, value);
}

fn watch_commands_help() -> String {
    let mut out = String::from("Watch commands (one per line on stdin):\n");
    for (command, help) in WATCH_COMMANDS {
        out.push_str(&format!("  {command:<16}{help}\n"));
    }
    out
}

/// Clap's long help with the watch-mode command list appended.
fn render_help() -> String {
    let mut cmd = CliArgs::command().after_long_help(watch_commands_help());
    cmd.render_long_help().to_string()
}

/// Installs the global subscriber. `NGAJI_LOG` wins over `-v`.
fn init_tracing(verbosity: u8, no_color: bool) {
    let fallback = match verbosity {
        0 => "ngaji=warn",
        1 => "ngaji=info,warn",
        2 => "ngaji=debug,info",
        _ => "ngaji=trace,debug",
    };
    let filter = EnvFilter::try_from_env("NGAJI_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    let format = env::var("NGAJI_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format.as_str() {
        "json" => registry
            .with(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        _ => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_ansi(!no_color)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    // A subscriber may already be installed when embedded.
    let _ = result;
}

#[derive(Clone, Debug)]
struct RunConfig {
    options: runner::Options,
    output: Option<String>,
    output_format: Option<OutputFormat>,
    watch: bool,
    no_color: bool,
    verbose: u8,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);
    let quran_cfg = cfg.quran.unwrap_or_default();
    let video_cfg = cfg.videos.unwrap_or_default();
    let defaults = runner::Options::default();

    let source_raw = args
        .source
        .or(cfg.source)
        .unwrap_or_else(|| SourceKind::default().as_str().to_string());
    let source = SourceKind::parse(&source_raw)
        .ok_or_else(|| format!("invalid source '{source_raw}', expected quran or videos"))?;

    let window_raw = args
        .window
        .or(cfg.time_window)
        .unwrap_or_else(|| TimeWindow::None.as_str().to_string());
    let window = window_raw
        .parse::<TimeWindow>()
        .map_err(|e| format!("invalid window '{window_raw}': {e}"))?;

    let page_size = args.page_size.or(cfg.page_size).unwrap_or(DEFAULT_PAGE_SIZE);
    crate::utils::parse_positive(page_size, "page_size")?;

    let timeout = args.timeout.or(cfg.timeout).unwrap_or(defaults.timeout_seconds);
    let proxy = args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty());

    let query_defaults = VideoQuery::default();
    let video_query = VideoQuery {
        query: args
            .query
            .or(video_cfg.query)
            .unwrap_or(query_defaults.query),
        max_results: args
            .max_results
            .or(video_cfg.max_results)
            .unwrap_or(query_defaults.max_results),
        relevance_language: video_cfg
            .relevance_language
            .unwrap_or(query_defaults.relevance_language),
        region_code: video_cfg.region_code.unwrap_or(query_defaults.region_code),
    };

    let keywords = match args.keywords.as_deref() {
        Some(raw) => Some(
            crate::utils::parse_keywords_csv(raw)
                .map_err(|e| format!("invalid --keywords '{raw}': {e}"))?,
        ),
        None => video_cfg.keywords,
    };

    let ayah = args
        .ayah
        .as_deref()
        .map(crate::utils::parse_verse_ref)
        .transpose()?;

    let refresh_secs = args
        .refresh_interval
        .or(cfg.refresh_interval)
        .unwrap_or(defaults.refresh_interval.as_secs());
    if refresh_secs == 0 {
        return Err("invalid refresh_interval, expected positive integer".to_string());
    }

    let output = args
        .output
        .or(cfg.output)
        .filter(|p| !p.trim().is_empty())
        .map(|p| config::expand_tilde_string(&p));
    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => Some(
            OutputFormat::parse(&raw)
                .ok_or_else(|| format!("invalid output format '{raw}', expected text, json or html"))?,
        ),
        None => None,
    };

    let options = runner::Options {
        source,
        quran_base_url: quran_cfg.base_url.unwrap_or(defaults.quran_base_url),
        video_base_url: video_cfg.base_url.unwrap_or(defaults.video_base_url),
        api_key: args
            .api_key
            .or(video_cfg.api_key)
            .or_else(|| env::var("NGAJI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty()),
        video_query,
        keywords,
        search: args.search.filter(|s| !s.trim().is_empty()),
        window,
        page: args.page,
        page_size,
        detail_page_size: defaults.detail_page_size,
        open: args.open,
        ayah,
        timeout_seconds: timeout,
        proxy,
        auto_refresh: args.auto_refresh || (args.watch && cfg.auto_refresh.unwrap_or(false)),
        refresh_interval: Duration::from_secs(refresh_secs),
        initial_delay: defaults.initial_delay,
    };

    Ok(RunConfig {
        options,
        output,
        output_format,
        watch: args.watch,
        no_color,
        verbose: args.verbose,
    })
}

fn resolve_format(run: &RunConfig) -> OutputFormat {
    run.output_format
        .or_else(|| run.output.as_deref().and_then(output::infer_format_from_path))
        .unwrap_or(OutputFormat::Text)
}

fn spinner(message: String) -> Result<ProgressBar, String> {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_style(
        ProgressStyle::with_template(":: {spinner} {msg} :: [{elapsed_precise}]")
            .map_err(|e| format!("failed to build spinner style: {e}"))?,
    );
    pb.set_message(message);
    Ok(pb)
}

fn render_result(result: &BrowseResult, format: OutputFormat) -> Result<Vec<u8>, String> {
    match format {
        OutputFormat::Text => {
            let mut text = result.tree.to_text();
            if !text.ends_with('\n') {
                text.push('\n');
            }
            Ok(text.into_bytes())
        }
        OutputFormat::Json => output::render_json(&result.data).map_err(|e| e.to_string()),
        OutputFormat::Html => Ok(render_document(&result.tree, Some(&result.data)).into_bytes()),
    }
}

async fn run_once(run: &RunConfig, runner: Runner) -> Result<(), String> {
    let format = resolve_format(run);
    let pb = spinner(format!("Memuat {}", run.options.source.as_str()))?;
    let result = runner.run().await;
    pb.finish_and_clear();
    let result = result.map_err(|e| e.to_string())?;

    format_kv_line("Source", &result.label);
    format_kv_line(
        "Items",
        &format!("{} of {} match", result.matched, result.total),
    );

    match run.output.as_deref() {
        Some(outfile_path) => {
            let rendered = render_result(&result, format)?;
            let mut outfile = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(outfile_path)
                .await
                .map_err(|e| format!("failed to open output file: {e}"))?;
            outfile
                .write_all(&rendered)
                .await
                .map_err(|e| format!("failed to write output file: {e}"))?;
            format_kv_line("Saved", outfile_path);
        }
        None if format == OutputFormat::Text => {
            TerminalSurface::stdout(false)
                .present(&result.tree)
                .map_err(|e| e.to_string())?;
        }
        None => {
            let rendered = render_result(&result, format)?;
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(&rendered)
                .await
                .map_err(|e| format!("failed to write output: {e}"))?;
            stdout
                .flush()
                .await
                .map_err(|e| format!("failed to write output: {e}"))?;
        }
    }

    eprintln!(
        ":: {} :: took {}ms ::",
        "Completed".green(),
        result.elapsed.as_millis()
    );
    Ok(())
}

/// Turns stdin lines into page events until quit or end of input.
async fn read_commands(tx: mpsc::Sender<PageEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        match PageEvent::parse(&line) {
            Ok(event) => {
                let quit = event == PageEvent::Quit;
                if tx.send(event).await.is_err() || quit {
                    break;
                }
            }
            Err(e) => eprintln!(":: {}", e.red()),
        }
    }
}

async fn run_watch(run: &RunConfig, runner: Runner) -> Result<(), String> {
    let (tx, rx) = mpsc::channel::<PageEvent>(32);
    let reader = task::spawn(read_commands(tx));

    let result = match run.output.as_deref() {
        Some(path) => {
            format_kv_line("Watch", &format!("rendering to {path}"));
            let mut surface = FileSurface::new(path, resolve_format(run));
            runner.watch(rx, &mut surface).await
        }
        None => {
            let mut surface = TerminalSurface::stdout(true);
            runner.watch(rx, &mut surface).await
        }
    };
    reader.abort();
    result.map_err(|e| e.to_string())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    let runner = Runner::new(run.options.clone()).map_err(|e| e.to_string())?;
    print_banner();
    if run.watch {
        run_watch(&run, runner).await
    } else {
        run_once(&run, runner).await
    }
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    if args.init_config {
        let path = match args.config.as_deref() {
            Some(p) => config::expand_tilde(p),
            None => config::default_config_path().map_err(|e| e.to_string())?,
        };
        let written = config::ensure_default_config_file(&path).map_err(|e| e.to_string())?;
        let verb = if written { "Created" } else { "Exists" };
        format_kv_line(verb, &path.display().to_string());
        return Ok(());
    }

    // An explicit --config must exist; the default location is optional.
    let cfg = match args.config.as_deref() {
        Some(p) => config::load_config(&config::expand_tilde(p), false),
        None => match config::default_config_path() {
            Ok(path) => config::load_config(&path, true),
            Err(_) => Ok(ConfigFile::default()),
        },
    }
    .map_err(|e| e.to_string())?;

    let run = build_run_config(args, cfg)?;
    init_tracing(run.verbose, run.no_color);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    let result = rt.block_on(run_async(run));
    // The stdin reader may still be parked in a blocking read.
    rt.shutdown_timeout(Duration::from_millis(100));
    result
}
