use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "ngaji",
    version,
    about = "browse the Quran surah list and recent kajian videos from the terminal",
    long_about = "ngaji fetches a remote list (the alquran.cloud surah index or recent YouTube kajian videos), filters and paginates it, and renders the page as text, JSON or standalone HTML.\n\nExamples:\n  ngaji --source quran --search baqarah\n  ngaji --source quran --ayah 2:255\n  ngaji --source videos --api-key KEY --window week -o kajian.html\n  ngaji --source videos --api-key KEY --watch --auto-refresh\n\nTip: Use --config to persist the API key and defaults, or --init-config to write a starter file."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the rendered page to a file (format inferred from extension)."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'F',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format: text, json or html."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 's',
        long = "src",
        visible_alias = "source",
        value_name = "SOURCE",
        help_heading = "Source",
        help = "Page to browse: quran or videos."
    )]
    pub source: Option<String>,

    #[arg(
        short = 'k',
        long = "key",
        visible_alias = "api-key",
        value_name = "KEY",
        help_heading = "Source",
        help = "YouTube Data API key (videos source)."
    )]
    pub api_key: Option<String>,

    #[arg(
        long = "qry",
        visible_alias = "query",
        value_name = "TEXT",
        help_heading = "Source",
        help = "Search query sent to the video API."
    )]
    pub query: Option<String>,

    #[arg(
        long = "kw",
        visible_alias = "keywords",
        value_name = "CSV",
        help_heading = "Source",
        help = "Relevance keywords, comma-separated (default: mbois,ustadz)."
    )]
    pub keywords: Option<String>,

    #[arg(
        long = "mr",
        visible_alias = "max-results",
        value_name = "N",
        help_heading = "Source",
        help = "Maximum search results requested from the video API (1-50)."
    )]
    pub max_results: Option<u32>,

    #[arg(
        short = 'q',
        long = "sch",
        visible_alias = "search",
        value_name = "TERM",
        help_heading = "List",
        help = "Filter by title, subtitle or id (case-insensitive)."
    )]
    pub search: Option<String>,

    #[arg(
        short = 'w',
        long = "win",
        visible_alias = "window",
        value_name = "WINDOW",
        help_heading = "List",
        help = "Time window: all, today, week or month."
    )]
    pub window: Option<String>,

    #[arg(
        short = 'p',
        long = "pg",
        visible_alias = "page",
        value_name = "N",
        help_heading = "List",
        help = "Page to show (clamped to the available pages)."
    )]
    pub page: Option<usize>,

    #[arg(
        long = "ps",
        visible_alias = "page-size",
        value_name = "N",
        help_heading = "List",
        help = "Cards per page."
    )]
    pub page_size: Option<usize>,

    #[arg(
        long = "opn",
        visible_alias = "open",
        value_name = "ID",
        help_heading = "Detail",
        help = "Open one item: a surah number, a video id, or SURAH:AYAH."
    )]
    pub open: Option<String>,

    #[arg(
        long = "ay",
        visible_alias = "ayah",
        value_name = "SURAH:AYAH",
        help_heading = "Detail",
        help = "Open a single ayah, e.g. 2:255 for Ayat Kursi."
    )]
    pub ayah: Option<String>,

    #[arg(
        long = "wt",
        visible_alias = "watch",
        help_heading = "Watch",
        help = "Keep the page open and read commands from stdin."
    )]
    pub watch: bool,

    #[arg(
        short = 'a',
        long = "ar",
        visible_alias = "auto-refresh",
        help_heading = "Watch",
        help = "Start with auto refresh enabled (watch mode)."
    )]
    pub auto_refresh: bool,

    #[arg(
        long = "ri",
        visible_alias = "refresh-interval",
        value_name = "SECONDS",
        help_heading = "Watch",
        help = "Seconds between automatic refreshes."
    )]
    pub refresh_interval: Option<u64>,

    #[arg(
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Request timeout in seconds."
    )]
    pub timeout: Option<usize>,

    #[arg(
        short = 'x',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy URL."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Config",
        help = "Path to config file (defaults to ~/.ngaji/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "ic",
        visible_alias = "init-config",
        help_heading = "Config",
        help = "Write a starter config file if none exists, then exit."
    )]
    pub init_config: bool,
}
