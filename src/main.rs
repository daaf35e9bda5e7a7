use clap::{Parser, Subcommand};
use leafpress::search::highlight::parse_mark_param;
use leafpress::search::{self, Highlighter};
use leafpress::{config, generate, output, scan};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "leafpress")]
#[command(about = "Static site generator for a blog, pages and client-side search")]
#[command(long_about = "\
Static site generator for a blog, pages and client-side search

Your filesystem is the data source. Files below pages/ become the page tree
and the navigation, files below blog/ become dated blog entries. Every source
is Markdown or HTML and needs an h1 title; blog entries also need a
<time datetime=\"...\"> element.

Content structure:

  src/
  ├── config.toml                  # Site config (optional)
  ├── assets/                      # Copied to <output>/assets
  ├── pages/
  │   ├── index.md                 # First navigation entry
  │   ├── about.md                 # → about.html
  │   └── guides/
  │       ├── index.md             # \"Guides\" → guides.html
  │       └── install.md           # \"Install\" → guides-install.html
  └── blog/
      └── hello.md                 # → 2024-01-15-hello-world.html

Search syntax:
  rust async       either word, fuzzy
  +rust            must contain rust
  -java            must not contain java
  \"rust\"           exact word only

Run 'leafpress gen-config' to generate a documented config.toml.")]
#[command(version = env!("LEAFPRESS_VERSION"))]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "src", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "docs", global = true)]
    output: PathBuf,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the sources and write the site
    Build,
    /// Validate the sources without writing anything
    Check,
    /// Run a query against a generated search index
    Search {
        /// Query, e.g. 'rust +async -java'
        query: String,
        /// Index file (defaults to <output>/search.json)
        #[arg(long)]
        index: Option<PathBuf>,
    },
    /// Print a generated page with search terms marked
    Mark {
        /// Generated HTML file
        file: PathBuf,
        /// JSON array of terms, as in the page's m parameter
        #[arg(long)]
        terms: String,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Build => {
            let site_config = config::load_config(&cli.source)?;
            init_thread_pool(&site_config.processing);

            println!("==> Scanning {}", cli.source.display());
            let site = scan::scan_with_config(&cli.source, site_config)?;

            println!("==> Generating HTML \u{2192} {}", cli.output.display());
            let report = generate::generate(&site, &cli.source, &cli.output)?;
            output::print_build_output(&site, &report);

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            let site_config = config::load_config(&cli.source)?;
            init_thread_pool(&site_config.processing);

            println!("==> Checking {}", cli.source.display());
            let site = scan::scan_with_config(&cli.source, site_config)?;
            output::print_check_output(&site, &cli.source);
            println!("==> Content is valid");
        }
        Command::Search { query, index } => {
            let options = config::load_config(&cli.source)?.search.options();
            let index_path = index.unwrap_or_else(|| cli.output.join("search.json"));
            let index_json = std::fs::read_to_string(&index_path)?;
            let results = search::search_json(&index_json, &query, &options);
            output::print_search_results(&results);
        }
        Command::Mark { file, terms } => {
            let html = std::fs::read_to_string(&file)?;
            match Highlighter::new(parse_mark_param(&terms)) {
                Some(highlighter) => print!("{}", highlighter.mark_document(&html)),
                None => print!("{}", html),
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the stderr log subscriber. `LEAFPRESS_LOG` overrides the flags.
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("LEAFPRESS_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Never more threads than available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
