//! refnav - add citation back-links to rendered articles

use std::io::{Read, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use refnav::{Config, CrossRefIndexer, IdMint, parse_html_bytes, serialize_document};

#[derive(Parser)]
#[command(name = "refnav")]
#[command(version, about = "Add citation back-links to rendered journal articles", long_about = None)]
#[command(after_help = "EXAMPLES:
    refnav article.html -o out.html      Write the indexed article to out.html
    refnav article.html --report         Print the generated back-links as JSON
    cat article.html | refnav -          Read from stdin, write to stdout")]
struct Cli {
    /// Input HTML file, or - for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (stdout when omitted)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<String>,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Print the back-link report as JSON instead of HTML
    #[arg(long)]
    report: bool,

    /// More log output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress log output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let default = match (cli.quiet, cli.verbose) {
        (true, _) => "off",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let input = read_input(&cli.input)?;
    let mut dom = parse_html_bytes(&input);

    let indexer = CrossRefIndexer::new(&config)?;
    let report = indexer.index(&mut dom, &mut IdMint::new());

    let output = if cli.report {
        let mut json = serde_json::to_string_pretty(&report)?;
        json.push('\n');
        json
    } else {
        serialize_document(&dom)
    };

    match &cli.output {
        Some(path) => std::fs::write(path, output)?,
        None => std::io::stdout().lock().write_all(output.as_bytes())?,
    }

    Ok(())
}

fn read_input(input: &str) -> std::io::Result<Vec<u8>> {
    if input == "-" {
        let mut buf = Vec::new();
        std::io::stdin().lock().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read(input)
    }
}
