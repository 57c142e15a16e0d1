//! Command-line interface for the harvester.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{
    resolve_endpoint, DEFAULT_MAX_RESPONSE_SIZE, DEFAULT_METADATA_PREFIX, DEFAULT_STYLESHEET,
    HTTP_TIMEOUT_SECS, TEST_RECORD_LIMIT,
};
use crate::error::Result;
use crate::harvester::Harvester;
use crate::http::TransportSettings;
use crate::output::{load_csv, save_csv, save_document, save_xml};
use crate::types::{HarvestRequest, Record, Verb};

/// OAI-PMH Harvester - Collect metadata records from OAI-PMH repositories.
#[derive(Parser)]
#[command(name = "oai-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Harvest from an endpoint and save the result.
    Harvest(HarvestArgs),

    /// Merge CSV files into one XML document.
    Convert {
        /// CSV files to merge, in order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output XML file
        #[arg(short, long)]
        output: PathBuf,

        /// Stylesheet referenced from the XML output
        #[arg(long)]
        stylesheet: Option<String>,
    },
}

/// Output file format for record lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Xml,
    Both,
}

#[derive(Debug, Args)]
pub struct HarvestArgs {
    /// Output file
    pub output: PathBuf,

    /// Set to harvest (required for ListRecords and ListIdentifiers)
    pub set: Option<String>,

    /// Known endpoint alias (e.g. "a") or absolute http(s) URL
    #[arg(short, long)]
    pub endpoint: String,

    /// OAI-PMH verb, by name or menu key 1-5
    #[arg(short, long)]
    pub verb: Verb,

    /// Metadata prefix for list requests
    #[arg(long, default_value = DEFAULT_METADATA_PREFIX)]
    pub metadata_prefix: String,

    /// Only harvest the first 20 records
    #[arg(long)]
    pub test: bool,

    /// Stop after this many records (overrides --test)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output format for record lists
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Also write an XML file next to the CSV output
    #[arg(long)]
    pub save_xml: bool,

    /// Stylesheet referenced from XML output
    #[arg(long, conflicts_with = "no_stylesheet")]
    pub stylesheet: Option<String>,

    /// Write XML output without a stylesheet reference
    #[arg(long)]
    pub no_stylesheet: bool,

    /// Keep namespaces in documents of non-list verbs
    #[arg(long)]
    pub raw: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = HTTP_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Maximum response size in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_RESPONSE_SIZE)]
    pub max_size: u64,
}

impl HarvestArgs {
    /// Record cap: an explicit `--limit` wins over `--test`.
    pub fn record_limit(&self) -> Option<usize> {
        self.limit.or(self.test.then_some(TEST_RECORD_LIMIT))
    }

    /// Stylesheet for XML output, unless disabled.
    pub fn stylesheet(&self) -> Option<&str> {
        if self.no_stylesheet {
            None
        } else {
            Some(self.stylesheet.as_deref().unwrap_or(DEFAULT_STYLESHEET))
        }
    }

    /// CSV and XML paths for record-list output.
    ///
    /// When both are written and OUTPUT already ends in `.xml`, the CSV
    /// goes to the same path with a `.csv` extension instead.
    pub fn output_paths(&self) -> (Option<PathBuf>, Option<PathBuf>) {
        match (self.format, self.save_xml) {
            (OutputFormat::Xml, _) => (None, Some(self.output.clone())),
            (OutputFormat::Csv, false) => (Some(self.output.clone()), None),
            (OutputFormat::Csv, true) | (OutputFormat::Both, _) => {
                let xml_path = self.output.with_extension("xml");
                let csv_path = if xml_path == self.output {
                    self.output.with_extension("csv")
                } else {
                    self.output.clone()
                };
                (Some(csv_path), Some(xml_path))
            }
        }
    }

    fn to_request(&self) -> Result<HarvestRequest> {
        let mut request = HarvestRequest::new(resolve_endpoint(&self.endpoint)?, self.verb)
            .with_metadata_prefix(self.metadata_prefix.clone());
        if let Some(set) = &self.set {
            request = request.with_set(set.clone());
        }
        if let Some(limit) = self.record_limit() {
            request = request.with_record_limit(limit);
        }
        request.validate()?;
        Ok(request)
    }

    fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            timeout: Duration::from_secs(self.timeout),
            max_response_bytes: self.max_size,
            ..TransportSettings::default()
        }
    }
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Harvest(args) => harvest_command(&args),
        Commands::Convert {
            inputs,
            output,
            stylesheet,
        } => convert_command(&inputs, &output, stylesheet.as_deref()),
    }
}

/// Execute the harvest command.
fn harvest_command(args: &HarvestArgs) -> Result<()> {
    // Validate inputs before making HTTP requests
    let request = args.to_request()?;

    println!(
        "{} {} from {}",
        style("Harvesting").bold(),
        style(request.verb).cyan(),
        style(&request.endpoint).green()
    );
    if let Some(set) = &request.set_name {
        println!("  Set: {}", style(set).cyan());
    }
    println!();

    let harvester = Harvester::http(args.transport_settings())?;

    if !request.verb.paginates() {
        let document = harvester.fetch_document(&request, !args.raw)?;
        save_document(&document, &args.output)?;
        print_saved(&args.output);
        return Ok(());
    }

    let pb = spinner();
    pb.set_message("Requesting first page...");

    let records = match harvester.harvest_with_progress(&request, |progress| {
        pb.set_message(format!(
            "Page {}: {} records",
            progress.page, progress.total_records
        ));
    }) {
        Ok(records) => records,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };

    pb.finish_and_clear();
    println!("  Records: {}", style(records.len()).green());

    let (csv_path, xml_path) = args.output_paths();
    if let Some(path) = csv_path {
        save_csv(&records, &path)?;
        print_saved(&path);
    }
    if let Some(path) = xml_path {
        save_xml(&records, &path, args.stylesheet())?;
        print_saved(&path);
    }

    Ok(())
}

/// Execute the convert command.
fn convert_command(inputs: &[PathBuf], output: &Path, stylesheet: Option<&str>) -> Result<()> {
    let mut records: Vec<Record> = Vec::new();
    for input in inputs {
        let loaded = load_csv(input)?;
        println!(
            "  {}: {} records",
            style(input.display()).cyan(),
            loaded.len()
        );
        records.extend(loaded);
    }

    save_xml(&records, output, stylesheet)?;
    print_saved(output);

    Ok(())
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn print_saved(path: &Path) {
    println!("{} {}", style("Saved to:").green().bold(), path.display());
}
