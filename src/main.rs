//! folio - EPUB to Obsidian Markdown converter

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use folio::{
    ConvertConfig, Converter, DocumentReader, EpubReader, Metadata, NoProgress, ProgressSink,
    Section,
};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Convert an EPUB into one Obsidian-flavoured Markdown note", long_about = None)]
#[command(after_help = "EXAMPLES:
    folio book.epub                 Write book.md and assets/ next to book.epub
    folio book.epub -o vault/       Write into vault/
    folio -i --json book.epub       Show book metadata as JSON

Set FOLIO_LOG (e.g. FOLIO_LOG=debug) to control log output.")]
struct Cli {
    /// Input EPUB file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output directory (defaults to the input's directory)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Start the note with `# Title` instead of YAML frontmatter
    #[arg(long)]
    no_frontmatter: bool,

    /// Name of the image directory inside the output directory
    #[arg(long, value_name = "NAME", default_value = folio::convert::DEFAULT_ASSETS_DIR)]
    assets_dir: String,

    /// Show book metadata without converting
    #[arg(short, long)]
    info: bool,

    /// Print --info output as JSON
    #[arg(long, requires = "info")]
    json: bool,

    /// Only report warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.quiet);

    let result = if cli.info {
        show_info(&cli.input, cli.json)
    } else {
        convert(&cli)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logger(quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    };
    let log_env = std::env::var("FOLIO_LOG");

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        // html5ever reports every parse error at info
        .filter_module("html5ever", log::LevelFilter::Warn);
    if let Ok(filters) = &log_env {
        builder.parse_filters(filters);
    }
    // Targets only help when the user asked for a specific filter
    builder
        .format_timestamp(None)
        .format_target(log_env.is_ok())
        .init();
}

#[derive(Serialize)]
struct BookInfo<'a> {
    file: &'a Path,
    #[serde(flatten)]
    metadata: &'a Metadata,
    sections: usize,
    assets: usize,
}

fn show_info(path: &Path, json: bool) -> Result<(), String> {
    let reader = EpubReader::open(path).map_err(|e| e.to_string())?;
    let info = BookInfo {
        file: path,
        metadata: reader.metadata(),
        sections: reader.sections().len(),
        assets: reader.assets().len(),
    };

    if json {
        let text = serde_json::to_string_pretty(&info).map_err(|e| e.to_string())?;
        println!("{text}");
        return Ok(());
    }

    let meta = info.metadata;
    println!("File: {}", path.display());
    println!("Title: {}", meta.title);
    if let Some(creator) = meta.creator() {
        println!("Authors: {creator}");
    }
    if !meta.language.is_empty() {
        println!("Language: {}", meta.language);
    }
    if let Some(ref publisher) = meta.publisher {
        println!("Publisher: {publisher}");
    }
    if let Some(ref date) = meta.date {
        println!("Date: {date}");
    }
    if let Some(ref desc) = meta.description {
        let desc = desc.trim();
        match desc.char_indices().nth(200) {
            Some((end, _)) => println!("Description: {}...", &desc[..end]),
            None => println!("Description: {desc}"),
        }
    }
    println!("Sections: {}", info.sections);
    println!("Assets: {}", info.assets);

    Ok(())
}

fn convert(cli: &Cli) -> Result<(), String> {
    let config = ConvertConfig::default()
        .with_frontmatter(!cli.no_frontmatter)
        .with_assets_dir(cli.assets_dir.clone());
    let converter = Converter::with_config(config);

    let mut progress: Box<dyn ProgressSink> = if cli.quiet {
        Box::new(NoProgress)
    } else {
        Box::new(StderrProgress::new())
    };
    let conversion = converter
        .convert_file(&cli.input, cli.output.as_deref(), progress.as_mut())
        .map_err(|e| e.to_string())?;

    if !cli.quiet {
        eprintln!(
            "{} sections, {} images, {} warnings → {}",
            conversion.sections_converted,
            conversion.assets_extracted,
            conversion.warnings.len(),
            conversion.output.display()
        );
    }
    Ok(())
}

/// Chapter counter on stderr, redrawn in place on terminals.
struct StderrProgress {
    total: usize,
    done: usize,
    interactive: bool,
}

impl StderrProgress {
    fn new() -> Self {
        Self {
            total: 0,
            done: 0,
            interactive: std::io::stderr().is_terminal(),
        }
    }
}

impl ProgressSink for StderrProgress {
    fn start(&mut self, total: usize) {
        self.total = total;
        eprintln!("Converting {total} chapters...");
    }

    fn advance(&mut self, _section: &Section) {
        self.done += 1;
        if self.interactive {
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "\r[{}/{}]", self.done, self.total);
            let _ = stderr.flush();
        }
    }

    fn finish(&mut self) {
        if self.interactive {
            eprintln!();
        }
    }
}
