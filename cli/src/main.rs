//! plainpdf CLI - plain text extraction from PDF files

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use plainpdf::detect::media_type_from_path;
use plainpdf::{
    check_media_type, CleanupOptions, CleanupPreset, Error, ExtractedText, Extractor, JsonFormat,
    PageSelection,
};

/// Where the default invocation writes the extracted text.
const DEFAULT_OUTPUT: &str = "extracted-text.txt";

#[derive(Parser)]
#[command(name = "plainpdf")]
#[command(version)]
#[command(about = "Extract plain text from PDF files", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output text file (default: extracted-text.txt)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Text cleanup preset
    #[arg(long, value_enum)]
    cleanup: Option<CleanupLevel>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract plain text
    Text {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Text cleanup preset
        #[arg(long, value_enum)]
        cleanup: Option<CleanupLevel>,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Decode pages on a single thread
        #[arg(long)]
        sequential: bool,

        /// Fail if any page cannot be decoded
        #[arg(long)]
        strict: bool,
    },

    /// Extract text, metadata and page diagnostics as JSON
    Json {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum CleanupLevel {
    /// Unicode normalization and space collapsing
    Minimal,
    /// Ligatures, hyphenation and page numbers as well
    Standard,
    /// Everything, including private-use characters
    Aggressive,
}

impl From<CleanupLevel> for CleanupPreset {
    fn from(level: CleanupLevel) -> Self {
        match level {
            CleanupLevel::Minimal => CleanupPreset::Minimal,
            CleanupLevel::Standard => CleanupPreset::Standard,
            CleanupLevel::Aggressive => CleanupPreset::Aggressive,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Text {
            input,
            output,
            cleanup,
            pages,
            sequential,
            strict,
        }) => cmd_text(
            &input,
            output.as_deref(),
            cleanup,
            pages.as_deref(),
            sequential,
            strict,
        ),
        Some(Commands::Json {
            input,
            output,
            compact,
        }) => cmd_json(&input, output.as_deref(), compact),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            if let Some(input) = cli.input {
                cmd_extract(&input, cli.output.as_deref(), cli.cleanup)
            } else {
                println!("{}", "Usage: plainpdf <FILE> [OUTPUT]".yellow());
                println!("       plainpdf --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Could not process this file".red().bold(), e);
        std::process::exit(1);
    }
}

/// Reject files whose extension does not declare a PDF.
fn ensure_pdf(input: &Path) -> Result<(), Error> {
    match media_type_from_path(input) {
        Some(media_type) => check_media_type(media_type),
        None => Err(Error::UnsupportedMediaType("a file without extension".to_string())),
    }
}

fn extractor(cleanup: Option<CleanupLevel>) -> Extractor {
    match cleanup {
        Some(level) => Extractor::new().with_cleanup(CleanupOptions::from_preset(level.into())),
        None => Extractor::new(),
    }
}

fn spinner(message: &'static str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Print a one-line outcome: clean, or degraded with the affected pages.
fn report(extracted: &ExtractedText) {
    let diagnostics = extracted.diagnostics();
    if diagnostics.is_empty() {
        eprintln!(
            "{} {} pages, {} characters",
            "Text extracted:".green().bold(),
            extracted.page_count(),
            extracted.char_count()
        );
        return;
    }
    let pages: Vec<String> = diagnostics
        .iter()
        .map(|(page, diagnostic)| format!("page {page} ({diagnostic})"))
        .collect();
    eprintln!(
        "{} {}",
        "Processed with degraded fidelity:".yellow().bold(),
        pages.join(", ")
    );
}

fn cmd_extract(
    input: &Path,
    output: Option<&Path>,
    cleanup: Option<CleanupLevel>,
) -> Result<(), Box<dyn std::error::Error>> {
    ensure_pdf(input)?;

    let pb = spinner("Processing PDF...")?;
    let result = extractor(cleanup).extract_file(input);
    pb.finish_and_clear();
    let extracted = result?;

    let text = extracted.text();
    println!("{}", text);

    let path = output.unwrap_or_else(|| Path::new(DEFAULT_OUTPUT));
    fs::write(path, &text)?;
    eprintln!("{} {}", "Saved to".green(), path.display());
    report(&extracted);

    Ok(())
}

fn cmd_text(
    input: &Path,
    output: Option<&Path>,
    cleanup: Option<CleanupLevel>,
    pages: Option<&str>,
    sequential: bool,
    strict: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    ensure_pdf(input)?;

    let page_selection = match pages {
        Some(p) => PageSelection::parse(p)?,
        None => PageSelection::All,
    };

    let mut extractor = extractor(cleanup).with_pages(page_selection);
    if sequential {
        extractor = extractor.sequential();
    }
    if strict {
        extractor = extractor.strict();
    }

    let extracted = extractor.extract_file(input)?;
    let text = extracted.text();

    if let Some(path) = output {
        fs::write(path, &text)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", text);
    }
    report(&extracted);

    Ok(())
}

fn cmd_json(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    ensure_pdf(input)?;

    let extracted = Extractor::new().extract_file(input)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = plainpdf::render::to_json(&extracted, format)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    ensure_pdf(input)?;

    // Encrypted files cannot be loaded; report what the header says.
    let doc = match plainpdf::load_file(input) {
        Ok(doc) => doc,
        Err(Error::EncryptedDocument) => {
            let format = plainpdf::detect_format_from_path(input)?;
            println!("{}", "Document Information".cyan().bold());
            println!("{}", "─".repeat(40).dimmed());
            println!("{}: {}", "File".bold(), input.display());
            println!("{}: PDF {}", "Format".bold(), format.version);
            println!("{}: Yes", "Encrypted".bold());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let metadata = doc.metadata();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), metadata.pdf_version);
    println!("{}: {}", "Pages".bold(), metadata.page_count);
    println!(
        "{}: {}",
        "Linearized".bold(),
        if doc.format().linearized { "Yes" } else { "No" }
    );
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if metadata.encrypted { "Yes" } else { "No" }
    );

    if let Some(ref title) = metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref subject) = metadata.subject {
        println!("{}: {}", "Subject".bold(), subject);
    }
    if let Some(ref creator) = metadata.creator {
        println!("{}: {}", "Creator".bold(), creator);
    }
    if let Some(ref producer) = metadata.producer {
        println!("{}: {}", "Producer".bold(), producer);
    }
    if let Some(ref created) = metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = metadata.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    let extracted = Extractor::new().extract_document(&doc)?;
    let text = extracted.text();

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Words".bold(), text.split_whitespace().count());
    println!("{}: {}", "Characters".bold(), extracted.char_count());
    println!("{}: {}", "Fonts".bold(), doc.fonts_decoded());
    println!(
        "{}: {}",
        "Degraded pages".bold(),
        extracted.diagnostics().len()
    );

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "plainpdf".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Plain text extraction from PDF files");
    println!();
    println!("License: MIT");
}
