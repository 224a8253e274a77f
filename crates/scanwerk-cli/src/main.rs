// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk — images to PDF, PDF to images.
//
// Entry point. Initialises logging, loads configuration, and runs one of the
// two workflows.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use scanwerk_core::{AppConfig, OutputFormat, PaperSize};
use scanwerk_document::{
    AssemblyOptions, BatchProgressTracker, CancellationToken, DocumentAssembler,
    DocumentExtractor, EnhancementPipeline, ExtractOptions, PdfReader, PdfWriter, Session,
};
use tracing::{debug, info, warn};

/// Largest source image accepted for assembly.
const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;
/// Largest PDF accepted for extraction.
const MAX_PDF_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(name = "scanwerk", author, version, about, long_about = None)]
struct Cli {
    /// JSON settings file; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Work on several pages/images at once
    #[arg(long, global = true)]
    parallel: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Combine images into one PDF, one image per page
    Assemble {
        /// Source images, in page order
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Output PDF (default: images-to-pdf-<timestamp>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Clean up photographed documents before placing them
        #[arg(long)]
        scan: bool,

        /// Paper size: a4, a3, a5, letter, legal, tabloid or WxH in mm
        #[arg(long, value_parser = parse_paper)]
        paper: Option<PaperSize>,

        /// Page margin in millimetres
        #[arg(long)]
        margin: Option<f32>,

        /// Encoding of embedded images: png or jpeg
        #[arg(long, value_parser = parse_format)]
        format: Option<OutputFormat>,
    },
    /// Render every page of a PDF to an image
    Extract {
        /// Source PDF
        pdf: PathBuf,

        /// Output directory, or archive path with --zip
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Image format: png or jpeg
        #[arg(long, value_parser = parse_format)]
        format: Option<OutputFormat>,

        /// Pixels per PDF point (1 = 72 dpi)
        #[arg(long)]
        scale: Option<f32>,

        /// Bundle all pages into one ZIP archive
        #[arg(long)]
        zip: bool,
    },
}

fn parse_paper(value: &str) -> Result<PaperSize, String> {
    PaperSize::from_name(value).ok_or_else(|| format!("unknown paper size '{}'", value))
}

fn parse_format(value: &str) -> Result<OutputFormat, String> {
    OutputFormat::from_name(value).ok_or_else(|| format!("unknown image format '{}'", value))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("cannot load config {}", path.display()))?,
        None => AppConfig::default(),
    };
    config.parallel |= cli.parallel;

    tracing::info!("Scanwerk starting");

    match cli.command {
        Command::Assemble {
            images,
            output,
            scan,
            paper,
            margin,
            format,
        } => {
            if let Some(paper) = paper {
                config.paper_size = paper;
            }
            if let Some(margin) = margin {
                config.margin_mm = margin;
            }
            if let Some(format) = format {
                config.assembly_format = format;
            }
            let output = output.unwrap_or_else(|| PathBuf::from(assembly_file_name(Utc::now())));
            run_assemble(&config, &images, scan, &output)
        }
        Command::Extract {
            pdf,
            output,
            format,
            scale,
            zip,
        } => {
            if let Some(format) = format {
                config.extract_format = format;
            }
            if let Some(scale) = scale {
                config.extract_scale = scale;
            }
            run_extract(&config, &pdf, output, zip)
        }
    }
}

fn run_assemble(
    config: &AppConfig,
    images: &[PathBuf],
    scan: bool,
    output: &Path,
) -> anyhow::Result<()> {
    let mut inputs = Vec::with_capacity(images.len());
    for path in images {
        let size = fs::metadata(path)
            .with_context(|| format!("cannot read {}", path.display()))?
            .len();
        if size > MAX_IMAGE_BYTES {
            warn!(path = %path.display(), size, "Skipping image larger than 10 MB");
            continue;
        }
        let bytes = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
        inputs.push((display_name(path), bytes));
    }
    if inputs.is_empty() {
        bail!("no usable images (each must be at most 10 MB)");
    }

    let mut session = Session::new();
    let batch = session.add_encoded_batch(inputs);
    for failure in &batch.failures {
        warn!(error = %failure, "Image skipped");
    }

    if scan {
        session.enhance_all(&EnhancementPipeline::new(config.enhancement));
    }

    let assembler = DocumentAssembler::new(
        config.page_spec(),
        AssemblyOptions {
            image_format: config.assembly_format,
            jpeg_quality: config.assembly_jpeg_quality,
            parallel: config.parallel,
        },
    );
    let progress = progress_logger("assemble");
    let assembly = assembler.assemble_with(
        &session.ordered(),
        scan,
        PdfWriter::new("Images to PDF"),
        &progress,
        &CancellationToken::new(),
    )?;

    fs::write(output, &assembly.bytes)
        .with_context(|| format!("cannot write {}", output.display()))?;
    info!(
        pages = assembly.page_count,
        skipped = assembly.failures.len() + batch.failures.len(),
        output = %output.display(),
        "PDF written"
    );
    println!("Wrote {} page(s) to {}", assembly.page_count, output.display());
    Ok(())
}

fn run_extract(
    config: &AppConfig,
    pdf: &Path,
    output: Option<PathBuf>,
    zip: bool,
) -> anyhow::Result<()> {
    let size = fs::metadata(pdf)
        .with_context(|| format!("cannot read {}", pdf.display()))?
        .len();
    if size > MAX_PDF_BYTES {
        bail!("{} is larger than 50 MB", pdf.display());
    }

    let reader = PdfReader::open(pdf)?;
    let extractor = DocumentExtractor::new(ExtractOptions {
        scale: config.extract_scale,
        format: config.extract_format,
        jpeg_quality: config.extract_jpeg_quality,
        parallel: config.parallel,
    });
    let progress = progress_logger("extract");
    let extraction = extractor.extract_with(&reader, &progress, &CancellationToken::new())?;
    for failure in extraction.failures() {
        warn!(page = failure.page_number, error = %failure.error, "Page skipped");
    }

    if zip {
        let archive = extraction.to_zip()?;
        let path = output.unwrap_or_else(|| PathBuf::from(archive_file_name(Utc::now())));
        fs::write(&path, archive).with_context(|| format!("cannot write {}", path.display()))?;
        println!("Wrote {} page(s) to {}", extraction.len(), path.display());
    } else {
        let dir = output.unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dir).with_context(|| format!("cannot create {}", dir.display()))?;
        for page in extraction.pages() {
            let path = dir.join(page.file_name());
            fs::write(&path, &page.encoded)
                .with_context(|| format!("cannot write {}", path.display()))?;
            debug!(path = %path.display(), "Page written");
        }
        println!("Wrote {} page(s) to {}", extraction.len(), dir.display());
    }
    Ok(())
}

fn progress_logger(run: &'static str) -> BatchProgressTracker {
    BatchProgressTracker::with_observer(move |state| {
        debug!(run, completed = state.completed, total = state.total, "Progress");
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `2026-03-01T09-05-00`: ISO-8601 to the second, colons replaced.
fn file_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H-%M-%S").to_string()
}

fn assembly_file_name(now: DateTime<Utc>) -> String {
    format!("images-to-pdf-{}.pdf", file_timestamp(now))
}

fn archive_file_name(now: DateTime<Utc>) -> String {
    format!("pdf-images-{}.zip", file_timestamp(now))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn default_names_carry_a_timestamp() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 5, 0).unwrap();
        assert_eq!(assembly_file_name(now), "images-to-pdf-2026-03-01T09-05-00.pdf");
        assert_eq!(archive_file_name(now), "pdf-images-2026-03-01T09-05-00.zip");
    }

    #[test]
    fn assemble_flags_parse() {
        let cli = Cli::try_parse_from([
            "scanwerk", "assemble", "a.png", "b.jpg", "--scan", "--paper", "letter", "--margin",
            "5",
        ])
        .unwrap();
        match cli.command {
            Command::Assemble { images, scan, paper, margin, .. } => {
                assert_eq!(images.len(), 2);
                assert!(scan);
                assert_eq!(paper, Some(PaperSize::Letter));
                assert_eq!(margin, Some(5.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn extract_flags_parse() {
        let cli = Cli::try_parse_from([
            "scanwerk", "extract", "doc.pdf", "--format", "jpg", "--scale", "1.5", "--zip",
            "--parallel",
        ])
        .unwrap();
        assert!(cli.parallel);
        match cli.command {
            Command::Extract { format, scale, zip, .. } => {
                assert_eq!(format, Some(OutputFormat::Jpeg));
                assert_eq!(scale, Some(1.5));
                assert!(zip);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!(Cli::try_parse_from(["scanwerk", "assemble", "a.png", "--paper", "b7"]).is_err());
        assert!(Cli::try_parse_from(["scanwerk", "extract", "d.pdf", "--format", "gif"]).is_err());
        assert!(Cli::try_parse_from(["scanwerk", "assemble"]).is_err());
    }
}
