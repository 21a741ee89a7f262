use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdf_engine::{default_engine, DocumentHandle, OpenSource, PdfEngine, RenderRequest};
use pdf_signer_core::{
    load_sidecar, render_overlays, save_sidecar, sidecar_path, ActionEffect, AnnotatorConfig,
    AnnotatorSession, DocumentSource, DocumentState, PageLayout, SessionAction, PDF_MIME,
};
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub mod compose;

#[derive(Debug, Parser)]
#[command(name = "pdf-signer")]
#[command(about = "Annotate and sign PDF documents")]
pub struct Cli {
    /// JSON configuration file; environment overrides still apply.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print machine-readable PDF metadata.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Replay recorded user actions and export the resulting annotations.
    Annotate {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// JSON array of session actions.
        #[arg(long, value_name = "ACTIONS")]
        actions: PathBuf,
        /// Sidecar to write; defaults to `<FILE>.pdf-signer.json`.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Start from the annotations already in the output sidecar.
        #[arg(long)]
        append: bool,
    },
    /// Render a page with its annotations composited on top.
    Render {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Sidecar to read; defaults to `<FILE>.pdf-signer.json` when present.
        #[arg(long)]
        annotations: Option<PathBuf>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 1.0)]
        scale: f32,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: u32,
    first_page_size_pt: Option<PageSizeOutput>,
}

#[derive(Debug, Serialize)]
struct PageSizeOutput {
    width: f32,
    height: f32,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Info { file } => run_info(&file),
        Commands::Annotate { file, actions, output, append } => {
            let config = load_config(cli.config.as_deref())?;
            run_annotate(&file, &actions, output.as_deref(), append, config)
        }
        Commands::Render { file, annotations, page, scale, output } => {
            let config = load_config(cli.config.as_deref())?;
            run_render(&file, annotations.as_deref(), page, scale, output.as_deref(), &config)
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AnnotatorConfig> {
    let config = match path {
        Some(path) => AnnotatorConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AnnotatorConfig::default(),
    };
    config.merge_env().context("invalid configuration in environment")
}

fn run_info(file: &Path) -> Result<()> {
    let bytes = read_pdf(file)?;

    let mut engine = default_engine();
    let handle = engine.open(OpenSource::Bytes(bytes)).context("failed to open PDF")?;

    let page_count = engine.page_count(handle)?;
    let first_page_size_pt = if page_count > 0 {
        let size = engine.page_size(handle, 1)?;
        Some(PageSizeOutput { width: size.width_pt, height: size.height_pt })
    } else {
        None
    };

    let payload = InfoOutput { path: file.display().to_string(), page_count, first_page_size_pt };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    engine.close(handle)?;

    Ok(())
}

fn run_annotate(
    file: &Path,
    actions_path: &Path,
    output: Option<&Path>,
    append: bool,
    config: AnnotatorConfig,
) -> Result<()> {
    ensure_file_exists(file)?;
    let bytes = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let actions_json = fs::read_to_string(actions_path)
        .with_context(|| format!("failed to read actions {}", actions_path.display()))?;
    let actions: Vec<SessionAction> =
        serde_json::from_str(&actions_json).context("failed to parse actions")?;

    let mut session = AnnotatorSession::new(config);
    let source = DocumentSource::new(display_name(file), sniff_mime(file, &bytes));
    let ticket = match session.open_document(source) {
        Ok(ticket) => ticket,
        Err(error) => anyhow::bail!("not a PDF document: {error}"),
    };

    let mut engine = default_engine();
    let opened = engine.open(OpenSource::Bytes(bytes));
    let handle = opened.as_ref().ok().copied();
    session.complete_load(ticket, opened.and_then(|handle| engine.page_count(handle)));
    if let DocumentState::Failed { failure, .. } = session.state() {
        anyhow::bail!("failed to open PDF: {failure}");
    }
    let handle = handle.context("failed to open PDF")?;

    let output = output.map(ToOwned::to_owned).unwrap_or_else(|| sidecar_path(file));
    if append {
        if let Some(existing) = load_sidecar(&output)? {
            let kept = session.restore_annotations(existing.annotations)?;
            log::info!("restored {kept} annotation(s) from {}", output.display());
        }
    }

    let mut layout_page = 0;
    for (index, action) in actions.into_iter().enumerate() {
        let current = session.navigator().current_page();
        if current != layout_page {
            sync_layout(&mut session, &engine, handle, current)?;
            layout_page = current;
        }

        match session.apply(action) {
            ActionEffect::None => {}
            effect => log::debug!("action {index}: {effect:?}"),
        }
        for notice in session.drain_notices() {
            eprintln!("{}: {notice}", notice.severity.title().to_lowercase());
        }
    }

    let sidecar = session.export_sidecar()?;
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    save_sidecar(&sidecar, &output)
        .with_context(|| format!("failed to write annotations to {}", output.display()))?;

    println!("{}", output.display());

    engine.close(handle)?;

    Ok(())
}

/// Keep the session's page layout in step with the page being viewed
fn sync_layout(
    session: &mut AnnotatorSession,
    engine: &impl PdfEngine,
    handle: DocumentHandle,
    page: u32,
) -> Result<()> {
    let size = engine.page_size(handle, page)?;
    let origin = session.layout().origin;
    session.apply(SessionAction::SetPageLayout(PageLayout {
        origin,
        page_width: size.width_pt,
        page_height: size.height_pt,
    }));
    Ok(())
}

fn run_render(
    file: &Path,
    annotations: Option<&Path>,
    page: u32,
    scale: f32,
    output: Option<&Path>,
    config: &AnnotatorConfig,
) -> Result<()> {
    let bytes = read_pdf(file)?;

    if page == 0 {
        anyhow::bail!("--page is 1-based and must be >= 1");
    }
    let scale = config.clamp_scale(scale);

    let mut engine = default_engine();
    let handle = engine.open(OpenSource::Bytes(bytes)).context("failed to open PDF")?;

    let mut image = engine
        .render_page(handle, RenderRequest { page_number: page, scale })
        .context("failed to render page")?;

    let sidecar_file = annotations.map(ToOwned::to_owned).unwrap_or_else(|| sidecar_path(file));
    let sidecar = load_sidecar(&sidecar_file)
        .with_context(|| format!("failed to read annotations {}", sidecar_file.display()))?;
    match sidecar {
        Some(sidecar) => {
            let overlays = render_overlays(&sidecar.page_annotations(page), scale, config, None);
            log::info!("compositing {} overlay(s) on page {page}", overlays.len());
            compose::composite_overlays(&mut image, &overlays);
        }
        None if annotations.is_some() => {
            anyhow::bail!("annotations file does not exist: {}", sidecar_file.display());
        }
        None => {}
    }

    let output =
        output.map(ToOwned::to_owned).unwrap_or_else(|| default_render_output(file, page));

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }

    image
        .save(&output)
        .with_context(|| format!("failed to write image to {}", output.display()))?;

    println!("{}", output.display());

    engine.close(handle)?;

    Ok(())
}

/// Read a file that must be a PDF by content or extension
fn read_pdf(path: &Path) -> Result<Vec<u8>> {
    ensure_file_exists(path)?;
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    let mime = sniff_mime(path, &bytes);
    if mime != PDF_MIME {
        anyhow::bail!("not a PDF document: {} ({mime})", path.display());
    }

    Ok(bytes)
}

/// MIME type from the `%PDF-` magic, falling back to the extension
fn sniff_mime(path: &Path, bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"%PDF-") {
        return PDF_MIME;
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => PDF_MIME,
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "txt" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

fn ensure_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn default_render_output(file: &Path, page: u32) -> PathBuf {
    let stem = file.file_stem().and_then(|name| name.to_str()).unwrap_or("page");

    file.with_file_name(format!("{stem}-page-{page}.png"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_prefers_magic_over_extension() {
        assert_eq!(sniff_mime(Path::new("scan.png"), b"%PDF-1.7\n"), PDF_MIME);
        assert_eq!(sniff_mime(Path::new("scan.png"), b"\x89PNG"), "image/png");
        assert_eq!(sniff_mime(Path::new("broken.PDF"), b"garbage"), PDF_MIME);
        assert_eq!(sniff_mime(Path::new("noext"), b"garbage"), "application/octet-stream");
    }

    #[test]
    fn default_render_output_sits_next_to_input() {
        assert_eq!(
            default_render_output(Path::new("/docs/lease.pdf"), 3),
            PathBuf::from("/docs/lease-page-3.png")
        );
    }
}
