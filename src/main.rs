//! proposal-pdf CLI
//!
//! Paginates an HTML view, or a proposal link plus its pricing, into a PDF.

use anyhow::{bail, Context as _, Result};
use clap::{Args, Parser, Subcommand};
use proposal_pdf::emit::DownloadDir;
use proposal_pdf::proposal::{decode_proposal, render_proposal_html, PricingBreakdown, Proposal};
use proposal_pdf::{DownloadOutcome, ExportConfig, Exporter, RenderedView};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "proposal-pdf", version, about = "Paginate sales proposals into letter-sized PDFs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Paginate an HTML file
    RenderHtml {
        input: PathBuf,
        /// Used to build the output filename
        #[arg(long, default_value = "Untitled")]
        subject: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Render a proposal link with its pricing breakdown
    RenderProposal {
        /// Encoded proposal id from the proposal URL
        id: String,
        /// JSON file holding the priced breakdown
        #[arg(long)]
        pricing: PathBuf,
        /// Also write the intermediate HTML view here
        #[arg(long)]
        html: Option<PathBuf>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the configuration carried by a proposal link
    Decode { id: String },
}

#[derive(Args)]
struct OutputArgs {
    /// Directory the PDF is saved into
    #[arg(short, long, default_value = ".")]
    out: PathBuf,
    /// Font file to use instead of system fonts
    #[arg(long)]
    font: Option<PathBuf>,
    /// Device pixels per CSS pixel
    #[arg(long, default_value_t = 2.0)]
    density: f32,
    #[arg(long, default_value_t = 30000)]
    timeout_ms: u64,
}

impl OutputArgs {
    fn config(&self) -> ExportConfig {
        ExportConfig {
            density: self.density,
            timeout_ms: self.timeout_ms,
            font_path: self.font.clone(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::RenderHtml { input, subject, output } => {
            let html = std::fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            export(RenderedView::from_html(&html), &subject, output.config(), &output.out).await
        }
        Commands::RenderProposal { id, pricing, html, output } => {
            let config = decode_proposal(&id).context("decoding proposal link")?;
            let raw = std::fs::read(&pricing)
                .with_context(|| format!("reading {}", pricing.display()))?;
            let pricing: PricingBreakdown =
                serde_json::from_slice(&raw).context("parsing pricing breakdown")?;
            let proposal = Proposal { config, pricing };
            let markup = render_proposal_html(&proposal);
            if let Some(path) = html {
                std::fs::write(&path, &markup)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            let config = ExportConfig { footer: Some(proposal.page_footer()), ..output.config() };
            export(RenderedView::from_html(&markup), proposal.subject(), config, &output.out).await
        }
        Commands::Decode { id } => {
            let config = decode_proposal(&id).context("decoding proposal link")?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn export(view: RenderedView, subject: &str, config: ExportConfig, out: &Path) -> Result<()> {
    let exporter = Exporter::new(config, DownloadDir::new(out))
        .await
        .context("starting exporter")?;
    let outcome = exporter.download(view, subject).await.map_err(|e| {
        log::error!("{}", e);
        anyhow::anyhow!(e.user_message())
    })?;
    exporter.close().await?;
    match outcome {
        DownloadOutcome::Saved(summary) => {
            println!("{} ({} pages)", summary.path.display(), summary.page_count);
            Ok(())
        }
        DownloadOutcome::Ignored => bail!("an export is already running"),
    }
}
