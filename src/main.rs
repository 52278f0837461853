use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, info_span, Instrument};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

use ortomail::models::FormalityInput;
use ortomail::{
    generate_stream, load_request, read_text, run_all_detailed, style_variants, write_sse_event,
    EmailRequest, ErrorOutput, GenerationError, GenerationOutput, HumanEmails, LlmError,
    OpenAiClient, OpenAiConfig, PipelineConfig, ValidationError,
};

#[derive(Parser)]
#[command(name = "ortomail")]
#[command(author, version, about = "Professional Spanish email generation pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one or more finished versions of an email
    Generate(GenerateArgs),

    /// Stream a single plain-text email as SSE frames on stdout
    Stream {
        /// What the email should say
        #[arg(short, long)]
        instruction: String,

        /// Sender name, used in the closing
        #[arg(long)]
        sender: String,

        /// Recipient name, used in the salutation
        #[arg(long)]
        recipient: String,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Request file (JSON); flags below override its fields
    #[arg(short, long)]
    request: Option<PathBuf>,

    /// What the email should say
    #[arg(short, long)]
    instruction: Option<String>,

    #[arg(long)]
    sender: Option<String>,

    #[arg(long)]
    recipient: Option<String>,

    #[arg(long)]
    sender_role: Option<String>,

    #[arg(long)]
    recipient_role: Option<String>,

    /// compose or reply
    #[arg(long)]
    mode: Option<String>,

    /// File holding the email being replied to
    #[arg(long)]
    original: Option<PathBuf>,

    /// auto, informal, or formal
    #[arg(long)]
    formality: Option<String>,

    /// neutral, warm, firm, or urgent
    #[arg(long)]
    tone: Option<String>,

    /// brief, detailed, or complete
    #[arg(long)]
    length: Option<String>,

    /// Recipient country
    #[arg(long)]
    region: Option<String>,

    /// Number of versions (1-3)
    #[arg(long)]
    versions: Option<u32>,

    /// Output file for the JSON report (stdout when absent)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output file for the versions as plain text
    #[arg(long)]
    human_readable: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate(args) => {
            setup_logging(args.verbose);
            generate(args).await
        }
        Commands::Stream {
            instruction,
            sender,
            recipient,
            verbose,
        } => {
            setup_logging(verbose);
            stream(instruction, sender, recipient).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::from(exit_code(status_of(&err)))
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    // stdout carries the report, logs go to stderr
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

/// HTTP-style status of a failed command
fn status_of(err: &anyhow::Error) -> u16 {
    if let Some(e) = err.downcast_ref::<ValidationError>() {
        e.status_code()
    } else if let Some(e) = err.downcast_ref::<GenerationError>() {
        e.status_code()
    } else if let Some(e) = err.downcast_ref::<LlmError>() {
        e.status_code()
    } else {
        500
    }
}

fn exit_code(status: u16) -> u8 {
    match status {
        400 => 2,
        502 => 3,
        _ => 1,
    }
}

fn build_request(args: &GenerateArgs) -> Result<EmailRequest> {
    let mut request = match &args.request {
        Some(path) => load_request(path)?,
        None => EmailRequest::default(),
    };

    let overrides = [
        (&mut request.instruction, &args.instruction),
        (&mut request.sender_name, &args.sender),
        (&mut request.recipient_name, &args.recipient),
        (&mut request.sender_role, &args.sender_role),
        (&mut request.recipient_role, &args.recipient_role),
        (&mut request.mode, &args.mode),
        (&mut request.tone, &args.tone),
        (&mut request.length, &args.length),
        (&mut request.region, &args.region),
    ];
    for (field, value) in overrides {
        if value.is_some() {
            *field = value.clone();
        }
    }

    if let Some(formality) = &args.formality {
        request.formality = Some(FormalityInput::Plain(formality.clone()));
        request.formalidad = None;
    }
    if let Some(path) = &args.original {
        request.original_message = Some(read_text(path)?);
    }
    if let Some(versions) = args.versions {
        request.versions = Some(serde_json::Value::from(versions));
    }

    Ok(request)
}

async fn generate(args: GenerateArgs) -> Result<()> {
    let request_id = Uuid::new_v4();
    let request = build_request(&args)?;

    let normalized = match request.normalize() {
        Ok(normalized) => normalized,
        Err(err) => {
            print_error(request_id, err.status_code(), err.to_string(), Vec::new())?;
            return Err(err.into());
        }
    };

    let span = info_span!("generate", %request_id);
    async move {
        let api_config = OpenAiConfig::from_env()?;
        let pipeline_config = PipelineConfig::from(&api_config);
        let client = OpenAiClient::new(api_config)?;

        let variants = style_variants(&normalized.request.style, normalized.versions);
        info!(
            "Requested {} versions (tone {}, length {}, region {})",
            variants.len(),
            normalized.request.style.tone.as_str(),
            normalized.request.style.length.as_str(),
            normalized.request.style.region.label()
        );

        let report =
            run_all_detailed(&client, &normalized.request, &variants, &pipeline_config).await;
        let output = GenerationOutput::from_report(request_id, &report);

        if output.versions.is_empty() {
            let err = GenerationError::TotalFailure {
                attempted: output.requested,
                failures: output.failures.clone(),
            };
            print_error(request_id, err.status_code(), err.to_string(), output.failures)?;
            return Err(err.into());
        }

        match &args.output {
            Some(path) => {
                output.write_json(path)?;
                info!("Output written to {:?}", path);
            }
            None => output.write_to(std::io::stdout().lock())?,
        }
        if let Some(path) = &args.human_readable {
            HumanEmails::new(&output.versions).write_file(path)?;
            info!("Human-readable output written to {:?}", path);
        }

        info!(
            "Complete: {} of {} versions",
            output.versions.len(),
            output.requested
        );
        Ok::<(), anyhow::Error>(())
    }
    .instrument(span)
    .await
}

fn print_error(
    request_id: Uuid,
    status: u16,
    error: String,
    failures: Vec<ortomail::pipeline::VersionFailure>,
) -> Result<()> {
    let body = ErrorOutput {
        request_id,
        status,
        error,
        failures,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&body).context("Failed to encode error")?
    );
    Ok(())
}

async fn stream(instruction: String, sender: String, recipient: String) -> Result<()> {
    let request = EmailRequest {
        instruction: Some(instruction),
        sender_name: Some(sender),
        recipient_name: Some(recipient),
        ..Default::default()
    };
    let normalized = request.normalize()?;

    let request_id = Uuid::new_v4();
    let span = info_span!("stream", %request_id);
    async move {
        let api_config = OpenAiConfig::from_env()?;
        let pipeline_config = PipelineConfig::from(&api_config);
        let client = OpenAiClient::new(api_config)?;

        let mut events = generate_stream(&client, &normalized.request, &pipeline_config).await?;
        // dropping the receiver on a write error cancels the upstream stream
        while let Some(event) = events.recv().await {
            write_sse_event(std::io::stdout().lock(), &event)?;
        }
        Ok::<(), anyhow::Error>(())
    }
    .instrument(span)
    .await
}
