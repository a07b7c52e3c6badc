mod display;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use churn_client::PredictClient;
use churn_core::CustomerRecord;
use churn_model::ArtifactStore;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "churn", version, about = "Customer churn prediction service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load artifacts and serve `POST /predict`.
    Serve {
        #[command(flatten)]
        artifacts: ArtifactArgs,
        /// Address to listen on.
        #[arg(long, env = "CHURN_BIND", default_value = "0.0.0.0:8000")]
        bind: SocketAddr,
    },
    /// Predict one record (JSON file) with the local artifacts.
    Predict {
        #[command(flatten)]
        artifacts: ArtifactArgs,
        #[arg(long, short)]
        input: PathBuf,
    },
    /// Show a record's raw and transformed feature values.
    Features {
        #[command(flatten)]
        artifacts: ArtifactArgs,
        #[arg(long, short)]
        input: PathBuf,
    },
    /// Load and validate the artifacts without serving.
    Check {
        #[command(flatten)]
        artifacts: ArtifactArgs,
    },
    /// Send a record to a running service.
    Request {
        /// Base URL of the service.
        #[arg(long, env = "CHURN_URL", default_value = "http://localhost:8000")]
        url: String,
        #[arg(long, short)]
        input: PathBuf,
    },
}

#[derive(Args)]
struct ArtifactArgs {
    /// Directory holding the encoder, scaler, and classifier artifacts.
    #[arg(long, env = "CHURN_ARTIFACTS", default_value = "artifacts")]
    artifacts: PathBuf,
}

impl ArtifactArgs {
    fn load(&self) -> anyhow::Result<ArtifactStore> {
        ArtifactStore::load(&self.artifacts)
            .with_context(|| format!("loading artifacts from {}", self.artifacts.display()))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    tracing::info!("churn v{}", env!("CARGO_PKG_VERSION"));

    match Cli::parse().command {
        Command::Serve { artifacts, bind } => {
            let service = artifacts.load()?.into_service();
            let listener = tokio::net::TcpListener::bind(bind)
                .await
                .with_context(|| format!("binding {bind}"))?;
            churn_server::serve(listener, service).await?;
        }
        Command::Predict { artifacts, input } => {
            let service = artifacts.load()?.into_service();
            let record = read_record(&input)?;
            let prediction = service.predict(&record).context("predicting")?;
            let raw = record.to_training_row().to_record_batch()?;
            print!("{}", display::render_prediction_card(&raw, &prediction)?);
        }
        Command::Features { artifacts, input } => {
            let service = artifacts.load()?.into_service();
            let record = read_record(&input)?;
            let row = record.to_training_row();
            let features = service
                .pipeline()
                .transform_row(&row)
                .context("transforming record")?;
            println!(
                "{}",
                display::render_feature_table(&row.to_record_batch()?, &features.to_record_batch()?)?
            );
        }
        Command::Check { artifacts } => {
            let store = artifacts.load()?;
            print!(
                "{}",
                display::render_artifact_summary(&artifacts.artifacts, &store.summary())
            );
        }
        Command::Request { url, input } => {
            let record = read_record(&input)?;
            let prediction = PredictClient::new(url).predict(&record).await?;
            println!("{}", serde_json::to_string_pretty(&prediction)?);
        }
    }

    Ok(())
}

fn read_record(path: &Path) -> anyhow::Result<CustomerRecord> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing record in {}", path.display()))
}
