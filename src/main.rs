use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;

use vigil_rs::vigil::evaluate::{self, CASES};
use vigil_rs::vigil::{server, simulator, Pipeline, VigilConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a YAML config file (defaults to $VIGIL_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run one assessment and print the report
    Run {
        /// Raw image payload file
        #[arg(long)]
        image: Option<PathBuf>,

        /// Raw audio payload file
        #[arg(long)]
        audio: Option<PathBuf>,

        /// Use simulated sensor data for payloads not given
        #[arg(long)]
        simulate: bool,
    },
    /// Run the reference evaluation suite
    Evaluate,
    /// Validate the pipeline graph and print its topology
    Graph,
}

fn read_payload(path: Option<PathBuf>) -> anyhow::Result<Option<Vec<u8>>> {
    path.map(|p| std::fs::read(&p).with_context(|| format!("Failed to read {}", p.display())))
        .transpose()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let mut config = VigilConfig::load(args.config.as_deref())?;

    match args.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let pipeline = Pipeline::new(&config.perception())?;
            server::serve(config.socket_addr()?, pipeline).await?;
        }
        Commands::Run {
            image,
            audio,
            simulate,
        } => {
            let mut image = read_payload(image)?;
            let mut audio = read_payload(audio)?;
            if simulate {
                image.get_or_insert_with(simulator::default_video_frame);
                audio.get_or_insert_with(simulator::default_audio_chunk);
            }

            let pipeline = Pipeline::new(&config.perception())?;
            let report = pipeline.assess(image, audio).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.success {
                anyhow::bail!(
                    "Assessment failed at node '{}'",
                    report.failed_node.unwrap_or_default()
                );
            }
        }
        Commands::Evaluate => {
            println!("Starting Evaluation Suite...");
            let summary = evaluate::run_evaluation(CASES).await?;
            for result in &summary.results {
                println!(
                    "Case {}: {} (expected {}) {} in {:.3}s",
                    result.id,
                    result.threat_level,
                    result.expected,
                    if result.passed { "PASS" } else { "FAIL" },
                    result.duration_seconds
                );
            }
            println!("\n--- Evaluation Summary ---");
            println!("Passed: {}/{}", summary.passed, summary.results.len());
            println!("Average Latency: {:.3}s", summary.average_latency_seconds);
            if !summary.all_passed() {
                anyhow::bail!("{} evaluation case(s) failed", summary.failed);
            }
        }
        Commands::Graph => {
            let pipeline = Pipeline::new(&config.perception())?;
            let graph = pipeline.graph();
            println!("Entry point: {}", graph.entry_point());
            println!("{}", serde_yaml::to_string(&graph.describe())?);
        }
    }

    Ok(())
}
