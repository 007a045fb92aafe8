use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "tracebridge-cli")]
#[command(about = "Management CLI for the tracebridge services", long_about = None)]
struct Cli {
    #[arg(long, default_value = "http://localhost:8002")]
    producer_url: String,

    #[arg(long, default_value = "http://localhost:8003")]
    consumer_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a message through the producer
    Enqueue {
        message: String,
        /// Correlation id carried in the envelope and used as message key
        #[arg(short, long, default_value = "")]
        trace_id: String,
    },
    /// Show consumer processing counters
    Stats,
    /// Check both services
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Enqueue { message, trace_id } => {
            let res = client
                .post(format!("{}/enqueue", cli.producer_url))
                .json(&json!({ "message": message, "trace_id": trace_id }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Stats => {
            let res = client
                .get(format!("{}/stats", cli.consumer_url))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Health => {
            for url in [&cli.producer_url, &cli.consumer_url] {
                match client.get(format!("{}/health", url)).send().await {
                    Ok(res) => print_response(res).await?,
                    Err(e) => eprintln!("Error: {} unreachable: {}", url, e),
                }
            }
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
