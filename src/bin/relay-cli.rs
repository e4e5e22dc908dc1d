use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Management CLI for the webhook relay", long_about = None)]
struct Cli {
    #[arg(short, long, env = "RELAY_URL", default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check relay health
    Health,
    /// Register a webhook URL for a connection id
    Subscribe {
        connection_id: String,
        webhook_url: String,
        #[arg(long)]
        recipe_id: Option<String>,
    },
    /// Remove the webhook registered for a connection id
    Unsubscribe {
        connection_id: String,
        #[arg(long)]
        recipe_id: Option<String>,
    },
    /// Deliver a JSON payload through the relay as an inbound webhook would
    Send {
        connection_id: String,
        /// JSON payload
        payload: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
        Commands::Subscribe {
            connection_id,
            webhook_url,
            recipe_id,
        } => {
            client
                .post(format!("{}/webhook/subscribe", base))
                .json(&json!({
                    "workato_webhook_url": webhook_url,
                    "connection_id": connection_id,
                    "recipe_id": recipe_id,
                }))
                .send()
                .await?
        }
        Commands::Unsubscribe {
            connection_id,
            recipe_id,
        } => {
            client
                .post(format!("{}/webhook/unsubscribe", base))
                .json(&json!({
                    "connection_id": connection_id,
                    "recipe_id": recipe_id,
                }))
                .send()
                .await?
        }
        Commands::Send {
            connection_id,
            payload,
        } => {
            // Validate locally so typos don't reach the destination.
            let payload: Value = serde_json::from_str(&payload)?;
            client
                .post(format!("{}/{}", base, connection_id))
                .json(&payload)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: relay returned status {}", status);
        eprintln!("Response: {}", text);
        std::process::exit(1);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
