use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "relief-cli")]
#[command(about = "Command-line client for the Relief API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5000/api", env = "RELIEF_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show service health
    Health,
    /// List charities, optionally filtered
    Charities {
        /// Case-insensitive category substring
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        featured: Option<bool>,
        #[arg(long)]
        verified: Option<bool>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        accepts_zakat: Option<bool>,
        #[arg(long)]
        emergency_response: Option<bool>,
        /// Case-insensitive location substring
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        min_rating: Option<f32>,
    },
    /// View an analytics snapshot
    Analytics {
        /// donations, visitors, performance, security or summary
        #[arg(long = "type", default_value = "summary")]
        kind: String,
    },
    /// Record an analytics event
    Track {
        /// Event name, e.g. donation_click or page_view
        event: String,
        /// Event payload as a JSON object
        #[arg(long)]
        data: Option<String>,
    },
    /// Submit a charity for review
    Submit {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        donation_url: String,
        #[arg(long)]
        category: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
        Commands::Charities {
            category,
            featured,
            verified,
            limit,
            accepts_zakat,
            emergency_response,
            location,
            min_rating,
        } => {
            let mut query: Vec<(&str, String)> = Vec::new();
            let mut push = |key, value: Option<String>| {
                if let Some(value) = value {
                    query.push((key, value));
                }
            };
            push("category", category);
            push("featured", featured.map(|v| v.to_string()));
            push("verified", verified.map(|v| v.to_string()));
            push("limit", limit.map(|v| v.to_string()));
            push("acceptsZakat", accepts_zakat.map(|v| v.to_string()));
            push("emergencyResponse", emergency_response.map(|v| v.to_string()));
            push("location", location);
            push("minRating", min_rating.map(|v| v.to_string()));

            client
                .get(format!("{}/charities", base))
                .query(&query)
                .send()
                .await?
        }
        Commands::Analytics { kind } => {
            client
                .get(format!("{}/analytics", base))
                .query(&[("type", kind)])
                .send()
                .await?
        }
        Commands::Track { event, data } => {
            let data: Option<Value> = data.as_deref().map(serde_json::from_str).transpose()?;
            client
                .post(format!("{}/analytics", base))
                .json(&json!({ "event": event, "data": data }))
                .send()
                .await?
        }
        Commands::Submit {
            name,
            description,
            donation_url,
            category,
        } => {
            client
                .post(format!("{}/charities", base))
                .json(&json!({
                    "name": name,
                    "description": description,
                    "donationUrl": donation_url,
                    "category": category,
                }))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", rendered);
    } else {
        eprintln!("Error: API returned status {}", status);
        eprintln!("{}", rendered);
        std::process::exit(1);
    }
    Ok(())
}
