use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Management CLI for the channel relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Admin bearer token (`admin.api_key` in the relay config)
    #[arg(short, long, env = "RELAY_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check relay system status
    Status,
    /// List all channels and their status
    Channels,
    /// Show one channel
    Channel { id: i64 },
    /// Enable a channel
    Enable { id: i64 },
    /// Disable a channel by hand
    Disable { id: i64 },
    /// Report an upstream outcome for a channel
    Report {
        id: i64,
        /// Report a successful request instead of a failure
        #[arg(long, conflicts_with_all = ["status", "code", "error_type", "message", "local", "body"])]
        success: bool,
        #[arg(long, default_value_t = 500)]
        status: u16,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        error_type: Option<String>,
        #[arg(long)]
        message: Option<String>,
        /// The failure was produced locally, not by the upstream
        #[arg(long)]
        local: bool,
        /// Raw upstream response body; the relay parses the vendor error from it
        #[arg(long, conflicts_with_all = ["code", "error_type", "message", "local"])]
        body: Option<String>,
    },
    /// List payment gateways
    Gateways,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", base)),
        Commands::Channels => client.get(format!("{}/admin/channels", base)),
        Commands::Channel { id } => client.get(format!("{}/admin/channels/{}", base, id)),
        Commands::Enable { id } => client
            .post(format!("{}/admin/channels/{}/status", base, id))
            .json(&json!({ "status": "enabled" })),
        Commands::Disable { id } => client
            .post(format!("{}/admin/channels/{}/status", base, id))
            .json(&json!({ "status": "manually_disabled" })),
        Commands::Report {
            id,
            success,
            status,
            code,
            error_type,
            message,
            local,
            body: raw,
        } => {
            let body = if success {
                json!({ "outcome": "success" })
            } else if let Some(raw) = raw {
                json!({ "status_code": status, "body": raw })
            } else {
                json!({
                    "outcome": "failure",
                    "status_code": status,
                    "local": local,
                    "code": code,
                    "error_type": error_type,
                    "message": message,
                })
            };
            client
                .post(format!("{}/admin/channels/{}/outcome", base, id))
                .json(&body)
        }
        Commands::Gateways => client.get(format!("{}/admin/payments/gateways", base)),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
