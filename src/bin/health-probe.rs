//! Container health probe: exits 0 when the service answers healthy.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "health-probe")]
#[command(about = "Query the turbo-health endpoint and exit with its verdict", long_about = None)]
struct Cli {
    /// Base URL of the service
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Request the full dependency report
    #[arg(short, long)]
    full: bool,

    /// Request timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match probe(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn probe(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .build()?;

    let mut url = format!("{}/health-check", cli.url.trim_end_matches('/'));
    if cli.full {
        url.push_str("?full=1");
    }

    let res = client.get(&url).send().await?;
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: health endpoint returned status {}", status);
        return Ok(false);
    }

    if cli.full {
        let json: Value = res.json().await?;
        println!("{}", serde_json::to_string_pretty(&json)?);
        Ok(json.get("status").and_then(Value::as_str) == Some("healthy"))
    } else {
        let body = res.text().await?;
        println!("{}", body.trim());
        Ok(body.trim() == "OK")
    }
}
