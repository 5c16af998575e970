use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "lw-cli", about = "Lanewatch vehicle tracking CLI")]
struct Cli {
    /// Server URL
    #[arg(long, default_value = "http://localhost:8080", env = "LW_SERVER_URL")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show table counts and recent logs
    Status,
    /// List vehicles with their latest position
    Vehicles,
    /// Show current positions and lane activity
    Live,
    /// Show vehicles per lane
    Lanes,
    /// Record a checkpoint pass
    Record {
        /// Vehicle RFID
        rfid: String,
        /// Checkpoint id, e.g. L1_CP3
        cpid: String,
    },
    /// Move a vehicle to its next checkpoint
    Simulate {
        /// Vehicle RFID
        rfid: String,
    },
    /// Search logs by vehicle attributes
    Search {
        #[arg(long)]
        unit: Option<String>,
        #[arg(long)]
        formation: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        purpose: Option<String>,
    },
}

async fn get_json(client: &reqwest::Client, url: String) -> Result<Value> {
    let resp = client.get(url).send().await?;
    read_json(resp).await
}

async fn post_json<T: Serialize>(client: &reqwest::Client, url: String, body: &T) -> Result<Value> {
    let resp = client.post(url).json(body).send().await?;
    read_json(resp).await
}

async fn read_json(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    let body: Value = resp.json().await?;
    if !status.is_success() {
        bail!(
            "{}: {}",
            status,
            body["error"].as_str().unwrap_or("request failed")
        );
    }
    Ok(body)
}

fn print_logs(logs: &[Value]) {
    println!("{:<10} {:<10} {:<6} {:<4} {}", "RFID", "CPID", "Lane", "Cat", "Timestamp");
    println!("{}", "-".repeat(64));
    for log in logs {
        println!(
            "{:<10} {:<10} {:<6} {:<4} {}",
            log["rfid"].as_str().unwrap_or(""),
            log["cpid"].as_str().unwrap_or(""),
            log["lane"].as_str().unwrap_or(""),
            log["category"].as_str().unwrap_or(""),
            log["timestamp"].as_str().unwrap_or(""),
        );
    }
}

fn as_list(value: &Value) -> &[Value] {
    value.as_array().map(Vec::as_slice).unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base_url = cli.server.trim_end_matches('/');
    let api = format!("{}/api/v1", base_url);

    match cli.command {
        Commands::Status => {
            let resp = get_json(&client, format!("{}/stats", api)).await?;
            let stats = &resp["stats"];
            println!("Server Status:");
            println!("  Vehicles:    {}", stats["vehicle_count"]);
            println!("  Logs:        {}", stats["log_count"]);
            println!("  Checkpoints: {}", stats["checkpoint_count"]);
            println!("\nRecent logs:");
            print_logs(as_list(&stats["recent_logs"]));
        }

        Commands::Vehicles => {
            let resp = get_json(&client, format!("{}/vehicles", api)).await?;
            let vehicles = as_list(&resp["vehicles"]);

            println!("{:<10} {:<10} {:<4} {:<10} {:<10} {}", "RFID", "BA No", "Cat", "Unit", "Position", "Last Seen");
            println!("{}", "-".repeat(80));
            for v in vehicles {
                println!(
                    "{:<10} {:<10} {:<4} {:<10} {:<10} {}",
                    v["rfid"].as_str().unwrap_or(""),
                    v["ba_no"].as_str().unwrap_or(""),
                    v["category"].as_str().unwrap_or(""),
                    v["unit"].as_str().unwrap_or(""),
                    v["cpid"].as_str().unwrap_or("-"),
                    v["timestamp"].as_str().unwrap_or("never"),
                );
            }
            println!("\n{} vehicles total", vehicles.len());
        }

        Commands::Live => {
            let resp = get_json(&client, format!("{}/live", api)).await?;
            println!("Lane activity:");
            for lane in as_list(&resp["lane_status"]) {
                println!(
                    "  {:<4} {} active, last at {}",
                    lane["lane"].as_str().unwrap_or(""),
                    lane["active_vehicles"],
                    lane["last_activity"].as_str().unwrap_or("-"),
                );
            }
            println!("\nCurrent positions:");
            print_logs(as_list(&resp["current_positions"]));
        }

        Commands::Lanes => {
            let resp = get_json(&client, format!("{}/lanes/overview", api)).await?;
            for lane in as_list(&resp["lanes"]) {
                println!("{}:", lane["name"].as_str().unwrap_or(""));
                for v in as_list(&lane["vehicles"]) {
                    println!(
                        "  {:<10} CP{:<3} {}",
                        v["id"].as_str().unwrap_or(""),
                        v["checkpoint"],
                        v["category"].as_str().unwrap_or(""),
                    );
                }
            }
        }

        Commands::Record { rfid, cpid } => {
            #[derive(Serialize)]
            struct Req { rfid: String, cpid: String }

            let resp = post_json(&client, format!("{}/vehicles", api), &Req { rfid, cpid }).await?;
            println!("{}", resp["message"].as_str().unwrap_or(""));
        }

        Commands::Simulate { rfid } => {
            #[derive(Serialize)]
            struct Req { rfid: String }

            let resp = post_json(&client, format!("{}/simulate", api), &Req { rfid }).await?;
            println!("{}", resp["message"].as_str().unwrap_or(""));
            if let Some(ts) = resp["timestamp"].as_str() {
                println!("  Arrives: {} ({} min delay)", ts, resp["delay_minutes"]);
            }
        }

        Commands::Search { unit, formation, category, purpose } => {
            #[derive(Serialize)]
            struct Req {
                unit: Option<String>,
                formation: Option<String>,
                category: Option<String>,
                purpose: Option<String>,
            }

            let resp = post_json(
                &client,
                format!("{}/logs/search", api),
                &Req { unit, formation, category, purpose },
            )
            .await?;
            print_logs(as_list(&resp["logs"]));
        }
    }

    Ok(())
}
