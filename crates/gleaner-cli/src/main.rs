use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use url::Url;

#[derive(Parser)]
#[command(name = "gleaner")]
#[command(about = "A CLI for submitting and inspecting shared content")]
struct Cli {
    /// Base URL for the Gleaner service
    #[arg(long, env = "GLEANER_SERVICE_URL", default_value = "http://localhost:3000")]
    service_url: Url,

    #[command(flatten)]
    credentials: Credentials,

    /// Bearer token for admin endpoints
    #[arg(long, env = "GLEANER_ADMIN_TOKEN", hide_env_values = true)]
    admin_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Credentials {
    /// Webhook username issued when the inbound address was provisioned
    #[arg(long, env = "GLEANER_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "GLEANER_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a URL for ingestion
    Submit {
        url: String,
    },
    /// Re-run extraction for one record
    Process {
        id: i32,
    },
    /// Process your pending records in one batch
    ProcessPending {
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// List your records, newest first
    List {
        #[arg(short, long)]
        limit: Option<u32>,
        #[arg(short, long)]
        offset: Option<u32>,
        /// Only processed (true) or only pending (false) records
        #[arg(long)]
        processed: Option<bool>,
    },
    /// Show one record
    Show {
        id: i32,
    },
    /// Generate a summary for a record
    Summarize {
        id: i32,
        /// Text to summarize
        #[arg(short, long)]
        content: String,
    },
    /// Provision an inbound address and webhook credentials for a user
    Provision {
        user_id: String,
        /// Rotate the credentials of an existing address instead
        #[arg(long)]
        rotate: bool,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryRequest<'a> {
    post_id: i32,
    content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProvisionRequest<'a> {
    user_id: &'a str,
}

struct ServiceClient {
    http: Client,
    base: Url,
    credentials: Credentials,
    admin_token: Option<String>,
}

impl ServiceClient {
    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("invalid endpoint path {path}"))
    }

    fn user_request(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let (Some(username), Some(password)) =
            (&self.credentials.username, &self.credentials.password)
        else {
            bail!("--username and --password (or GLEANER_USERNAME/GLEANER_PASSWORD) are required");
        };
        Ok(request.basic_auth(username, Some(password)))
    }

    fn admin_request(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self
            .admin_token
            .as_deref()
            .context("--admin-token (or GLEANER_ADMIN_TOKEN) is required")?;
        Ok(request.bearer_auth(token))
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let request = self.http.get(self.endpoint(path)?).query(query);
        send(self.user_request(request)?).await
    }

    async fn post(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let request = self.http.post(self.endpoint(path)?).query(query);
        send(self.user_request(request)?).await
    }
}

async fn send(request: RequestBuilder) -> Result<Value> {
    let response = request.send().await.context("failed to reach service")?;
    read_json(response).await
}

async fn read_json(response: Response) -> Result<Value> {
    let status = response.status();
    let text = response.text().await?;
    let body: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));

    if status.is_success() {
        return Ok(body);
    }

    // 422 still carries the record that failed
    if status.as_u16() == 422 {
        print_json(&body)?;
    }
    let message = body
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string());
    bail!("request failed ({status}): {message}");
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = ServiceClient {
        http: Client::new(),
        base: cli.service_url,
        credentials: cli.credentials,
        admin_token: cli.admin_token,
    };

    match cli.command {
        Commands::Submit { url } => {
            let record = client.post("/api/v1/ingest", &[("url", url)]).await?;
            println!(
                "Submitted as record {}",
                record["ingestId"].as_i64().unwrap_or_default()
            );
            print_json(&record["record"])?;
        }
        Commands::Process { id } => {
            let result = client
                .post(&format!("/api/v1/records/{id}/process"), &[])
                .await?;
            print_json(&result["record"])?;
        }
        Commands::ProcessPending { limit } => {
            let query: Vec<_> = limit.map(|l| ("limit", l.to_string())).into_iter().collect();
            let result = client
                .post("/api/v1/records/process-pending", &query)
                .await?;
            print_batch(&result["results"]);
        }
        Commands::List {
            limit,
            offset,
            processed,
        } => {
            let mut query = Vec::new();
            if let Some(limit) = limit {
                query.push(("limit", limit.to_string()));
            }
            if let Some(offset) = offset {
                query.push(("offset", offset.to_string()));
            }
            if let Some(processed) = processed {
                query.push(("processed", processed.to_string()));
            }
            let page = client.get("/api/v1/records", &query).await?;
            print_listing(&page);
        }
        Commands::Show { id } => {
            let record = client.get(&format!("/api/v1/records/{id}"), &[]).await?;
            print_json(&record)?;
        }
        Commands::Summarize { id, content } => {
            let request = client
                .http
                .post(client.endpoint("/api/v1/summaries")?)
                .json(&SummaryRequest {
                    post_id: id,
                    content: &content,
                });
            let result = send(client.user_request(request)?).await?;
            println!("{}", result["summary"].as_str().unwrap_or_default());
        }
        Commands::Provision { user_id, rotate } => {
            let request = if rotate {
                client.http.post(
                    client.endpoint(&format!("/api/v1/admin/addresses/{user_id}/credentials"))?,
                )
            } else {
                client
                    .http
                    .post(client.endpoint("/api/v1/admin/addresses")?)
                    .json(&ProvisionRequest { user_id: &user_id })
            };
            let created = send(client.admin_request(request)?).await?;
            println!("Inbound address: {}", created["emailAddress"].as_str().unwrap_or_default());
            println!("Username:        {}", created["username"].as_str().unwrap_or_default());
            println!("Password:        {}", created["password"].as_str().unwrap_or_default());
            println!("Store the password now; it cannot be shown again.");
        }
    }

    Ok(())
}

fn print_listing(page: &Value) {
    let items = page["items"].as_array().map(Vec::as_slice).unwrap_or_default();
    for item in items {
        let state = match (item["processed"].as_bool(), item["errorMessage"].is_null()) {
            (Some(true), true) => "done",
            (Some(true), false) => "failed",
            _ => "pending",
        };
        println!(
            "{:>6}  {:<7}  {:<8}  {}",
            item["id"],
            state,
            item["sourcePlatform"].as_str().unwrap_or("-"),
            item["title"]
                .as_str()
                .or_else(|| item["originalUrl"].as_str())
                .unwrap_or("(no url yet)"),
        );
    }
    println!(
        "{} of {} records (offset {})",
        items.len(),
        page["total"],
        page["offset"]
    );
}

fn print_batch(results: &Value) {
    let results = results.as_array().map(Vec::as_slice).unwrap_or_default();
    for outcome in results {
        let status = if outcome["success"].as_bool() == Some(true) {
            "ok"
        } else {
            "failed"
        };
        println!(
            "{:>6}  {:<6}  {}{}",
            outcome["id"],
            status,
            outcome["url"].as_str().unwrap_or("-"),
            outcome["error"]
                .as_str()
                .map(|e| format!("  ({e})"))
                .unwrap_or_default(),
        );
    }
    if results.is_empty() {
        println!("No pending records");
    }
}
