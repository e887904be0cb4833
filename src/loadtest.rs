use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use serde::Deserialize;
use tokio::sync::{Semaphore, mpsc};

/// Sample queries cycled through by the workload generator.
pub const SAMPLE_QUERIES: &[&str] = &[
    "python web scraping",
    "machine learning tutorial",
    "best programming languages 2024",
    "how to learn coding",
    "javascript frameworks",
    "data science projects",
    "cloud computing basics",
    "cybersecurity tips",
    "artificial intelligence news",
    "software engineering jobs",
    "react vs vue",
    "docker tutorial",
    "kubernetes basics",
    "git commands",
    "linux terminal commands",
    "sql database design",
    "mongodb tutorial",
    "api design best practices",
    "microservices architecture",
    "devops tools",
    "python fastapi",
    "web development trends",
    "mobile app development",
    "blockchain explained",
    "quantum computing basics",
    "rust programming language",
    "golang tutorial",
    "typescript vs javascript",
    "css flexbox guide",
    "html5 features",
    "node.js best practices",
    "django vs flask",
    "aws services overview",
    "azure cloud platform",
    "google cloud tutorial",
    "redis caching",
    "elasticsearch basics",
    "graphql vs rest",
    "websocket tutorial",
    "oauth2 explained",
    "jwt authentication",
    "unit testing python",
    "integration testing",
    "ci cd pipeline",
    "agile methodology",
    "scrum framework",
    "product management",
    "ux design principles",
    "figma tutorial",
    "tech startup ideas",
];

/// Per-request timeout for harness calls. Longer than the scrapper's own
/// timeout so a slow backend shows up as a slow success, not a harness
/// timeout.
const HARNESS_TIMEOUT_SECS: u64 = 30;

/// How many failed outcomes are kept verbatim for the final report.
const SAMPLE_FAILURE_LIMIT: usize = 5;

/// Telemetry for one call against the endpoint. Timing covers send to
/// body-received, measured here rather than by the server.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub query: String,
    pub status: String,
    pub result_count: usize,
    pub response_time_ms: f64,
    pub error_message: Option<String>,
}

/// The fields the harness reads from the endpoint's response body. Anything
/// else in the body is ignored, and an unknown status string lands in the
/// other-errors bucket.
#[derive(Debug, Deserialize)]
struct EndpointResponse {
    status: String,
    #[serde(default)]
    results: Vec<serde_json::Value>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Running totals over every completed call. Updated by a single consumer;
/// the rate and latency views are computed when read.
#[derive(Debug, Default)]
pub struct Statistics {
    pub total_queries: usize,
    pub successful: usize,
    pub failed: usize,
    pub blocked: usize,
    pub parse_errors: usize,
    pub request_errors: usize,
    pub other_errors: usize,
    pub total_results: usize,
    pub response_times: Vec<f64>,
    pub sample_failures: Vec<QueryOutcome>,
}

impl Statistics {
    /// Fold one completed call into the totals. Every outcome lands in
    /// exactly one status bucket.
    pub fn record(&mut self, outcome: QueryOutcome) {
        self.total_queries += 1;
        self.response_times.push(outcome.response_time_ms);

        match outcome.status.as_str() {
            "success" => {
                self.successful += 1;
                self.total_results += outcome.result_count;
                return;
            }
            "blocked" => self.blocked += 1,
            "parse_error" => self.parse_errors += 1,
            "request_error" => self.request_errors += 1,
            _ => self.other_errors += 1,
        }
        self.failed += 1;
        if self.sample_failures.len() < SAMPLE_FAILURE_LIMIT {
            self.sample_failures.push(outcome);
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_queries == 0 {
            return 0.0;
        }
        self.successful as f64 / self.total_queries as f64 * 100.0
    }

    pub fn avg_response_time(&self) -> f64 {
        if self.response_times.is_empty() {
            return 0.0;
        }
        self.response_times.iter().sum::<f64>() / self.response_times.len() as f64
    }

    pub fn min_response_time(&self) -> f64 {
        self.response_times.iter().copied().reduce(f64::min).unwrap_or(0.0)
    }

    pub fn max_response_time(&self) -> f64 {
        self.response_times.iter().copied().reduce(f64::max).unwrap_or(0.0)
    }

    pub fn avg_results_per_query(&self) -> f64 {
        if self.successful == 0 {
            return 0.0;
        }
        self.total_results as f64 / self.successful as f64
    }
}

/// Build the workload: cycle through the sample pool, suffixing a cycle
/// counter once the pool repeats so no two queries are identical and a
/// caching layer can't answer for the backend. Pure function of `n`.
pub fn generate_queries(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let base = SAMPLE_QUERIES[i % SAMPLE_QUERIES.len()];
            if i >= SAMPLE_QUERIES.len() {
                format!("{} {}", base, i / SAMPLE_QUERIES.len())
            } else {
                base.to_string()
            }
        })
        .collect()
}

/// Verify the endpoint answers on /health before starting a run.
pub async fn check_health(api_url: &str) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    let response = client
        .get(format!("{api_url}/health"))
        .send()
        .await
        .map_err(|_| anyhow::anyhow!("cannot connect to {api_url}"))?;
    if !response.status().is_success() {
        bail!("server at {api_url} is not healthy");
    }
    Ok(())
}

/// Send one query and classify whatever comes back. Total: every failure
/// mode becomes a status string, never an error.
async fn send_query(client: &reqwest::Client, api_url: &str, query: String) -> QueryOutcome {
    let start = Instant::now();

    let response = match client
        .post(format!("{api_url}/search"))
        .json(&serde_json::json!({ "query": query }))
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            let (status, error_message) = if e.is_timeout() {
                ("timeout", "Request timed out".to_string())
            } else if e.is_connect() {
                ("connection_error", "Connection failed - is the server running?".to_string())
            } else {
                ("error", e.to_string())
            };
            return QueryOutcome {
                query,
                status: status.to_string(),
                result_count: 0,
                response_time_ms: elapsed_ms(start),
                error_message: Some(error_message),
            };
        }
    };

    if response.status() != reqwest::StatusCode::OK {
        return QueryOutcome {
            query,
            status: "http_error".to_string(),
            result_count: 0,
            response_time_ms: elapsed_ms(start),
            error_message: Some(format!("HTTP {}", response.status().as_u16())),
        };
    }

    match response.json::<EndpointResponse>().await {
        Ok(body) => QueryOutcome {
            query,
            status: body.status,
            result_count: body.results.len(),
            response_time_ms: elapsed_ms(start),
            error_message: body.error_message,
        },
        Err(e) => QueryOutcome {
            query,
            status: "error".to_string(),
            result_count: 0,
            response_time_ms: elapsed_ms(start),
            error_message: Some(e.to_string()),
        },
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Drive `num_queries` requests against a running endpoint with at most
/// `concurrency` in flight, and aggregate every outcome into `Statistics`.
///
/// Workers never touch the accumulator: each sends its outcome over a
/// channel and the single receiver folds them in, so totals stay exact no
/// matter how completions interleave.
pub async fn run_load_test(
    api_url: &str,
    num_queries: usize,
    concurrency: usize,
) -> Result<Statistics> {
    let queries = generate_queries(num_queries);

    println!("Starting load test...");
    println!("  API URL: {api_url}");
    println!("  Queries: {num_queries}");
    println!("  Concurrency: {concurrency}");
    println!();

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(HARNESS_TIMEOUT_SECS))
        .build()?;

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let (tx, mut rx) = mpsc::unbounded_channel::<QueryOutcome>();

    let started = Instant::now();

    {
        let client = client.clone();
        let api_url = api_url.to_string();
        tokio::spawn(async move {
            for query in queries {
                let Ok(permit) = semaphore.clone().acquire_owned().await else {
                    break;
                };
                let client = client.clone();
                let api_url = api_url.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let outcome = send_query(&client, &api_url, query).await;
                    drop(permit);
                    let _ = tx.send(outcome);
                });
            }
            // Dispatcher's own sender drops here; the channel closes once
            // the last worker is done.
        });
    }

    let mut stats = Statistics::default();
    let mut completed = 0usize;
    while let Some(outcome) = rx.recv().await {
        stats.record(outcome);
        completed += 1;
        if completed % 100 == 0 || completed == num_queries {
            println!(
                "  Progress: {completed}/{num_queries} ({}%)",
                completed * 100 / num_queries
            );
        }
    }

    // A worker that panicked never reported; keep the totals exact.
    while stats.total_queries < num_queries {
        stats.record(QueryOutcome {
            query: String::new(),
            status: "error".to_string(),
            result_count: 0,
            response_time_ms: 0.0,
            error_message: Some("worker task failed".to_string()),
        });
    }

    let total_time = started.elapsed().as_secs_f64();
    print_report(&stats, total_time);

    Ok(stats)
}

fn print_report(stats: &Statistics, total_time: f64) {
    println!();
    println!("{}", "=".repeat(60));
    println!("LOAD TEST RESULTS");
    println!("{}", "=".repeat(60));
    println!();
    println!("Total queries:        {}", stats.total_queries);
    println!("Total time:           {total_time:.2}s");
    if total_time > 0.0 {
        println!(
            "Queries per second:   {:.2}",
            stats.total_queries as f64 / total_time
        );
    }
    println!();
    println!("STATUS BREAKDOWN:");
    println!(
        "  Successful:         {} ({:.1}%)",
        stats.successful,
        stats.success_rate()
    );
    println!(
        "  Failed:             {} ({:.1}%)",
        stats.failed,
        100.0 - stats.success_rate()
    );
    println!("    - Blocked:        {}", stats.blocked);
    println!("    - Parse errors:   {}", stats.parse_errors);
    println!("    - Request errors: {}", stats.request_errors);
    println!("    - Other errors:   {}", stats.other_errors);
    println!();
    println!("RESPONSE TIMES:");
    println!("  Average:            {:.2}ms", stats.avg_response_time());
    println!("  Min:                {:.2}ms", stats.min_response_time());
    println!("  Max:                {:.2}ms", stats.max_response_time());
    println!();
    println!("RESULTS:");
    println!("  Total results:      {}", stats.total_results);
    println!("  Avg per query:      {:.1}", stats.avg_results_per_query());
    println!();
    if !stats.sample_failures.is_empty() {
        println!("SAMPLE FAILURES (up to {SAMPLE_FAILURE_LIMIT}):");
        for failure in &stats.sample_failures {
            let query: String = failure.query.chars().take(30).collect();
            println!(
                "  [{}] \"{query}...\" - {}",
                failure.status,
                failure.error_message.as_deref().unwrap_or("")
            );
        }
        println!();
    }
}
