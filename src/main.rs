use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cloud_convert_client::config::AppConfig;
use cloud_convert_client::models::task::{OutputFormat, TaskStatus};
use cloud_convert_client::services::client::HttpConvertClient;
use cloud_convert_client::services::poller::StatusPoller;

/// Submit an image to the 2D-to-3D conversion service and follow it through
/// to completion.
#[derive(Debug, Parser)]
#[command(name = "convert-cli", version)]
struct Args {
    /// Image to convert (png, jpg, jpeg or webp)
    input: PathBuf,

    /// Output model format: glb, obj, stl or ply
    #[arg(short, long, default_value = "glb")]
    format: String,

    /// Where to write the finished model (defaults to <task-id>.<format>)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let args = Args::parse();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    // Register application metrics
    metrics::describe_counter!(
        "conversion_tasks_submitted_total",
        "Total conversion tasks submitted"
    );
    metrics::describe_counter!(
        "conversion_poll_ticks_total",
        "Completed status refresh ticks"
    );
    metrics::describe_counter!(
        "conversion_task_refresh_failures_total",
        "Status refreshes that failed transiently"
    );

    let format: OutputFormat = args
        .format
        .to_lowercase()
        .parse()
        .expect("Output format must be one of: glb, obj, stl, ply");

    tracing::info!(base_url = %config.api_base_url, "Initializing conversion service client");
    let client = HttpConvertClient::new(
        &config.api_base_url,
        Duration::from_secs(config.request_timeout_secs),
    )
    .expect("Failed to initialize conversion service client");

    match client.health().await {
        Ok(health) => tracing::info!(
            status = %health.status,
            active_tasks = health.active_tasks,
            queued_tasks = health.queued_tasks,
            "Conversion service reachable"
        ),
        Err(error) => tracing::warn!(
            error = %error,
            "Conversion service health check failed, continuing anyway"
        ),
    }

    let bytes = std::fs::read(&args.input).expect("Failed to read input file");
    let filename = args
        .input
        .file_name()
        .and_then(|name| name.to_str())
        .expect("Input path has no usable file name")
        .to_string();

    let poller = StatusPoller::new(client, config.max_upload_bytes);

    let task_id = match poller.submit(&filename, bytes, format).await {
        Ok(id) => id,
        Err(error) => {
            tracing::error!(error = %error, "Submission failed");
            std::process::exit(1);
        }
    };

    let mut snapshots = poller.subscribe();
    poller.start_polling(Duration::from_millis(config.poll_interval_ms));

    // Follow per-tick snapshots until the task reaches a terminal status.
    let final_status = loop {
        snapshots
            .changed()
            .await
            .expect("Poller dropped while watching");

        let current = snapshots
            .borrow()
            .iter()
            .find(|task| task.id == task_id)
            .cloned();

        if let Some(task) = current {
            tracing::info!(
                task_id = %task.id,
                status = %task.status,
                progress = task.progress,
                message = %task.message,
                "Task update"
            );
            if task.status.is_terminal() {
                break task.status;
            }
        }
    };

    poller.stop_polling();

    match final_status {
        TaskStatus::Completed => {
            let model = poller
                .download(task_id)
                .await
                .expect("Failed to download converted model");
            let output = args
                .output
                .unwrap_or_else(|| PathBuf::from(format!("{}.{}", task_id, format)));
            std::fs::write(&output, &model).expect("Failed to write model file");
            tracing::info!(
                path = %output.display(),
                bytes = model.len(),
                "Model downloaded"
            );
        }
        TaskStatus::Failed => {
            tracing::error!(task_id = %task_id, "Conversion failed");
            std::process::exit(1);
        }
        TaskStatus::Pending | TaskStatus::Processing => {
            unreachable!("loop exits only on a terminal status")
        }
    }
}
