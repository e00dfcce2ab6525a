//! OCR Cloud CLI: 提交识别任务、查询状态、列出与删除任务的命令行工具
//!
//! Usage:
//!   ocr-cloud-cli process <file>... [--export <fmt>] [--language <lang>]   Submit and wait
//!   ocr-cloud-cli status <task-id>                                         Show one task
//!   ocr-cloud-cli list-finished                                            List finished tasks
//!   ocr-cloud-cli delete <task-id>                                         Delete a task

use anyhow::{anyhow, bail, Context};
use ocr_cloud_sdk::{
    ClientConfig, ExportFormat, ImageProcessingParams, OcrClient, OcrClientBuilder, Task,
    WaitOptions, WaitOutcome,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "process" => cmd_process(&args[2..]).await,
        "status" => cmd_status(&args[2..]).await,
        "list-finished" => cmd_list_finished(&args[2..]).await,
        "delete" => cmd_delete(&args[2..]).await,
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"ocr-cloud-cli: OCR 云服务命令行工具

USAGE:
    ocr-cloud-cli <COMMAND> [OPTIONS]

COMMANDS:
    process <file>...           Submit images and wait for the results
        --export <fmt>          Export format (repeatable, or comma separated; default txt)
        --language <lang>       Recognition language(s), e.g. English,German
        --max-wait <secs>       Give up waiting after this many seconds
        --no-wait               Submit only and print the task ids
    status <task-id>            Show the current status of a task
    list-finished               List finished tasks
    delete <task-id>            Delete a task and its results
    version                     Show version information
    help                        Show this help message

GLOBAL OPTIONS:
    --config <path>             YAML client configuration

ENVIRONMENT:
    OCR_SDK_HOST                Service URL (default https://cloud-westus.ocrsdk.com)
    OCR_SDK_APP_ID              Application id
    OCR_SDK_PASSWORD            Application password
    OCR_SDK_TOKEN               Bearer token (instead of id + password)
    OCR_SDK_TIMEOUT_SECS        Request timeout
    RUST_LOG                    Log filter, e.g. ocr_cloud_sdk=info"#
    );
}

fn cmd_version() {
    println!("ocr-cloud-cli {}", env!("CARGO_PKG_VERSION"));
}

/// Value following `flag`, if present.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Every value following each occurrence of `flag`.
fn flag_values<'a>(args: &'a [String], flag: &str) -> Vec<&'a str> {
    args.windows(2)
        .filter(|w| w[0] == flag)
        .map(|w| w[1].as_str())
        .collect()
}

/// Arguments that are neither flags nor flag values.
fn positional(args: &[String]) -> Vec<&str> {
    const VALUED: [&str; 4] = ["--config", "--export", "--language", "--max-wait"];
    let mut out = Vec::new();
    let mut skip = false;
    for arg in args {
        if skip {
            skip = false;
            continue;
        }
        if VALUED.contains(&arg.as_str()) {
            skip = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        out.push(arg.as_str());
    }
    out
}

fn build_client(args: &[String]) -> anyhow::Result<OcrClient> {
    let config = ClientConfig::load(flag_value(args, "--config").map(Path::new))
        .context("loading configuration")?;
    let client = OcrClientBuilder::from_config(&config)?.build()?;
    Ok(client)
}

fn parse_export_formats(args: &[String]) -> anyhow::Result<Vec<ExportFormat>> {
    let mut formats = Vec::new();
    for value in flag_values(args, "--export") {
        for name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let format =
                ExportFormat::parse(name).ok_or_else(|| anyhow!("unknown export format: {name}"))?;
            formats.push(format);
        }
    }
    if formats.is_empty() {
        formats.push(ExportFormat::Txt);
    }
    Ok(formats)
}

/// What `process` produced for one file.
enum Processed {
    /// `--no-wait`: accepted by the service, not waited on.
    Submitted(Task),
    Waited(WaitOutcome),
}

async fn cmd_process(args: &[String]) -> anyhow::Result<()> {
    let files: Vec<PathBuf> = positional(args).into_iter().map(PathBuf::from).collect();
    if files.is_empty() {
        bail!("process needs at least one file");
    }

    let mut params = ImageProcessingParams::default().export_formats(parse_export_formats(args)?);
    if let Some(language) = flag_value(args, "--language") {
        params = params.language(language);
    }

    let client = Arc::new(build_client(args)?);
    let no_wait = args.iter().any(|a| a == "--no-wait");

    let cancel = CancellationToken::new();
    let mut options = WaitOptions::new().with_cancellation(cancel.clone());
    if let Some(secs) = flag_value(args, "--max-wait") {
        let secs: u64 = secs.parse().context("--max-wait expects seconds")?;
        options = options.with_max_wait(Duration::from_secs(secs));
    }

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancelling...");
            ctrl_c.cancel();
        }
    });

    let jobs = files.iter().map(|path| {
        let client = client.clone();
        let params = params.clone();
        let options = options.clone();
        async move {
            let content = tokio::fs::read(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            if no_wait {
                let task = client.process_image(&params, content).await?;
                return Ok::<_, anyhow::Error>((path, Processed::Submitted(task)));
            }
            let outcome = client
                .process_image_and_wait(&params, content, options)
                .await?;
            Ok((path, Processed::Waited(outcome)))
        }
    });

    let mut failures = 0;
    for result in futures::future::join_all(jobs).await {
        match result {
            Ok((path, processed)) => {
                println!("=== {} ({}) ===", path.display(), summary(&processed));
                if let Processed::Waited(outcome) = &processed {
                    print_outcome(outcome);
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("Error: {e:#}");
            }
        }
    }
    if failures > 0 {
        bail!("{failures} of {} file(s) failed", files.len());
    }
    Ok(())
}

fn summary(processed: &Processed) -> String {
    match processed {
        Processed::Submitted(task) => format!("submitted as {}", task.task_id),
        Processed::Waited(WaitOutcome::Completed(task)) => format!("{}", task.status),
        Processed::Waited(WaitOutcome::TimedOut(_)) => "timed out".to_string(),
        Processed::Waited(WaitOutcome::Cancelled(_)) => "cancelled".to_string(),
    }
}

fn print_outcome(outcome: &WaitOutcome) {
    match outcome {
        WaitOutcome::Completed(task) => print_task(task),
        WaitOutcome::TimedOut(task) => {
            print_task(task);
            println!(
                "still running; resume with: ocr-cloud-cli status {}",
                task.task_id
            );
        }
        WaitOutcome::Cancelled(Some(task)) => {
            println!("cancelled; task {} may still complete", task.task_id);
        }
        WaitOutcome::Cancelled(None) => println!("cancelled before submission"),
    }
}

fn print_task(task: &Task) {
    println!("task:    {}", task.task_id);
    println!("status:  {}", task.status);
    if let Some(description) = &task.description {
        println!("desc:    {description}");
    }
    if let Some(error) = &task.error {
        println!("error:   {error}");
    }
    for url in &task.result_urls {
        println!("result:  {url}");
    }
}

fn single_task_id<'a>(args: &'a [String], command: &str) -> anyhow::Result<&'a str> {
    match positional(args).as_slice() {
        [id] => Ok(*id),
        _ => bail!("{command} expects exactly one task id"),
    }
}

async fn cmd_status(args: &[String]) -> anyhow::Result<()> {
    let task_id = single_task_id(args, "status")?;
    let client = build_client(args)?;
    let task = client.get_task_status(task_id).await?;
    print_task(&task);
    Ok(())
}

async fn cmd_list_finished(args: &[String]) -> anyhow::Result<()> {
    let client = build_client(args)?;
    let tasks = client.list_finished_tasks().await?;
    if tasks.is_empty() {
        println!("No finished tasks.");
        return Ok(());
    }
    println!("{:<38} {:<18} {}", "TASK", "STATUS", "RESULTS");
    for task in &tasks {
        println!(
            "{:<38} {:<18} {}",
            task.task_id,
            task.status.as_str(),
            task.result_urls.len()
        );
    }
    println!("\n{} task(s)", tasks.len());
    Ok(())
}

async fn cmd_delete(args: &[String]) -> anyhow::Result<()> {
    let task_id = single_task_id(args, "delete")?;
    let client = build_client(args)?;
    let task = client.delete_task(task_id).await?;
    println!("{} -> {}", task.task_id, task.status);
    Ok(())
}
