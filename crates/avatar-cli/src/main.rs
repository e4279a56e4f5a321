//! `avatar-voice` binary: synthesize speech plus lip-sync for a piece of text.
//!
//! Prints the final job status (or the rendered artifact locations with
//! `--key`) as JSON on stdout. Logs go to stderr.

use avatar_cli::config::load_config;
use avatar_cli::{build_pipeline, init_tracing, render_to_key, resolve_config_path, run_job, Cli};
use avatar_jobs::VoiceJobs;
use avatar_types::JobStatus;
use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("failed to serialize output: {}", e),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    let text = args.joined_text();

    let (config_path, config_source) = resolve_config_path(args.config.as_deref());
    let config = match load_config(Some(&config_path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.logging);
    tracing::info!(
        source = config_source,
        path = %config_path,
        "resolved startup configuration path"
    );

    let pipeline = match build_pipeline(&config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!("failed to build voice pipeline: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = pipeline.layout().ensure_dirs().await {
        tracing::error!("media directory is not writable: {}", e);
        return ExitCode::FAILURE;
    }

    if let Some(key) = args.key.as_deref() {
        let text = config.pipeline.reply.spoken_text(&text);
        return match render_to_key(&pipeline, key, &text).await {
            Ok(output) => {
                print_json(&output);
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(key, "render failed: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let jobs = VoiceJobs::new(pipeline);
    let session = args.session.as_deref().unwrap_or("cli");
    match run_job(&jobs, session, &text, &config).await {
        Some(view) => {
            print_json(&view);
            if view.status == JobStatus::Done {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        None => {
            tracing::error!("voice job disappeared from the store");
            ExitCode::FAILURE
        }
    }
}
