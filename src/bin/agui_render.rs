use agui_render::api::StreamClient;
use agui_render::config::Config;
use agui_render::logging::init_logging;
use agui_render::{decode_history, drive_stream, HistoryRecord, RunOutcome, SessionUpdate, StreamSession};
use anyhow::{bail, Context, Result};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const USAGE: &str = "usage:\n  agui-render replay <record-file>\n  agui-render live <payload-file>";

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let config = Config::load()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [command, path] if command == "replay" => run_replay(&config, path),
        [command, path] if command == "live" => run_live(&config, path).await,
        _ => {
            eprintln!("{USAGE}");
            bail!("expected a command and a file path");
        }
    }
}

fn run_replay(config: &Config, path: &str) -> Result<()> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("cannot read record file '{path}'"))?;
    let record = HistoryRecord::from_export(&text);
    let output = decode_history(&record, &config.formatter());

    println!("{}", output.content);
    if let Some(history) = &output.steps_history {
        println!();
        println!("{}", serde_json::to_string_pretty(history)?);
    }
    Ok(())
}

async fn run_live(config: &Config, path: &str) -> Result<()> {
    config.validate_for_streaming()?;
    let payload_text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read payload file '{path}'"))?;
    let payload: Value = serde_json::from_str(&payload_text)
        .with_context(|| format!("payload file '{path}' is not valid JSON"))?;

    let client = StreamClient::new(config)?;
    let stream = client.open_stream(&payload).await?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let progress = tokio::spawn(async move {
        while let Some(update) = update_rx.recv().await {
            if let SessionUpdate::Steps { history, .. } = update {
                eprintln!("steps recorded: {}", history.steps.len());
            }
        }
    });

    let mut session = StreamSession::new("live", config.formatter());
    let outcome = drive_stream(stream, &mut session, &cancel, Some(&update_tx)).await;
    drop(update_tx);
    let _ = progress.await;

    println!("{}", session.content());
    match outcome {
        RunOutcome::Failed { message, code } => match code {
            Some(code) => bail!("run failed ({code}): {message}"),
            None => bail!("run failed: {message}"),
        },
        RunOutcome::Aborted => {
            eprintln!("cancelled");
            Ok(())
        }
        RunOutcome::Finished | RunOutcome::Ended => Ok(()),
    }
}
