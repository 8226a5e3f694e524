// src/bin/prompt_harness.rs

//! Manual harness run against a live prompt service.
//!
//! Linear flow: connect → send a `request_prompt` exchange → chain a
//! follow-up on the same conversation → tear the connection down. Endpoint
//! comes from `PROMPT_HARNESS_ENDPOINT` (default `http://localhost:5001`);
//! there are no CLI flags.
//!
//! Requires features `transport_socketio,logging`:
//!
//! ```text
//! PROMPT_HARNESS_ENDPOINT=http://localhost:5001 \
//!     cargo run --features transport_socketio,logging
//! ```

use std::process::ExitCode;

use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use prompt_harness::{
    // ---
    create_socketio_transport,
    Correlator,
    EventTransport,
    Exchange,
    HarnessConfig,
    Request,
    RequestType,
    Result,
    TransportPtr,
};

#[tokio::main]
async fn main() -> ExitCode {
    // ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = HarnessConfig::from_env();
    info!("connecting to {}...", config.endpoint);

    let transport = match create_socketio_transport(&config).await {
        Ok(transport) => transport,
        Err(err) => {
            error!("connection failed: {err}");
            return ExitCode::FAILURE;
        }
    };
    info!("connected");

    let result = run(transport.clone(), config).await;

    if let Err(err) = &result {
        error!("harness run failed: {err}");
    }

    // Release the connection on every exit path.
    if let Err(err) = transport.close().await {
        error!("teardown: {err}");
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

async fn run(transport: TransportPtr, config: HarnessConfig) -> Result<()> {
    // ---
    let correlator = Correlator::with_transport(transport, config).await?;
    info!(
        "response timeout per exchange: {:?}",
        correlator.config().response_timeout
    );

    let request = Request::prompt(
        1,
        "Summarize everything written in this sheet",
        RequestType::Freestyle,
    )
    .with_current_program(json!({
        "context": "<table><tr><td>AA</td><td>DD</td></tr><tr><td>BB</td><td>GG</td></tr></table>",
        "fileType": "Excel",
        "fileName": "test.xlsx",
    }));

    info!("sending request_prompt (chat_id: {})", request.chat_id());
    let first = correlator.send_and_await(&request).await?;
    report(&first);

    // Same conversation; the chain call rebinds chat_id.
    let follow_up = Request::prompt(0, "What did I just ask you?", RequestType::Freestyle);

    info!("sending follow-up on conversation {}", first.chat_id);
    let second = correlator.chain(&first, follow_up).await?;
    report(&second);

    Ok(())
}

fn report(exchange: &Exchange) {
    // ---
    info!("response on conversation {}: {}", exchange.chat_id, exchange.raw);

    if let Some(command) = &exchange.digest.command {
        info!("  command: {command}");
    }
    if let Some(status) = &exchange.digest.status {
        info!("  status: {status}");
    }
    if let Some(message) = &exchange.digest.message {
        info!("  message: {message}");
    }
}
