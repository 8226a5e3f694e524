// tests/correlator.rs

//! Exchange scenarios driven through the in-memory transport.

use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::sleep;

use prompt_harness::{
    // ---
    create_memory_transport,
    Correlator,
    Error,
    HarnessConfig,
    MemoryPeer,
    Request,
    RequestType,
    Result,
    REQUEST_EVENT,
    RESPONSE_EVENT,
};

async fn setup(timeout: Duration) -> Result<(Correlator, MemoryPeer)> {
    // ---
    let config = HarnessConfig::new("memory://").with_response_timeout(timeout);
    let (transport, peer) = create_memory_transport(&config).await?;
    let correlator = Correlator::with_transport(transport, config).await?;
    Ok((correlator, peer))
}

/// Scenario A: a response arrives within the timeout and is returned with
/// its diagnostic digest.
#[tokio::test]
async fn test_response_within_timeout() -> Result<()> {
    // ---
    let (correlator, mut peer) = setup(Duration::from_secs(5)).await?;
    assert_eq!(correlator.config().response_timeout, Duration::from_secs(5));

    let responder = tokio::spawn(async move {
        // ---
        let (event, payload) = peer.next_emit().await.expect("no request observed");
        assert_eq!(&*event.0, REQUEST_EVENT);

        let request: Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(request["command"], "request_prompt");
        assert_eq!(request["chat_id"], 1);
        assert_eq!(request["prompt"], "X");
        assert_eq!(request["request_type"], 1);

        peer.push_json(
            RESPONSE_EVENT,
            &json!({ "command": "request_prompt", "status": "ok", "message": "Y" }),
        )
        .await;
    });

    let request = Request::prompt(1, "X", RequestType::Freestyle);
    let exchange = correlator.send_and_await(&request).await?;

    assert_eq!(exchange.chat_id, 1);
    assert_eq!(exchange.digest.command.as_deref(), Some("request_prompt"));
    assert_eq!(exchange.digest.status.as_deref(), Some("ok"));
    assert_eq!(exchange.digest.message.as_deref(), Some("Y"));

    responder.await.unwrap();
    Ok(())
}

/// Scenario B: no response → the wait fails with `Timeout` and the
/// connection stays usable for a later exchange.
#[tokio::test]
async fn test_timeout_leaves_connection_open() -> Result<()> {
    // ---
    let (correlator, mut peer) = setup(Duration::from_millis(100)).await?;

    let request = Request::prompt(1, "anyone there?", RequestType::Freestyle);
    let result = correlator.send_and_await(&request).await;
    assert!(matches!(result, Err(Error::Timeout)));

    // The abandoned request was still transmitted.
    let (_, payload) = peer.next_emit().await.expect("request was not transmitted");
    let sent: Value = serde_json::from_slice(&payload).unwrap();
    assert_eq!(sent["prompt"], "anyone there?");

    // A fresh exchange over the same connection succeeds.
    let responder = tokio::spawn(async move {
        let _ = peer.next_emit().await.expect("no second request observed");
        peer.push_json(RESPONSE_EVENT, &json!({ "status": "ok" })).await;
    });

    let retry = Request::prompt(1, "still there?", RequestType::Freestyle);
    let exchange = correlator
        .send_and_await_with_timeout(&retry, Duration::from_secs(5))
        .await?;
    assert_eq!(exchange.digest.status.as_deref(), Some("ok"));

    responder.await.unwrap();
    Ok(())
}

/// Scenario C: a disconnect mid-wait fails the exchange with a transport
/// failure carrying the disconnect condition.
#[tokio::test]
async fn test_disconnect_fails_outstanding_wait() -> Result<()> {
    // ---
    let (correlator, mut peer) = setup(Duration::from_secs(5)).await?;

    let dropper = tokio::spawn(async move {
        let _ = peer.next_emit().await.expect("no request observed");
        peer.drop_connection("server went away").await;
    });

    let request = Request::prompt(1, "X", RequestType::Freestyle);
    let result = correlator.send_and_await(&request).await;

    match result {
        Err(Error::Transport(cause)) => assert!(cause.contains("server went away")),
        other => panic!("expected transport failure, got {other:?}"),
    }

    dropper.await.unwrap();
    Ok(())
}

/// A socket error mid-wait surfaces the same way as a disconnect.
#[tokio::test]
async fn test_socket_error_fails_outstanding_wait() -> Result<()> {
    // ---
    let (correlator, mut peer) = setup(Duration::from_secs(5)).await?;

    let failer = tokio::spawn(async move {
        let _ = peer.next_emit().await.expect("no request observed");
        peer.fail("broken pipe").await;
    });

    let request = Request::prompt(1, "X", RequestType::Freestyle);
    let result = correlator.send_and_await(&request).await;

    match result {
        Err(Error::Transport(cause)) => assert!(cause.contains("broken pipe")),
        other => panic!("expected transport failure, got {other:?}"),
    }

    failer.await.unwrap();
    Ok(())
}

/// Scenario D: a chained follow-up reuses the conversation identifier and
/// is only transmitted after the first exchange has settled.
#[tokio::test]
async fn test_chained_follow_up_same_conversation() -> Result<()> {
    // ---
    let (correlator, mut peer) = setup(Duration::from_secs(5)).await?;

    let responder = tokio::spawn(async move {
        // ---
        let (_, payload) = peer.next_emit().await.expect("no first request");
        let first: Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(first["chat_id"], 1);
        assert_eq!(first["prompt"], "first question");

        peer.push_json(RESPONSE_EVENT, &json!({ "status": "ok", "message": "answer one" }))
            .await;

        // The follow-up must not have been transmitted before the first
        // response settled; it is the next emission, rebound to chat 1.
        let (_, payload) = peer.next_emit().await.expect("no follow-up request");
        let second: Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(second["chat_id"], 1);
        assert_eq!(second["prompt"], "what did I just ask?");

        peer.push_json(RESPONSE_EVENT, &json!({ "status": "ok", "message": "answer two" }))
            .await;
    });

    let first = correlator
        .send_and_await(&Request::prompt(1, "first question", RequestType::Freestyle))
        .await?;
    assert_eq!(first.digest.message.as_deref(), Some("answer one"));

    // Deliberately constructed on the wrong conversation; chain() rebinds.
    let follow_up = Request::prompt(0, "what did I just ask?", RequestType::Freestyle);
    let second = correlator.chain(&first, follow_up).await?;

    assert_eq!(second.chat_id, 1);
    assert_eq!(second.digest.message.as_deref(), Some("answer two"));

    responder.await.unwrap();
    Ok(())
}

/// A response that arrives after its wait timed out is dropped, not
/// delivered to the next exchange.
#[tokio::test]
async fn test_late_response_is_dropped() -> Result<()> {
    // ---
    let (correlator, mut peer) = setup(Duration::from_millis(100)).await?;

    let request = Request::prompt(1, "X", RequestType::Freestyle);
    let result = correlator.send_and_await(&request).await;
    assert!(matches!(result, Err(Error::Timeout)));

    let _ = peer.next_emit().await.expect("request was not transmitted");

    // The stale answer arrives while no wait is armed.
    peer.push_json(RESPONSE_EVENT, &json!({ "id": "stale" })).await;
    sleep(Duration::from_millis(50)).await;

    let responder = tokio::spawn(async move {
        let _ = peer.next_emit().await.expect("no second request observed");
        peer.push_json(RESPONSE_EVENT, &json!({ "id": "fresh" })).await;
    });

    let retry = Request::prompt(1, "again", RequestType::Freestyle);
    let exchange = correlator
        .send_and_await_with_timeout(&retry, Duration::from_secs(5))
        .await?;

    assert_eq!(exchange.raw["id"], "fresh");

    responder.await.unwrap();
    Ok(())
}

/// A prompt response arriving well inside a short timeout wins, and the
/// expired timer has no effect on later exchanges.
#[tokio::test]
async fn test_value_wins_over_pending_timeout() -> Result<()> {
    // ---
    let (correlator, mut peer) = setup(Duration::from_millis(200)).await?;

    let responder = tokio::spawn(async move {
        // ---
        let _ = peer.next_emit().await.expect("no request observed");
        peer.push_json(RESPONSE_EVENT, &json!({ "status": "ok" })).await;

        let _ = peer.next_emit().await.expect("no second request observed");
        peer.push_json(RESPONSE_EVENT, &json!({ "status": "still ok" })).await;
    });

    let request = Request::prompt(1, "quick", RequestType::Freestyle);
    let exchange = correlator.send_and_await(&request).await?;
    assert_eq!(exchange.digest.status.as_deref(), Some("ok"));

    // Outlive the first exchange's timeout window, then go again.
    sleep(Duration::from_millis(300)).await;

    let request = Request::prompt(1, "quick again", RequestType::Freestyle);
    let exchange = correlator.send_and_await(&request).await?;
    assert_eq!(exchange.digest.status.as_deref(), Some("still ok"));

    responder.await.unwrap();
    Ok(())
}

/// Sending while a prior wait is unsettled is rejected without
/// transmitting the second request.
#[tokio::test]
async fn test_second_request_rejected_while_wait_outstanding() -> Result<()> {
    // ---
    let (correlator, mut peer) = setup(Duration::from_millis(500)).await?;

    let racing = correlator.clone();
    let first = tokio::spawn(async move {
        racing
            .send_and_await(&Request::prompt(1, "slow", RequestType::Freestyle))
            .await
    });

    // Let the first request arm the slot and transmit.
    sleep(Duration::from_millis(50)).await;

    let second = correlator
        .send_and_await(&Request::prompt(2, "impatient", RequestType::Freestyle))
        .await;
    assert!(matches!(second, Err(Error::ExchangeInFlight)));

    // The first wait runs to its own timeout, unaffected.
    assert!(matches!(first.await.unwrap(), Err(Error::Timeout)));

    // Only the first request ever reached the wire.
    let (_, payload) = peer.next_emit().await.expect("first request missing");
    let sent: Value = serde_json::from_slice(&payload).unwrap();
    assert_eq!(sent["prompt"], "slow");

    Ok(())
}

/// A payload that is not a JSON document settles the wait as a decoding
/// failure carrying the payload for diagnostics.
#[tokio::test]
async fn test_undecodable_response_settles_wait() -> Result<()> {
    // ---
    let (correlator, mut peer) = setup(Duration::from_secs(5)).await?;

    let responder = tokio::spawn(async move {
        let _ = peer.next_emit().await.expect("no request observed");
        peer.push_raw(RESPONSE_EVENT, &b"not json at all"[..]).await;
    });

    let request = Request::prompt(1, "X", RequestType::Freestyle);
    let result = correlator.send_and_await(&request).await;

    match result {
        Err(Error::Decoding { payload, .. }) => assert!(payload.contains("not json at all")),
        other => panic!("expected decoding failure, got {other:?}"),
    }

    responder.await.unwrap();
    Ok(())
}
