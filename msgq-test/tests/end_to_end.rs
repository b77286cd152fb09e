//! End-to-end tests over a real socket
//!
//! These mirror what a deployed `msg_q_server` sees from HTTP clients.

use futures::future::join_all;
use msgq_test::{ClientError, CreateOptions, TestServer};
use std::collections::HashSet;

#[tokio::test]
async fn test_create_and_browse() {
    let server = TestServer::start().await.unwrap();
    let client = server.client();

    let created = client.create("greetings", "hello world").await.unwrap();
    assert_eq!(created.cursor, 1);

    let message = client
        .browse("greetings", Some(created.id.as_str()))
        .await
        .unwrap()
        .expect("message should be visible");
    assert_eq!(message.id, created.id);
    assert_eq!(message.content, "hello world");

    // Browsing leaves it in place
    assert!(client.browse("greetings", None).await.unwrap().is_some());
    assert_eq!(client.query("greetings").await.unwrap().depth, 1);

    server.stop().await;
}

#[tokio::test]
async fn test_worker_flow() {
    let server = TestServer::start().await.unwrap();
    let client = server.client();

    for i in 0..3 {
        client.create("jobs", &format!("job-{i}")).await.unwrap();
    }

    // Reserve one, hand one back, confirm the rest
    let first = client.reserve("jobs", 60).await.unwrap().unwrap();
    let second = client.reserve("jobs", 60).await.unwrap().unwrap();
    assert_eq!(first.content, "job-0");
    assert_eq!(second.content, "job-1");

    client.return_message("jobs", &second.id).await.unwrap().unwrap();
    client.confirm("jobs", &first.id).await.unwrap().unwrap();

    let summary = client.query("jobs").await.unwrap();
    assert_eq!(summary.depth, 2);
    assert_eq!(summary.reserved, 0);

    let next = client.get("jobs").await.unwrap().unwrap();
    assert_eq!(next.content, "job-1");

    // Confirming twice finds nothing
    assert!(client.confirm("jobs", &first.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_correlated_reply() {
    let server = TestServer::start().await.unwrap();
    let client = server.client();
    let cid = "4f9c2f3e-6a0d-4a5e-9d7b-0f0c1c2d3e4f";

    client.create("replies", "unrelated").await.unwrap();
    client
        .create_with(
            "replies",
            "the answer",
            CreateOptions {
                cid: Some(cid.to_string()),
                expiry_seconds: Some(300),
            },
        )
        .await
        .unwrap();

    let reply = client
        .action("replies", "get", &[("cid", cid.to_string())])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply.content, "the answer");
    assert_eq!(reply.cid.as_deref(), Some(cid));
}

#[tokio::test]
async fn test_api_errors_surface() {
    let server = TestServer::start().await.unwrap();
    let client = server.client();

    let err = client.create(" ", "x").await.unwrap_err();
    match err {
        ClientError::Api { status, code, .. } => {
            assert_eq!(status, 422);
            assert_eq!(code, "InvalidQueueName");
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = client.query("never-created").await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 404, .. }));
}

#[tokio::test]
async fn test_concurrent_consumers() {
    let server = TestServer::start().await.unwrap();
    let client = server.client();

    for i in 0..40 {
        client.create("fanout", &i.to_string()).await.unwrap();
    }

    let consumers = (0..4).map(|_| {
        let client = server.client();
        async move {
            let mut got = Vec::new();
            while let Some(m) = client.get("fanout").await.unwrap() {
                got.push(m.content);
            }
            got
        }
    });

    let results: Vec<String> = join_all(consumers).await.into_iter().flatten().collect();
    let unique: HashSet<&String> = results.iter().collect();
    assert_eq!(results.len(), 40);
    assert_eq!(unique.len(), 40);

    assert_eq!(client.list_queues().await.unwrap(), vec!["fanout"]);
    assert_eq!(server.store().stored_messages(), 0);
}

#[tokio::test]
async fn test_summaries() {
    let server = TestServer::start().await.unwrap();
    let client = server.client();

    client.create("b", "1").await.unwrap();
    client.create("a", "1").await.unwrap();
    client.reserve("a", 30).await.unwrap().unwrap();

    let summaries = client.summaries().await.unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].queue_name, "a");
    assert_eq!(summaries[0].reserved, 1);
    assert_eq!(summaries[1].queue_name, "b");
    assert_eq!(summaries[1].depth, 1);
}
