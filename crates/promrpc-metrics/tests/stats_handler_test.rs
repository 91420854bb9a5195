//! Stats Handler Integration Tests
//!
//! End-to-end tests driving the default client and server coordinators
//! through simulated RPC traffic and reading the results from a registry.
//! Tests cover:
//! 1. Request/response accounting over 100 unary calls
//! 2. Status codes on responses and durations
//! 3. Connection gauges
//! 4. Dynamic labels
//! 5. Concurrent calls from many threads

use prometheus::Registry;
use promrpc_common::{Begin, Code, Context, End, RpcStats, RpcTagInfo, Status};
use promrpc_metrics::{
    client_stats_handler, server_stats_handler, CollectorOptions, Coordinator, StatsHandler,
};
use std::collections::HashMap;
use std::time::{Duration, Instant};

mod common;
use common::{
    client_call, close_connection, histogram_sum, label_values, metric_value, open_connection,
    series_count, unary_call, REQUEST_SIZE, RESPONSE_SIZE, USER_AGENT_VALUE,
};

const METHOD: &str = "/Service/Method";
const LABELS: &[(&str, &str)] = &[("grpc_method", "Method"), ("grpc_service", "Service")];

fn setup(opts: &CollectorOptions) -> (Registry, Coordinator, Coordinator) {
    let registry = Registry::new();
    let client = client_stats_handler(opts).unwrap();
    let server = server_stats_handler(opts).unwrap();
    registry.register(Box::new(client.clone())).unwrap();
    registry.register(Box::new(server.clone())).unwrap();
    (registry, client, server)
}

// ============================================================================
// Test 1: Request/Response Accounting
// ============================================================================

#[test]
fn test_hundred_unary_calls() {
    let (registry, client, server) = setup(&CollectorOptions::default());

    for _ in 0..100 {
        unary_call(&client, &server, METHOD, None);
    }

    for name in [
        "grpc_client_requests_sent_total",
        "grpc_server_requests_received_total",
        "grpc_client_responses_received_total",
        "grpc_server_responses_sent_total",
        "grpc_client_messages_sent_total",
        "grpc_client_messages_received_total",
        "grpc_server_messages_sent_total",
        "grpc_server_messages_received_total",
        "grpc_client_request_duration_histogram_seconds",
        "grpc_server_request_duration_histogram_seconds",
    ] {
        assert_eq!(metric_value(&registry, name, LABELS), 100.0, "{}", name);
    }

    assert_eq!(metric_value(&registry, "grpc_client_requests_in_flight", LABELS), 0.0);
    assert_eq!(metric_value(&registry, "grpc_server_requests_in_flight", LABELS), 0.0);
}

#[test]
fn test_message_sizes() {
    let (registry, client, server) = setup(&CollectorOptions::default());

    for _ in 0..10 {
        unary_call(&client, &server, METHOD, None);
    }

    let sent = histogram_sum(&registry, "grpc_client_message_sent_size_histogram_bytes", LABELS);
    let received = histogram_sum(
        &registry,
        "grpc_server_message_received_size_histogram_bytes",
        LABELS,
    );
    assert_eq!(sent, (10 * REQUEST_SIZE) as f64);
    assert_eq!(received, (10 * REQUEST_SIZE) as f64);

    let responses = histogram_sum(
        &registry,
        "grpc_client_message_received_size_histogram_bytes",
        LABELS,
    );
    assert_eq!(responses, (10 * RESPONSE_SIZE) as f64);
}

#[test]
fn test_client_user_agent_is_resolved() {
    let (registry, client, server) = setup(&CollectorOptions::default());

    for _ in 0..5 {
        unary_call(&client, &server, METHOD, None);
    }

    // the first outgoing header fills the cache, so every client series has it
    let agents = label_values(
        &registry,
        "grpc_client_requests_sent_total",
        "grpc_client_user_agent",
    );
    assert_eq!(agents, vec![USER_AGENT_VALUE.to_string()]);

    // the server reads it from the incoming metadata at tagging time
    let agents = label_values(
        &registry,
        "grpc_server_responses_sent_total",
        "grpc_client_user_agent",
    );
    assert_eq!(agents, vec![USER_AGENT_VALUE.to_string()]);
}

#[test]
fn test_server_user_agent_without_metadata() {
    let (registry, _client, server) = setup(&CollectorOptions::default());

    // no incoming metadata, so the user agent can never become known
    let ctx = server.tag_rpc(Context::new(), &RpcTagInfo::new(METHOD, false));
    let begin = Instant::now();
    server.handle_rpc(&ctx, &RpcStats::Begin(Begin::new(false)));
    server.handle_rpc(
        &ctx,
        &RpcStats::End(End::new(false, begin, begin + Duration::from_millis(5))),
    );

    for name in [
        "grpc_server_responses_sent_total",
        "grpc_server_request_duration_histogram_seconds",
    ] {
        assert_eq!(
            label_values(&registry, name, "grpc_client_user_agent"),
            vec!["n/a".to_string()],
            "{}",
            name
        );
    }
}

#[test]
fn test_unknown_method_name() {
    let (registry, client, server) = setup(&CollectorOptions::default());

    unary_call(&client, &server, "no-separator", None);

    let labels = &[("grpc_method", "unknown"), ("grpc_service", "unknown")];
    assert_eq!(metric_value(&registry, "grpc_client_requests_sent_total", labels), 1.0);
    assert_eq!(metric_value(&registry, "grpc_server_requests_received_total", labels), 1.0);
}

// ============================================================================
// Test 2: Status Codes
// ============================================================================

#[test]
fn test_response_codes() {
    let (registry, client, server) = setup(&CollectorOptions::default());

    unary_call(&client, &server, METHOD, None);
    unary_call(&client, &server, METHOD, Some(Status::new(Code::NotFound, "missing")));
    unary_call(&client, &server, METHOD, Some(Status::new(Code::NotFound, "missing")));

    for name in [
        "grpc_client_responses_received_total",
        "grpc_server_responses_sent_total",
        "grpc_client_request_duration_histogram_seconds",
        "grpc_server_request_duration_histogram_seconds",
    ] {
        assert_eq!(metric_value(&registry, name, &[("grpc_code", "OK")]), 1.0, "{}", name);
        assert_eq!(
            metric_value(&registry, name, &[("grpc_code", "NotFound")]),
            2.0,
            "{}",
            name
        );
    }

    // requests are counted before the outcome is known
    assert_eq!(series_count(&registry, "grpc_client_requests_sent_total"), 1);
}

#[test]
fn test_duration_is_observed_in_seconds() {
    let (registry, client, _) = setup(&CollectorOptions::default());

    client_call(&client, Context::new(), METHOD, None);

    let sum = histogram_sum(
        &registry,
        "grpc_client_request_duration_histogram_seconds",
        LABELS,
    );
    assert!((sum - 0.020).abs() < 1e-9, "sum = {}", sum);
}

// ============================================================================
// Test 3: Connections
// ============================================================================

#[test]
fn test_connections_gauge() {
    let (registry, client, server) = setup(&CollectorOptions::default());

    let client_conn = open_connection(&client, true, "10.0.0.2:50051", "10.0.0.1:40000");
    let server_conn = open_connection(&server, false, "10.0.0.1:40000", "10.0.0.2:50051");

    let client_labels = &[
        ("grpc_remote_addr", "10.0.0.2"),
        ("grpc_local_addr", "10.0.0.1:40000"),
    ];
    assert_eq!(metric_value(&registry, "grpc_client_connections", client_labels), 1.0);
    assert_eq!(
        metric_value(
            &registry,
            "grpc_server_connections",
            &[("grpc_remote_addr", "10.0.0.1")]
        ),
        1.0
    );

    close_connection(&client, &client_conn, true);
    close_connection(&server, &server_conn, false);

    assert_eq!(metric_value(&registry, "grpc_client_connections", &[]), 0.0);
    assert_eq!(metric_value(&registry, "grpc_server_connections", &[]), 0.0);
}

#[test]
fn test_connection_events_of_other_side_are_ignored() {
    let (registry, client, _) = setup(&CollectorOptions::default());

    open_connection(&client, false, "10.0.0.2:50051", "10.0.0.1:40000");
    assert_eq!(series_count(&registry, "grpc_client_connections"), 0);
}

// ============================================================================
// Test 4: Dynamic Labels
// ============================================================================

#[test]
fn test_dynamic_labels() {
    let opts = CollectorOptions::default().with_dynamic_labels(["tenant"]);
    let (registry, client, _) = setup(&opts);

    let mut values = HashMap::new();
    values.insert("tenant".to_string(), "acme".to_string());

    client_call(&client, Context::new().with_dynamic_label_values(values), METHOD, None);
    client_call(&client, Context::new(), METHOD, None);

    let name = "grpc_client_requests_sent_total";
    assert_eq!(metric_value(&registry, name, &[("tenant", "acme")]), 1.0);
    assert_eq!(metric_value(&registry, name, &[("tenant", "")]), 1.0);
    assert_eq!(metric_value(&registry, name, LABELS), 2.0);
}

// ============================================================================
// Test 5: Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls() {
    const TASKS: usize = 8;
    const CALLS: usize = 50;

    let (registry, client, server) = setup(&CollectorOptions::default());

    let mut handles = vec![];
    for _ in 0..TASKS {
        let client = client.clone();
        let server = server.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..CALLS {
                unary_call(&client, &server, METHOD, None);
                tokio::task::yield_now().await;
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let total = (TASKS * CALLS) as f64;
    assert_eq!(metric_value(&registry, "grpc_client_requests_sent_total", LABELS), total);
    assert_eq!(metric_value(&registry, "grpc_server_responses_sent_total", LABELS), total);
    assert_eq!(metric_value(&registry, "grpc_client_requests_in_flight", &[]), 0.0);
    assert_eq!(metric_value(&registry, "grpc_server_requests_in_flight", &[]), 0.0);

    let agents = label_values(
        &registry,
        "grpc_client_responses_received_total",
        "grpc_client_user_agent",
    );
    assert_eq!(agents, vec![USER_AGENT_VALUE.to_string()]);
}
