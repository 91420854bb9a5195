//! Shared helpers for the stats handler integration tests.
//!
//! `unary_call` drives a client and a server coordinator through the event
//! sequence an RPC runtime emits for one unary call, and `metric_value` reads
//! the result back out of a registry.

#![allow(dead_code)]

use http::header::USER_AGENT;
use http::{HeaderMap, HeaderValue};
use prometheus::proto::{Metric, MetricType};
use prometheus::Registry;
use promrpc_common::{
    Begin, ConnBegin, ConnEnd, ConnStats, ConnTagInfo, Context, End, Header, Payload, RpcStats,
    RpcTagInfo, Status, Trailer,
};
use promrpc_metrics::{Coordinator, StatsHandler};
use std::time::{Duration, Instant};

pub const USER_AGENT_VALUE: &str = "promrpc-test/1.0";
pub const REQUEST_SIZE: usize = 64;
pub const RESPONSE_SIZE: usize = 256;

fn user_agent_header() -> HeaderMap {
    let mut header = HeaderMap::new();
    header.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    header
}

fn trailer(client: bool) -> Trailer {
    Trailer {
        client,
        trailer: HeaderMap::new(),
    }
}

/// Emits the client side events of one unary call.
pub fn client_call(client: &Coordinator, ctx: Context, method: &str, error: Option<Status>) {
    let ctx = client.tag_rpc(ctx, &RpcTagInfo::new(method, true));
    let begin = Instant::now();

    client.handle_rpc(&ctx, &RpcStats::Begin(Begin::new(true)));
    client.handle_rpc(&ctx, &RpcStats::OutHeader(Header::new(true, user_agent_header())));
    client.handle_rpc(&ctx, &RpcStats::OutPayload(Payload::new(true, REQUEST_SIZE)));
    client.handle_rpc(&ctx, &RpcStats::InHeader(Header::new(true, HeaderMap::new())));
    client.handle_rpc(&ctx, &RpcStats::InPayload(Payload::new(true, RESPONSE_SIZE)));
    client.handle_rpc(&ctx, &RpcStats::InTrailer(trailer(true)));

    let mut end = End::new(true, begin, begin + Duration::from_millis(20));
    end.error = error;
    client.handle_rpc(&ctx, &RpcStats::End(end));
}

/// Emits the server side events of one unary call.
pub fn server_call(server: &Coordinator, ctx: Context, method: &str, error: Option<Status>) {
    let ctx = ctx.with_incoming_metadata(user_agent_header());
    let ctx = server.tag_rpc(ctx, &RpcTagInfo::new(method, false));
    let begin = Instant::now();

    server.handle_rpc(&ctx, &RpcStats::Begin(Begin::new(false)));
    server.handle_rpc(&ctx, &RpcStats::InHeader(Header::new(false, user_agent_header())));
    server.handle_rpc(&ctx, &RpcStats::InPayload(Payload::new(false, REQUEST_SIZE)));
    server.handle_rpc(&ctx, &RpcStats::OutHeader(Header::new(false, HeaderMap::new())));
    server.handle_rpc(&ctx, &RpcStats::OutPayload(Payload::new(false, RESPONSE_SIZE)));
    server.handle_rpc(&ctx, &RpcStats::OutTrailer(trailer(false)));

    let mut end = End::new(false, begin, begin + Duration::from_millis(10));
    end.error = error;
    server.handle_rpc(&ctx, &RpcStats::End(end));
}

/// One unary call seen from both ends.
pub fn unary_call(client: &Coordinator, server: &Coordinator, method: &str, error: Option<Status>) {
    client_call(client, Context::new(), method, error.clone());
    server_call(server, Context::new(), method, error);
}

/// Tags a connection and emits its begin event; returns the context to close it with.
pub fn open_connection(handler: &Coordinator, client: bool, remote: &str, local: &str) -> Context {
    let ctx = handler.tag_conn(Context::new(), &ConnTagInfo::new(remote, local));
    handler.handle_conn(&ctx, &ConnStats::Begin(ConnBegin { client }));
    ctx
}

pub fn close_connection(handler: &Coordinator, ctx: &Context, client: bool) {
    handler.handle_conn(ctx, &ConnStats::End(ConnEnd { client }));
}

fn matches_labels(metric: &Metric, labels: &[(&str, &str)]) -> bool {
    labels.iter().all(|(name, value)| {
        metric
            .get_label()
            .iter()
            .any(|pair| pair.get_name() == *name && pair.get_value() == *value)
    })
}

fn matching<'a>(
    families: &'a [prometheus::proto::MetricFamily],
    name: &'a str,
    labels: &'a [(&'a str, &'a str)],
) -> impl Iterator<Item = (MetricType, &'a Metric)> + 'a {
    families
        .iter()
        .filter(move |mf| mf.get_name() == name)
        .flat_map(move |mf| {
            let kind = mf.get_field_type();
            mf.get_metric()
                .iter()
                .filter(move |metric| matches_labels(metric, labels))
                .map(move |metric| (kind, metric))
        })
}

/// Sum over every series of `name` carrying all of `labels`.
///
/// Counters and gauges contribute their value, histograms their sample count.
pub fn metric_value(registry: &Registry, name: &str, labels: &[(&str, &str)]) -> f64 {
    let families = registry.gather();
    matching(&families, name, labels)
        .map(|(kind, metric)| match kind {
            MetricType::COUNTER => metric.get_counter().get_value(),
            MetricType::GAUGE => metric.get_gauge().get_value(),
            MetricType::HISTOGRAM => metric.get_histogram().get_sample_count() as f64,
            _ => 0.0,
        })
        .sum()
}

/// Sum of observed values over the matching histogram series.
pub fn histogram_sum(registry: &Registry, name: &str, labels: &[(&str, &str)]) -> f64 {
    let families = registry.gather();
    matching(&families, name, labels)
        .map(|(_, metric)| metric.get_histogram().get_sample_sum())
        .sum()
}

/// Number of exported series of `name`.
pub fn series_count(registry: &Registry, name: &str) -> usize {
    let families = registry.gather();
    matching(&families, name, &[]).count()
}

/// Value of `label` on every exported series of `name`.
pub fn label_values(registry: &Registry, name: &str, label: &str) -> Vec<String> {
    let families = registry.gather();
    matching(&families, name, &[])
        .filter_map(|(_, metric)| {
            metric
                .get_label()
                .iter()
                .find(|pair| pair.get_name() == label)
                .map(|pair| pair.get_value().to_string())
        })
        .collect()
}
