// Copyright 2025 PromRPC Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::collector::{
    new_connections_vec, new_message_received_size_vec, new_message_sent_size_vec,
    new_messages_received_total_vec, new_messages_sent_total_vec, new_request_duration_vec,
    new_requests_in_flight_vec, new_requests_total_vec, new_responses_total_vec, Subsystem,
};
use crate::error::Result;
use crate::handler::{
    ConnectionsHandler, Direction, MessageSizeHandler, MessagesHandler,
    RequestDurationHandler, RequestsInFlightHandler, RequestsTotalHandler,
    ResponsesTotalHandler, StatsHandler,
};
use crate::options::{CollectorOptions, HandlerOptions};
use crate::tagger;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use promrpc_common::{ConnStats, ConnTagInfo, Context, RpcStats, RpcTagInfo};
use std::sync::Arc;

/// A handler that is also a prometheus collector.
pub trait StatsHandlerCollector: StatsHandler + Collector {}

impl<T: StatsHandler + Collector> StatsHandlerCollector for T {}

/// Fans runtime events out to an ordered set of handlers.
///
/// The coordinator is the only component that builds tag records: it tags a
/// call or connection once, then lets every handler extend the context in
/// registration order. Events are delivered to handlers in the same order.
///
/// Cloning is cheap and clones share the handlers, so one clone can be
/// registered with a [`prometheus::Registry`] while another is installed in
/// the RPC runtime.
///
/// # Example
///
/// ```
/// use prometheus::Registry;
/// use promrpc_metrics::{client_stats_handler, CollectorOptions, StatsHandler};
/// use promrpc_common::{Begin, Context, RpcStats, RpcTagInfo};
///
/// let handler = client_stats_handler(&CollectorOptions::default())?;
/// let registry = Registry::new();
/// registry.register(Box::new(handler.clone()))?;
///
/// let info = RpcTagInfo::new("/helloworld.Greeter/SayHello", true);
/// let ctx = handler.tag_rpc(Context::new(), &info);
/// handler.handle_rpc(&ctx, &RpcStats::Begin(Begin::new(true)));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct Coordinator {
    handlers: Arc<[Box<dyn StatsHandlerCollector>]>,
}

impl Coordinator {
    pub fn new(handlers: Vec<Box<dyn StatsHandlerCollector>>) -> Self {
        Self {
            handlers: handlers.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl StatsHandler for Coordinator {
    fn tag_rpc(&self, ctx: Context, info: &RpcTagInfo) -> Context {
        let ctx = tagger::tag_call(ctx, info);
        self.handlers
            .iter()
            .fold(ctx, |ctx, handler| handler.tag_rpc(ctx, info))
    }

    fn handle_rpc(&self, ctx: &Context, stats: &RpcStats) {
        for handler in self.handlers.iter() {
            handler.handle_rpc(ctx, stats);
        }
    }

    fn tag_conn(&self, ctx: Context, info: &ConnTagInfo) -> Context {
        let ctx = tagger::tag_conn(ctx, info);
        self.handlers
            .iter()
            .fold(ctx, |ctx, handler| handler.tag_conn(ctx, info))
    }

    fn handle_conn(&self, ctx: &Context, stats: &ConnStats) {
        for handler in self.handlers.iter() {
            handler.handle_conn(ctx, stats);
        }
    }
}

impl Collector for Coordinator {
    fn desc(&self) -> Vec<&Desc> {
        self.handlers
            .iter()
            .flat_map(|handler| handler.desc())
            .collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.handlers
            .iter()
            .flat_map(|handler| handler.collect())
            .collect()
    }
}

/// Builds a coordinator with every default handler of the client subsystem.
pub fn client_stats_handler(opts: &CollectorOptions) -> Result<Coordinator> {
    stats_handler(Subsystem::Client, opts, HandlerOptions::default())
}

/// Builds a coordinator with every default handler of the server subsystem.
pub fn server_stats_handler(opts: &CollectorOptions) -> Result<Coordinator> {
    stats_handler(Subsystem::Server, opts, HandlerOptions::default())
}

/// Like [`client_stats_handler`], with `handler_opts` given to every handler.
///
/// The dynamic labels always come from `opts`, since they must match the
/// vectors built from it.
pub fn client_stats_handler_with(
    opts: &CollectorOptions,
    handler_opts: HandlerOptions,
) -> Result<Coordinator> {
    stats_handler(Subsystem::Client, opts, handler_opts)
}

/// Like [`server_stats_handler`], with `handler_opts` given to every handler.
pub fn server_stats_handler_with(
    opts: &CollectorOptions,
    handler_opts: HandlerOptions,
) -> Result<Coordinator> {
    stats_handler(Subsystem::Server, opts, handler_opts)
}

fn stats_handler(
    subsystem: Subsystem,
    opts: &CollectorOptions,
    handler_opts: HandlerOptions,
) -> Result<Coordinator> {
    let handler_opts = handler_opts.with_dynamic_labels(opts.dynamic_labels.clone());

    let handlers: Vec<Box<dyn StatsHandlerCollector>> = vec![
        Box::new(ConnectionsHandler::new(
            subsystem,
            new_connections_vec(subsystem, opts)?,
            handler_opts.clone(),
        )?),
        Box::new(RequestsTotalHandler::new(
            subsystem,
            new_requests_total_vec(subsystem, opts)?,
            handler_opts.clone(),
        )?),
        Box::new(RequestsInFlightHandler::new(
            subsystem,
            new_requests_in_flight_vec(subsystem, opts)?,
            handler_opts.clone(),
        )?),
        Box::new(RequestDurationHandler::new(
            subsystem,
            new_request_duration_vec(subsystem, opts)?,
            handler_opts.clone(),
        )?),
        Box::new(ResponsesTotalHandler::new(
            subsystem,
            new_responses_total_vec(subsystem, opts)?,
            handler_opts.clone(),
        )?),
        Box::new(MessagesHandler::new(
            subsystem,
            Direction::Received,
            new_messages_received_total_vec(subsystem, opts)?,
            handler_opts.clone(),
        )?),
        Box::new(MessagesHandler::new(
            subsystem,
            Direction::Sent,
            new_messages_sent_total_vec(subsystem, opts)?,
            handler_opts.clone(),
        )?),
        Box::new(MessageSizeHandler::new(
            subsystem,
            Direction::Received,
            new_message_received_size_vec(subsystem, opts)?,
            handler_opts.clone(),
        )?),
        Box::new(MessageSizeHandler::new(
            subsystem,
            Direction::Sent,
            new_message_sent_size_vec(subsystem, opts)?,
            handler_opts,
        )?),
    ];

    tracing::debug!(
        subsystem = %subsystem,
        namespace = %opts.namespace,
        handlers = handlers.len(),
        "stats handler created"
    );

    Ok(Coordinator::new(handlers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    struct Marker(usize);

    /// Records the order it sees events in and stamps the context.
    struct Recording {
        position: usize,
        seen: Arc<AtomicUsize>,
        vec: prometheus::IntCounter,
    }

    impl Recording {
        fn boxed(position: usize, seen: Arc<AtomicUsize>) -> Box<dyn StatsHandlerCollector> {
            let name = format!("recording_{}", position);
            Box::new(Self {
                position,
                seen,
                vec: prometheus::IntCounter::new(name, "test").unwrap(),
            })
        }
    }

    impl StatsHandler for Recording {
        fn tag_rpc(&self, ctx: Context, _info: &RpcTagInfo) -> Context {
            // handlers see the call tag and every earlier handler's value
            assert!(tagger::call_tag(&ctx).is_some());
            let previous = ctx.value::<Marker>().map(|m| m.0);
            assert_eq!(previous, self.position.checked_sub(1));
            ctx.with_value(Marker(self.position))
        }

        fn handle_rpc(&self, _ctx: &Context, _stats: &RpcStats) {
            let order = self.seen.fetch_add(1, Ordering::SeqCst);
            assert_eq!(order % 2, self.position);
            self.vec.inc();
        }
    }

    impl Collector for Recording {
        fn desc(&self) -> Vec<&Desc> {
            self.vec.desc()
        }

        fn collect(&self) -> Vec<MetricFamily> {
            self.vec.collect()
        }
    }

    #[test]
    fn test_tagging_and_fan_out_order() {
        let seen = Arc::new(AtomicUsize::new(0));
        let coordinator = Coordinator::new(vec![
            Recording::boxed(0, seen.clone()),
            Recording::boxed(1, seen.clone()),
        ]);

        let info = RpcTagInfo::new("/Service/Method", false);
        let ctx = coordinator.tag_rpc(Context::new(), &info);
        assert_eq!(ctx.value::<Marker>().map(|m| m.0), Some(1));

        coordinator.handle_rpc(&ctx, &RpcStats::Begin(promrpc_common::Begin::new(true)));
        coordinator.handle_rpc(&ctx, &RpcStats::Begin(promrpc_common::Begin::new(true)));
        assert_eq!(seen.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_collect_delegates_in_order() {
        let seen = Arc::new(AtomicUsize::new(0));
        let coordinator = Coordinator::new(vec![
            Recording::boxed(0, seen.clone()),
            Recording::boxed(1, seen),
        ]);

        let names: Vec<_> = coordinator
            .desc()
            .iter()
            .map(|desc| desc.fq_name.clone())
            .collect();
        assert_eq!(names, vec!["recording_0", "recording_1"]);
        assert_eq!(coordinator.collect().len(), 2);
    }

    #[test]
    fn test_default_coordinators() {
        let opts = CollectorOptions::default();
        let client = client_stats_handler(&opts).unwrap();
        let server = server_stats_handler(&opts).unwrap();

        assert_eq!(client.len(), 9);
        assert_eq!(server.len(), 9);
        assert_eq!(client.desc().len(), 9);

        let registry = prometheus::Registry::new();
        registry.register(Box::new(client)).unwrap();
        registry.register(Box::new(server)).unwrap();
    }

    #[test]
    fn test_default_coordinator_runs_tag_hook() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handler_opts = HandlerOptions::new().with_tag_rpc_fn(move |ctx, info| {
            counter.fetch_add(1, Ordering::SeqCst);
            ctx.with_value(Marker(info.full_method_name.len()))
        });

        let opts = CollectorOptions::default();
        let client = client_stats_handler_with(&opts, handler_opts.clone()).unwrap();
        let server = server_stats_handler_with(&opts, handler_opts).unwrap();

        let info = RpcTagInfo::new("/Service/Method", true);
        let ctx = client.tag_rpc(Context::new(), &info);
        assert_eq!(ctx.value::<Marker>().map(|m| m.0), Some(info.full_method_name.len()));
        assert!(tagger::call_tag(&ctx).is_some());
        assert_eq!(calls.load(Ordering::SeqCst), client.len());

        server.tag_rpc(Context::new(), &info);
        assert_eq!(calls.load(Ordering::SeqCst), client.len() + server.len());
    }
}
