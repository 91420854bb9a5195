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

//! PromRPC Metrics
//!
//! Prometheus instrumentation for RPC clients and servers. The crate plugs
//! into the stats hooks of an RPC runtime and turns call and connection
//! lifecycle events into counters, gauges and histograms.
//!
//! # Components
//!
//! - [`Coordinator`] - Tags calls and connections once and fans events out
//!   to its handlers; it is also the prometheus collector to register
//! - [`handler`] - One handler per metric concept (requests, responses,
//!   in-flight calls, messages, message sizes, durations, connections)
//! - [`LabelSchema`] - The fixed label vocabulary and ordered projections
//! - [`CurriedVec`] - Prometheus vectors with pre-bound labels
//! - [`introspect`](introspect::introspect) - Construction-time validation
//!   of the labels a vector still expects
//! - [`UserAgentCache`] - Write-once memo of the client user agent
//!
//! # Example
//!
//! ```
//! use prometheus::Registry;
//! use promrpc_common::{Begin, Context, End, Header, RpcStats, RpcTagInfo};
//! use promrpc_metrics::{client_stats_handler, CollectorOptions, StatsHandler};
//! use std::time::Instant;
//!
//! let registry = Registry::new();
//! let handler = client_stats_handler(&CollectorOptions::default())?;
//! registry.register(Box::new(handler.clone()))?;
//!
//! let ctx = handler.tag_rpc(Context::new(), &RpcTagInfo::new("/Service/Method", true));
//! let begin = Instant::now();
//! handler.handle_rpc(&ctx, &RpcStats::Begin(Begin::new(true)));
//! handler.handle_rpc(&ctx, &RpcStats::OutHeader(Header::new(true, Default::default())));
//! handler.handle_rpc(&ctx, &RpcStats::End(End::new(true, begin, Instant::now())));
//!
//! let families = registry.gather();
//! assert!(families
//!     .iter()
//!     .any(|mf| mf.get_name() == "grpc_client_requests_sent_total"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod collector;
pub mod coordinator;
pub mod error;
pub mod handler;
pub mod introspect;
pub mod label;
pub mod options;
pub mod tagger;
pub mod useragent;
pub mod vec;

pub use collector::{MetricKind, Subsystem, NAMESPACE};
pub use coordinator::{
    client_stats_handler, client_stats_handler_with, server_stats_handler,
    server_stats_handler_with, Coordinator, StatsHandlerCollector,
};
pub use error::{PromrpcError, Result};
pub use handler::StatsHandler;
pub use label::{Label, LabelSchema, LabelSource};
pub use options::{CollectorOptions, HandleRpcLabelFn, HandlerOptions, TagRpcFn};
pub use useragent::UserAgentCache;
pub use vec::{CurriedVec, VectorMetric};
