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

//! Metric handlers, one per metric concept.
//!
//! Each handler owns a single vector, filters the events of its subsystem and
//! turns the matching ones into one metric mutation. Handlers never look at
//! each other; the [`Coordinator`](crate::Coordinator) wires them together.

use crate::collector::Subsystem;
use crate::options::{HandlerOptions, TagRpcFn};
use promrpc_common::{ConnStats, ConnTagInfo, Context, RpcStats, RpcTagInfo};

/// Implements `prometheus::core::Collector` by delegating to the `vec` field.
macro_rules! delegate_collector {
    ($($handler:ty),* $(,)?) => {
        $(
            impl prometheus::core::Collector for $handler {
                fn desc(&self) -> Vec<&prometheus::core::Desc> {
                    prometheus::core::Collector::desc(&self.vec)
                }

                fn collect(&self) -> Vec<prometheus::proto::MetricFamily> {
                    prometheus::core::Collector::collect(&self.vec)
                }
            }
        )*
    };
}

mod connections;
mod duration;
mod in_flight;
mod labels;
mod message_size;
mod messages;
mod requests;
mod responses;

pub use connections::ConnectionsHandler;
pub use duration::RequestDurationHandler;
pub use in_flight::RequestsInFlightHandler;
pub use message_size::MessageSizeHandler;
pub use messages::{Direction, MessagesHandler};
pub use requests::RequestsTotalHandler;
pub use responses::ResponsesTotalHandler;

/// Hooks invoked by the RPC runtime.
///
/// `tag_*` run once per call or connection, before any of its events, and
/// return the context every later event is delivered with. `handle_*` run
/// once per event and may be called concurrently from many threads.
pub trait StatsHandler: Send + Sync {
    fn tag_rpc(&self, ctx: Context, _info: &RpcTagInfo) -> Context {
        ctx
    }

    fn handle_rpc(&self, _ctx: &Context, _stats: &RpcStats) {}

    fn tag_conn(&self, ctx: Context, _info: &ConnTagInfo) -> Context {
        ctx
    }

    fn handle_conn(&self, _ctx: &Context, _stats: &ConnStats) {}
}

/// State shared by every handler: its subsystem and the optional tagging hook.
#[derive(Clone)]
pub(crate) struct HandlerBase {
    subsystem: Subsystem,
    tag_rpc_fn: Option<TagRpcFn>,
}

impl HandlerBase {
    pub(crate) fn new(subsystem: Subsystem, opts: &HandlerOptions) -> Self {
        Self {
            subsystem,
            tag_rpc_fn: opts.tag_rpc_fn.clone(),
        }
    }

    pub(crate) fn subsystem(&self) -> Subsystem {
        self.subsystem
    }

    pub(crate) fn observes(&self, client: bool) -> bool {
        self.subsystem.observes(client)
    }

    pub(crate) fn tag_rpc(&self, ctx: Context, info: &RpcTagInfo) -> Context {
        match &self.tag_rpc_fn {
            Some(tag) => tag(ctx, info),
            None => ctx,
        }
    }
}
