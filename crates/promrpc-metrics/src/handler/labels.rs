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

use crate::collector::{MetricKind, Subsystem};
use crate::error::Result;
use crate::introspect::Projection;
use crate::label::Label;
use crate::options::{HandleRpcLabelFn, HandlerOptions};
use crate::tagger::{call_tag, conn_tag, CallLabels};
use crate::useragent::{UserAgentCache, NOT_AVAILABLE, NOT_AVAILABLE_YET};
use crate::vec::{CurriedVec, VectorMetric};
use promrpc_common::{Context, RpcStats};

/// Turns a call event into the label values of one vector.
pub(crate) struct RpcLabeler {
    projection: Projection,
    resolves_user_agent: bool,
    user_agent: UserAgentCache,
    custom: Option<HandleRpcLabelFn>,
}

impl RpcLabeler {
    pub(crate) fn new<V: VectorMetric>(
        subsystem: Subsystem,
        kind: MetricKind,
        vec: &CurriedVec<V>,
        opts: &HandlerOptions,
    ) -> Result<Self> {
        let projection = Projection::new(
            vec,
            kind.supported_labels(subsystem),
            &opts.dynamic_labels,
        )?;

        tracing::debug!(
            metric = vec.name(),
            labels = ?projection.schema().labels(),
            "stats handler labels resolved"
        );

        let resolves_user_agent = subsystem.is_client()
            && projection.schema().is_enabled(Label::ClientUserAgent);

        Ok(Self {
            projection,
            resolves_user_agent,
            user_agent: UserAgentCache::new(),
            custom: opts.handle_rpc_label_fn.clone(),
        })
    }

    /// Lets the user agent cache see an event the handler may not act on.
    ///
    /// The user agent only shows up on the client's outgoing header event,
    /// which most handlers otherwise ignore.
    pub(crate) fn observe(&self, stats: &RpcStats) {
        if self.resolves_user_agent && matches!(stats, RpcStats::OutHeader(_)) {
            self.user_agent.resolve(stats);
        }
    }

    /// Calls `f` with the label values for `stats`.
    ///
    /// # Panics
    ///
    /// Panics if `ctx` was not produced by the call tagging hook.
    pub(crate) fn apply<R>(
        &self,
        ctx: &Context,
        stats: &RpcStats,
        f: impl FnOnce(&[&str]) -> R,
    ) -> R {
        if let Some(custom) = &self.custom {
            let owned = custom(ctx, stats);
            let values: Vec<&str> = owned.iter().map(String::as_str).collect();
            return f(&values);
        }

        let tag = match call_tag(ctx) {
            Some(tag) => tag,
            None => panic!("call event handled without a call tag, tag_rpc was not invoked"),
        };

        let mut labels = CallLabels::new(tag);
        if self.resolves_user_agent {
            labels.client_user_agent = self.user_agent.resolve(stats);
        } else if !stats.is_client() && tag.client_user_agent() == NOT_AVAILABLE_YET {
            // the server only learns it from metadata present at tagging time
            labels.client_user_agent = NOT_AVAILABLE;
        }
        if let RpcStats::End(end) = stats {
            labels.code = Some(end.code());
        }

        f(&self.projection.values(&labels, ctx))
    }
}

/// Turns a connection event into the label values of one vector.
pub(crate) struct ConnLabeler {
    projection: Projection,
}

impl ConnLabeler {
    pub(crate) fn new<V: VectorMetric>(
        subsystem: Subsystem,
        kind: MetricKind,
        vec: &CurriedVec<V>,
        opts: &HandlerOptions,
    ) -> Result<Self> {
        let projection = Projection::new(
            vec,
            kind.supported_labels(subsystem),
            &opts.dynamic_labels,
        )?;
        Ok(Self { projection })
    }

    /// # Panics
    ///
    /// Panics if `ctx` was not produced by the connection tagging hook.
    pub(crate) fn apply<R>(&self, ctx: &Context, f: impl FnOnce(&[&str]) -> R) -> R {
        let tag = match conn_tag(ctx) {
            Some(tag) => tag,
            None => panic!("connection event handled without a connection tag, tag_conn was not invoked"),
        };
        f(&self.projection.values(tag, ctx))
    }
}
