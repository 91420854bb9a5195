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

use super::labels::RpcLabeler;
use super::{HandlerBase, StatsHandler};
use crate::collector::{MetricKind, Subsystem};
use crate::error::Result;
use crate::options::HandlerOptions;
use crate::vec::CurriedVec;
use prometheus::IntCounterVec;
use promrpc_common::{Context, RpcStats, RpcTagInfo};

/// Counts calls as they start.
///
/// A client call starts when its headers go out; a server call starts on
/// the begin event.
pub struct RequestsTotalHandler {
    base: HandlerBase,
    vec: CurriedVec<IntCounterVec>,
    labels: RpcLabeler,
}

impl RequestsTotalHandler {
    pub fn new(
        subsystem: Subsystem,
        vec: impl Into<CurriedVec<IntCounterVec>>,
        opts: HandlerOptions,
    ) -> Result<Self> {
        let vec = vec.into();
        let labels = RpcLabeler::new(subsystem, MetricKind::RequestsTotal, &vec, &opts)?;
        Ok(Self {
            base: HandlerBase::new(subsystem, &opts),
            vec,
            labels,
        })
    }
}

impl StatsHandler for RequestsTotalHandler {
    fn tag_rpc(&self, ctx: Context, info: &RpcTagInfo) -> Context {
        self.base.tag_rpc(ctx, info)
    }

    fn handle_rpc(&self, ctx: &Context, stats: &RpcStats) {
        self.labels.observe(stats);

        if !self.base.observes(stats.is_client()) {
            return;
        }
        let started = match self.base.subsystem() {
            Subsystem::Client => matches!(stats, RpcStats::OutHeader(_)),
            Subsystem::Server => matches!(stats, RpcStats::Begin(_)),
        };
        if started {
            self.labels
                .apply(ctx, stats, |values| self.vec.with_label_values(values).inc());
        }
    }
}

delegate_collector!(RequestsTotalHandler);
