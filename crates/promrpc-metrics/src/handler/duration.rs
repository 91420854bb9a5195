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
use prometheus::HistogramVec;
use promrpc_common::{Context, RpcStats, RpcTagInfo};

/// Observes call latency, in seconds, when the call ends.
pub struct RequestDurationHandler {
    base: HandlerBase,
    vec: CurriedVec<HistogramVec>,
    labels: RpcLabeler,
}

impl RequestDurationHandler {
    pub fn new(
        subsystem: Subsystem,
        vec: impl Into<CurriedVec<HistogramVec>>,
        opts: HandlerOptions,
    ) -> Result<Self> {
        let vec = vec.into();
        let labels = RpcLabeler::new(subsystem, MetricKind::RequestDuration, &vec, &opts)?;
        Ok(Self {
            base: HandlerBase::new(subsystem, &opts),
            vec,
            labels,
        })
    }
}

impl StatsHandler for RequestDurationHandler {
    fn tag_rpc(&self, ctx: Context, info: &RpcTagInfo) -> Context {
        self.base.tag_rpc(ctx, info)
    }

    fn handle_rpc(&self, ctx: &Context, stats: &RpcStats) {
        self.labels.observe(stats);

        if let RpcStats::End(end) = stats {
            if self.base.observes(end.client) {
                let seconds = end.duration().as_secs_f64();
                self.labels.apply(ctx, stats, |values| {
                    self.vec.with_label_values(values).observe(seconds)
                });
            }
        }
    }
}

delegate_collector!(RequestDurationHandler);
