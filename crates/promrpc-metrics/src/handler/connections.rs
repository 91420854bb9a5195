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

use super::labels::ConnLabeler;
use super::{HandlerBase, StatsHandler};
use crate::collector::{MetricKind, Subsystem};
use crate::error::Result;
use crate::options::HandlerOptions;
use crate::vec::CurriedVec;
use prometheus::IntGaugeVec;
use promrpc_common::{ConnStats, Context, RpcTagInfo};

/// Number of open connections, by address.
pub struct ConnectionsHandler {
    base: HandlerBase,
    vec: CurriedVec<IntGaugeVec>,
    labels: ConnLabeler,
}

impl ConnectionsHandler {
    pub fn new(
        subsystem: Subsystem,
        vec: impl Into<CurriedVec<IntGaugeVec>>,
        opts: HandlerOptions,
    ) -> Result<Self> {
        let vec = vec.into();
        let labels = ConnLabeler::new(subsystem, MetricKind::Connections, &vec, &opts)?;
        Ok(Self {
            base: HandlerBase::new(subsystem, &opts),
            vec,
            labels,
        })
    }
}

impl StatsHandler for ConnectionsHandler {
    fn tag_rpc(&self, ctx: Context, info: &RpcTagInfo) -> Context {
        self.base.tag_rpc(ctx, info)
    }

    fn handle_conn(&self, ctx: &Context, stats: &ConnStats) {
        if !self.base.observes(stats.is_client()) {
            return;
        }
        self.labels.apply(ctx, |values| {
            let gauge = self.vec.with_label_values(values);
            match stats {
                ConnStats::Begin(_) => gauge.inc(),
                ConnStats::End(_) => gauge.dec(),
            }
        });
    }
}

delegate_collector!(ConnectionsHandler);
