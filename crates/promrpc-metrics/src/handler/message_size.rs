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
use super::messages::Direction;
use super::{HandlerBase, StatsHandler};
use crate::collector::Subsystem;
use crate::error::Result;
use crate::options::HandlerOptions;
use crate::vec::CurriedVec;
use prometheus::HistogramVec;
use promrpc_common::{Context, RpcStats, RpcTagInfo};

/// Observes the uncompressed size of each message in one direction.
pub struct MessageSizeHandler {
    base: HandlerBase,
    direction: Direction,
    vec: CurriedVec<HistogramVec>,
    labels: RpcLabeler,
}

impl MessageSizeHandler {
    pub fn new(
        subsystem: Subsystem,
        direction: Direction,
        vec: impl Into<CurriedVec<HistogramVec>>,
        opts: HandlerOptions,
    ) -> Result<Self> {
        let vec = vec.into();
        let labels = RpcLabeler::new(subsystem, direction.size_kind(), &vec, &opts)?;
        Ok(Self {
            base: HandlerBase::new(subsystem, &opts),
            direction,
            vec,
            labels,
        })
    }
}

impl StatsHandler for MessageSizeHandler {
    fn tag_rpc(&self, ctx: Context, info: &RpcTagInfo) -> Context {
        self.base.tag_rpc(ctx, info)
    }

    fn handle_rpc(&self, ctx: &Context, stats: &RpcStats) {
        self.labels.observe(stats);

        if !self.base.observes(stats.is_client()) {
            return;
        }
        if let Some(length) = self.direction.payload_length(stats) {
            self.labels.apply(ctx, stats, |values| {
                self.vec.with_label_values(values).observe(length as f64)
            });
        }
    }
}

delegate_collector!(MessageSizeHandler);
