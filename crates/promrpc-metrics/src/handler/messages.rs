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

/// Direction of the messages a [`MessagesHandler`] or
/// [`MessageSizeHandler`](super::MessageSizeHandler) looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Received,
    Sent,
}

impl Direction {
    /// Length of the payload if `stats` is a message in this direction.
    pub(crate) fn payload_length(self, stats: &RpcStats) -> Option<usize> {
        match (self, stats) {
            (Direction::Received, RpcStats::InPayload(payload))
            | (Direction::Sent, RpcStats::OutPayload(payload)) => Some(payload.length),
            _ => None,
        }
    }

    pub(crate) fn total_kind(self) -> MetricKind {
        match self {
            Direction::Received => MetricKind::MessagesReceivedTotal,
            Direction::Sent => MetricKind::MessagesSentTotal,
        }
    }

    pub(crate) fn size_kind(self) -> MetricKind {
        match self {
            Direction::Received => MetricKind::MessageReceivedSize,
            Direction::Sent => MetricKind::MessageSentSize,
        }
    }
}

/// Counts stream messages in one direction.
pub struct MessagesHandler {
    base: HandlerBase,
    direction: Direction,
    vec: CurriedVec<IntCounterVec>,
    labels: RpcLabeler,
}

impl MessagesHandler {
    pub fn new(
        subsystem: Subsystem,
        direction: Direction,
        vec: impl Into<CurriedVec<IntCounterVec>>,
        opts: HandlerOptions,
    ) -> Result<Self> {
        let vec = vec.into();
        let labels = RpcLabeler::new(subsystem, direction.total_kind(), &vec, &opts)?;
        Ok(Self {
            base: HandlerBase::new(subsystem, &opts),
            direction,
            vec,
            labels,
        })
    }
}

impl StatsHandler for MessagesHandler {
    fn tag_rpc(&self, ctx: Context, info: &RpcTagInfo) -> Context {
        self.base.tag_rpc(ctx, info)
    }

    fn handle_rpc(&self, ctx: &Context, stats: &RpcStats) {
        self.labels.observe(stats);

        if !self.base.observes(stats.is_client()) {
            return;
        }
        if self.direction.payload_length(stats).is_some() {
            self.labels
                .apply(ctx, stats, |values| self.vec.with_label_values(values).inc());
        }
    }
}

delegate_collector!(MessagesHandler);
