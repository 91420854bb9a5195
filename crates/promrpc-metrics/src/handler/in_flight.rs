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
use prometheus::{IntGauge, IntGaugeVec};
use promrpc_common::{Context, RpcStats, RpcTagInfo};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(0);

/// Where one call stands for one handler.
///
/// Keeping the incremented child around makes the decrement hit the very same
/// series, even if a label value (the client user agent) resolved
/// differently in between.
#[derive(Default)]
enum CallState {
    #[default]
    Pending,
    Started(IntGauge),
    Finished,
}

/// Per-handler call state, keyed by handler id.
#[derive(Clone, Default)]
struct InFlightSlots(Vec<(u64, Arc<Mutex<CallState>>)>);

impl InFlightSlots {
    fn get(&self, id: u64) -> Option<&Mutex<CallState>> {
        self.0
            .iter()
            .find(|(slot_id, _)| *slot_id == id)
            .map(|(_, slot)| slot.as_ref())
    }
}

/// Tracks the number of calls between start and end.
///
/// A client call starts when its headers go out; a server call starts on the
/// begin event. The gauge is decremented at most once per call and only if
/// the same call incremented it, so calls that fail before starting never
/// drive it negative. A finished call cannot start again. A call whose end
/// event is never delivered stays counted.
pub struct RequestsInFlightHandler {
    id: u64,
    base: HandlerBase,
    vec: CurriedVec<IntGaugeVec>,
    labels: RpcLabeler,
}

impl RequestsInFlightHandler {
    pub fn new(
        subsystem: Subsystem,
        vec: impl Into<CurriedVec<IntGaugeVec>>,
        opts: HandlerOptions,
    ) -> Result<Self> {
        let vec = vec.into();
        let labels = RpcLabeler::new(subsystem, MetricKind::RequestsInFlight, &vec, &opts)?;
        Ok(Self {
            id: NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed),
            base: HandlerBase::new(subsystem, &opts),
            vec,
            labels,
        })
    }

    fn is_start(&self, stats: &RpcStats) -> bool {
        match self.base.subsystem() {
            Subsystem::Client => matches!(stats, RpcStats::OutHeader(_)),
            Subsystem::Server => matches!(stats, RpcStats::Begin(_)),
        }
    }

    fn slot<'a>(&self, ctx: &'a Context) -> &'a Mutex<CallState> {
        match ctx.value::<InFlightSlots>().and_then(|slots| slots.get(self.id)) {
            Some(slot) => slot,
            None => panic!("requests in flight handler used with a context it did not tag"),
        }
    }
}

impl StatsHandler for RequestsInFlightHandler {
    fn tag_rpc(&self, ctx: Context, info: &RpcTagInfo) -> Context {
        let mut slots = ctx.value::<InFlightSlots>().cloned().unwrap_or_default();
        slots.0.push((self.id, Arc::default()));
        self.base.tag_rpc(ctx.with_value(slots), info)
    }

    fn handle_rpc(&self, ctx: &Context, stats: &RpcStats) {
        self.labels.observe(stats);

        if !self.base.observes(stats.is_client()) {
            return;
        }

        if self.is_start(stats) {
            let mut state = self
                .slot(ctx)
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let CallState::Pending = *state {
                let gauge = self
                    .labels
                    .apply(ctx, stats, |values| self.vec.with_label_values(values));
                gauge.inc();
                *state = CallState::Started(gauge);
            }
        } else if let RpcStats::End(_) = stats {
            let previous = std::mem::replace(
                &mut *self
                    .slot(ctx)
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner),
                CallState::Finished,
            );
            if let CallState::Started(gauge) = previous {
                gauge.dec();
            }
        }
    }
}

delegate_collector!(RequestsInFlightHandler);
