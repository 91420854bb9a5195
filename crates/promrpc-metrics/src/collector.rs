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

//! Default metric vectors for both sides of a call.
//!
//! Every vector is named `<namespace>_<subsystem>_<name>` and partitioned by
//! the default labels of its [`MetricKind`], followed by the configured
//! dynamic labels.

use crate::error::Result;
use crate::label::{Label, LabelSchema};
use crate::options::CollectorOptions;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NAMESPACE: &str = "grpc";

/// Which side of a call a handler instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subsystem {
    Client,
    Server,
}

impl Subsystem {
    pub const fn as_str(self) -> &'static str {
        match self {
            Subsystem::Client => "client",
            Subsystem::Server => "server",
        }
    }

    pub const fn is_client(self) -> bool {
        matches!(self, Subsystem::Client)
    }

    /// Whether an event observed on the given side belongs to this subsystem.
    pub const fn observes(self, client: bool) -> bool {
        self.is_client() == client
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const CONN_CLIENT: LabelSchema = LabelSchema::of(&[Label::LocalAddr, Label::RemoteAddr]);
const CONN_SERVER: LabelSchema = CONN_CLIENT.with(Label::ClientUserAgent);

const CALL: LabelSchema = LabelSchema::of(&[
    Label::ClientUserAgent,
    Label::IsFailFast,
    Label::Method,
    Label::Service,
]);
const CALL_SERVER_DEFAULT: LabelSchema = LabelSchema::of(&[Label::Method, Label::Service]);

const RESPONSE_CLIENT: LabelSchema = CALL.with(Label::Code);
const RESPONSE_SERVER: LabelSchema = LabelSchema::of(&[
    Label::ClientUserAgent,
    Label::Code,
    Label::Method,
    Label::Service,
]);

const MESSAGE_SERVER: LabelSchema =
    LabelSchema::of(&[Label::ClientUserAgent, Label::Method, Label::Service]);

/// The metric concepts instrumented for each subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Connections,
    RequestsTotal,
    RequestsInFlight,
    ResponsesTotal,
    MessagesReceivedTotal,
    MessagesSentTotal,
    MessageReceivedSize,
    MessageSentSize,
    RequestDuration,
}

impl MetricKind {
    pub const ALL: [MetricKind; 9] = [
        MetricKind::Connections,
        MetricKind::RequestsTotal,
        MetricKind::RequestsInFlight,
        MetricKind::ResponsesTotal,
        MetricKind::MessagesReceivedTotal,
        MetricKind::MessagesSentTotal,
        MetricKind::MessageReceivedSize,
        MetricKind::MessageSentSize,
        MetricKind::RequestDuration,
    ];

    pub const fn name(self, subsystem: Subsystem) -> &'static str {
        match (self, subsystem) {
            (MetricKind::Connections, _) => "connections",
            (MetricKind::RequestsTotal, Subsystem::Client) => "requests_sent_total",
            (MetricKind::RequestsTotal, Subsystem::Server) => "requests_received_total",
            (MetricKind::RequestsInFlight, _) => "requests_in_flight",
            (MetricKind::ResponsesTotal, Subsystem::Client) => "responses_received_total",
            (MetricKind::ResponsesTotal, Subsystem::Server) => "responses_sent_total",
            (MetricKind::MessagesReceivedTotal, _) => "messages_received_total",
            (MetricKind::MessagesSentTotal, _) => "messages_sent_total",
            (MetricKind::MessageReceivedSize, _) => "message_received_size_histogram_bytes",
            (MetricKind::MessageSentSize, _) => "message_sent_size_histogram_bytes",
            (MetricKind::RequestDuration, _) => "request_duration_histogram_seconds",
        }
    }

    pub const fn help(self) -> &'static str {
        match self {
            MetricKind::Connections => "Number of currently open connections.",
            MetricKind::RequestsTotal => "Total number of RPC requests.",
            MetricKind::RequestsInFlight => "Number of RPC requests currently in flight.",
            MetricKind::ResponsesTotal => "Total number of RPC responses, by status code.",
            MetricKind::MessagesReceivedTotal => "Total number of stream messages received.",
            MetricKind::MessagesSentTotal => "Total number of stream messages sent.",
            MetricKind::MessageReceivedSize => "Size of received messages in bytes.",
            MetricKind::MessageSentSize => "Size of sent messages in bytes.",
            MetricKind::RequestDuration => "Latency of RPC requests in seconds.",
        }
    }

    /// Labels a vector of this kind may be partitioned by.
    pub const fn supported_labels(self, subsystem: Subsystem) -> LabelSchema {
        match (self, subsystem) {
            (MetricKind::Connections, Subsystem::Client) => CONN_CLIENT,
            (MetricKind::Connections, Subsystem::Server) => CONN_SERVER,
            (MetricKind::RequestsTotal | MetricKind::RequestsInFlight, _) => CALL,
            (MetricKind::ResponsesTotal | MetricKind::RequestDuration, Subsystem::Client) => {
                RESPONSE_CLIENT
            }
            (MetricKind::ResponsesTotal | MetricKind::RequestDuration, Subsystem::Server) => {
                RESPONSE_SERVER
            }
            (_, Subsystem::Client) => CALL,
            (_, Subsystem::Server) => MESSAGE_SERVER,
        }
    }

    /// Labels the default vector of this kind is built with.
    pub const fn default_labels(self, subsystem: Subsystem) -> LabelSchema {
        match (self, subsystem) {
            (MetricKind::RequestsTotal | MetricKind::RequestsInFlight, Subsystem::Server) => {
                CALL_SERVER_DEFAULT
            }
            _ => self.supported_labels(subsystem),
        }
    }

    fn label_names(self, subsystem: Subsystem, opts: &CollectorOptions) -> Vec<&str> {
        self.default_labels(subsystem)
            .labels()
            .into_iter()
            .chain(opts.dynamic_labels.iter().map(String::as_str))
            .collect()
    }

    fn opts(self, subsystem: Subsystem, opts: &CollectorOptions) -> Opts {
        Opts::new(self.name(subsystem), self.help())
            .namespace(opts.namespace.clone())
            .subsystem(subsystem.as_str())
            .const_labels(opts.const_labels.clone())
    }

    fn histogram_opts(
        self,
        subsystem: Subsystem,
        opts: &CollectorOptions,
        buckets: &[f64],
    ) -> HistogramOpts {
        HistogramOpts::new(self.name(subsystem), self.help())
            .namespace(opts.namespace.clone())
            .subsystem(subsystem.as_str())
            .const_labels(opts.const_labels.clone())
            .buckets(buckets.to_vec())
    }
}

fn new_counter_vec(
    kind: MetricKind,
    subsystem: Subsystem,
    opts: &CollectorOptions,
) -> Result<IntCounterVec> {
    let labels = kind.label_names(subsystem, opts);
    Ok(IntCounterVec::new(kind.opts(subsystem, opts), &labels)?)
}

fn new_gauge_vec(
    kind: MetricKind,
    subsystem: Subsystem,
    opts: &CollectorOptions,
) -> Result<IntGaugeVec> {
    let labels = kind.label_names(subsystem, opts);
    Ok(IntGaugeVec::new(kind.opts(subsystem, opts), &labels)?)
}

fn new_histogram_vec(
    kind: MetricKind,
    subsystem: Subsystem,
    opts: &CollectorOptions,
    buckets: &[f64],
) -> Result<HistogramVec> {
    let labels = kind.label_names(subsystem, opts);
    Ok(HistogramVec::new(
        kind.histogram_opts(subsystem, opts, buckets),
        &labels,
    )?)
}

pub fn new_connections_vec(subsystem: Subsystem, opts: &CollectorOptions) -> Result<IntGaugeVec> {
    new_gauge_vec(MetricKind::Connections, subsystem, opts)
}

pub fn new_requests_total_vec(
    subsystem: Subsystem,
    opts: &CollectorOptions,
) -> Result<IntCounterVec> {
    new_counter_vec(MetricKind::RequestsTotal, subsystem, opts)
}

pub fn new_requests_in_flight_vec(
    subsystem: Subsystem,
    opts: &CollectorOptions,
) -> Result<IntGaugeVec> {
    new_gauge_vec(MetricKind::RequestsInFlight, subsystem, opts)
}

pub fn new_responses_total_vec(
    subsystem: Subsystem,
    opts: &CollectorOptions,
) -> Result<IntCounterVec> {
    new_counter_vec(MetricKind::ResponsesTotal, subsystem, opts)
}

pub fn new_messages_received_total_vec(
    subsystem: Subsystem,
    opts: &CollectorOptions,
) -> Result<IntCounterVec> {
    new_counter_vec(MetricKind::MessagesReceivedTotal, subsystem, opts)
}

pub fn new_messages_sent_total_vec(
    subsystem: Subsystem,
    opts: &CollectorOptions,
) -> Result<IntCounterVec> {
    new_counter_vec(MetricKind::MessagesSentTotal, subsystem, opts)
}

pub fn new_message_received_size_vec(
    subsystem: Subsystem,
    opts: &CollectorOptions,
) -> Result<HistogramVec> {
    new_histogram_vec(
        MetricKind::MessageReceivedSize,
        subsystem,
        opts,
        &opts.size_buckets,
    )
}

pub fn new_message_sent_size_vec(
    subsystem: Subsystem,
    opts: &CollectorOptions,
) -> Result<HistogramVec> {
    new_histogram_vec(MetricKind::MessageSentSize, subsystem, opts, &opts.size_buckets)
}

pub fn new_request_duration_vec(
    subsystem: Subsystem,
    opts: &CollectorOptions,
) -> Result<HistogramVec> {
    new_histogram_vec(
        MetricKind::RequestDuration,
        subsystem,
        opts,
        &opts.duration_buckets,
    )
}
