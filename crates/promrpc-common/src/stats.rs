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

use crate::status::{code_of, Code, Status};
use http::HeaderMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Information available when a call is tagged, before any event fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcTagInfo {
    /// Fully qualified method name, `/package.Service/Method`.
    pub full_method_name: String,
    /// Whether the call aborts on transient unavailability instead of waiting.
    pub fail_fast: bool,
}

impl RpcTagInfo {
    pub fn new(full_method_name: impl Into<String>, fail_fast: bool) -> Self {
        Self {
            full_method_name: full_method_name.into(),
            fail_fast,
        }
    }
}

/// Information available when a connection is tagged.
///
/// Addresses are kept as strings so that transports without socket addresses
/// (unix sockets, in-process channels) can report something meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnTagInfo {
    pub remote_addr: String,
    pub local_addr: String,
}

impl ConnTagInfo {
    pub fn new(remote_addr: impl Into<String>, local_addr: impl Into<String>) -> Self {
        Self {
            remote_addr: remote_addr.into(),
            local_addr: local_addr.into(),
        }
    }

    pub fn from_socket_addrs(remote_addr: SocketAddr, local_addr: SocketAddr) -> Self {
        Self::new(remote_addr.to_string(), local_addr.to_string())
    }
}

/// Start of a call.
#[derive(Debug, Clone)]
pub struct Begin {
    pub client: bool,
    pub begin_time: Instant,
    pub fail_fast: bool,
}

impl Begin {
    pub fn new(client: bool) -> Self {
        Self {
            client,
            begin_time: Instant::now(),
            fail_fast: false,
        }
    }
}

/// Header block sent or received on a call.
#[derive(Debug, Clone)]
pub struct Header {
    pub client: bool,
    pub header: HeaderMap,
}

impl Header {
    pub fn new(client: bool, header: HeaderMap) -> Self {
        Self { client, header }
    }
}

/// A single message sent or received on a call.
#[derive(Debug, Clone)]
pub struct Payload {
    pub client: bool,
    /// Length of the uncompressed message in bytes.
    pub length: usize,
    /// Length of the message on the wire, framing and compression included.
    pub wire_length: usize,
    pub time: Instant,
}

impl Payload {
    pub fn new(client: bool, length: usize) -> Self {
        Self {
            client,
            length,
            wire_length: length,
            time: Instant::now(),
        }
    }
}

/// Trailer block sent or received at the end of a call.
#[derive(Debug, Clone)]
pub struct Trailer {
    pub client: bool,
    pub trailer: HeaderMap,
}

/// End of a call, successful or not.
#[derive(Debug, Clone)]
pub struct End {
    pub client: bool,
    pub begin_time: Instant,
    pub end_time: Instant,
    pub error: Option<Status>,
}

impl End {
    pub fn new(client: bool, begin_time: Instant, end_time: Instant) -> Self {
        Self {
            client,
            begin_time,
            end_time,
            error: None,
        }
    }

    pub fn with_error(mut self, error: Status) -> Self {
        self.error = Some(error);
        self
    }

    /// Terminal status code of the call.
    pub fn code(&self) -> Code {
        code_of(self.error.as_ref())
    }

    /// Elapsed time between begin and end; zero if the clock readings are
    /// out of order.
    pub fn duration(&self) -> Duration {
        self.end_time.saturating_duration_since(self.begin_time)
    }
}

/// Call lifecycle event.
///
/// Within a single call the runtime delivers these in order; across calls
/// there is no ordering at all.
#[derive(Debug, Clone)]
pub enum RpcStats {
    Begin(Begin),
    InHeader(Header),
    InPayload(Payload),
    InTrailer(Trailer),
    OutHeader(Header),
    OutPayload(Payload),
    OutTrailer(Trailer),
    End(End),
}

impl RpcStats {
    /// Whether the event was observed by the client side of the call.
    pub fn is_client(&self) -> bool {
        match self {
            RpcStats::Begin(s) => s.client,
            RpcStats::InHeader(s) | RpcStats::OutHeader(s) => s.client,
            RpcStats::InPayload(s) | RpcStats::OutPayload(s) => s.client,
            RpcStats::InTrailer(s) | RpcStats::OutTrailer(s) => s.client,
            RpcStats::End(s) => s.client,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnBegin {
    pub client: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnEnd {
    pub client: bool,
}

/// Connection lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnStats {
    Begin(ConnBegin),
    End(ConnEnd),
}

impl ConnStats {
    pub fn is_client(&self) -> bool {
        match self {
            ConnStats::Begin(s) => s.client,
            ConnStats::End(s) => s.client,
        }
    }
}
