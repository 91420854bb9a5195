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

use http::header::USER_AGENT;
use promrpc_common::RpcStats;
use std::sync::OnceLock;

/// Label value for a user agent that does not apply or is confirmed absent.
pub const NOT_AVAILABLE: &str = "n/a";

/// Label value for a user agent that has not been observed yet.
pub const NOT_AVAILABLE_YET: &str = "n/a/y";

/// Write-once memo of the client user agent.
///
/// The client only learns its own user agent when the transport writes the
/// outgoing headers, which happens after the call was tagged. The first
/// outgoing-header event seen by the cache fills it; every later event reads
/// the stored value without locking.
///
/// Every call made through the same client sends the same user agent, so a
/// single cache serves all of them. Each client handler keeps its own cache
/// and fills it from the first outgoing header it observes.
#[derive(Debug, Default)]
pub struct UserAgentCache {
    value: OnceLock<String>,
}

impl UserAgentCache {
    pub const fn new() -> Self {
        Self {
            value: OnceLock::new(),
        }
    }

    /// Resolves the user agent label value for a client-side event.
    pub fn resolve(&self, stats: &RpcStats) -> &str {
        if !stats.is_client() {
            return NOT_AVAILABLE;
        }

        if let Some(value) = self.value.get() {
            return if value.is_empty() {
                NOT_AVAILABLE
            } else {
                value.as_str()
            };
        }

        let RpcStats::OutHeader(header) = stats else {
            return NOT_AVAILABLE_YET;
        };

        let mut values = header.header.get_all(USER_AGENT).iter();
        let (Some(first), None) = (values.next(), values.next()) else {
            return NOT_AVAILABLE_YET;
        };

        // a non-UTF-8 header is stored as empty so later calls stop looking
        let candidate = first.to_str().unwrap_or_default();
        let stored = self.value.get_or_init(|| {
            tracing::debug!(user_agent = candidate, "client user agent resolved");
            candidate.to_string()
        });

        if stored.is_empty() {
            NOT_AVAILABLE_YET
        } else {
            stored.as_str()
        }
    }

    /// The stored value, if the cache was filled.
    pub fn get(&self) -> Option<&str> {
        self.value.get().map(String::as_str)
    }
}
