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

//! PromRPC Common Types
//!
//! This crate holds the contract between an RPC runtime and the PromRPC
//! instrumentation: the lifecycle events the runtime emits and the context
//! carrier the events travel with.
//!
//! # Overview
//!
//! An RPC runtime notifies its stats hooks about two kinds of lifecycles:
//!
//! - **Calls**: tagged once with [`RpcTagInfo`], then reported through a
//!   sequence of [`RpcStats`] events (begin, headers, payloads, trailers, end)
//! - **Connections**: tagged once with [`ConnTagInfo`], then reported through
//!   [`ConnStats`] begin/end events
//!
//! Every event carries the [`Context`] returned by the tagging step, which is
//! how per-call state reaches the handlers without any global.
//!
//! # Components
//!
//! - [`context`] - Cloneable, type-keyed context carrier
//! - [`stats`] - Call and connection lifecycle events
//! - [`status`] - Canonical status codes and the terminal call error
//!
//! # Example
//!
//! ```
//! use promrpc_common::{Begin, Context, RpcStats, RpcTagInfo};
//!
//! let info = RpcTagInfo::new("/helloworld.Greeter/SayHello", true);
//! let ctx = Context::new();
//! let begin = RpcStats::Begin(Begin::new(true));
//!
//! assert!(begin.is_client());
//! assert_eq!(info.full_method_name, "/helloworld.Greeter/SayHello");
//! # let _ = ctx;
//! ```

pub mod context;
pub mod stats;
pub mod status;


pub use context::{Context, DynamicLabelValues};
pub use stats::{
    Begin, ConnBegin, ConnEnd, ConnStats, ConnTagInfo, End, Header, Payload, RpcStats,
    RpcTagInfo, Trailer,
};
pub use status::{Code, Status};
