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

use http::{Extensions, HeaderMap};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-call or per-connection context carrier.
///
/// A `Context` is an immutable-by-convention bag of values keyed by their
/// type. Tagging hooks take a context by value and return an extended copy;
/// handling hooks only ever borrow it. Cloning is cheap as long as the stored
/// values are cheap to clone (the crate stores everything behind `Arc`).
///
/// Each consumer keeps its keys private by defining its own wrapper type, so
/// two crates can never overwrite each other's entries.
///
/// # Example
///
/// ```
/// use promrpc_common::Context;
///
/// #[derive(Clone)]
/// struct RequestId(u64);
///
/// let ctx = Context::new().with_value(RequestId(7));
/// assert_eq!(ctx.value::<RequestId>().map(|id| id.0), Some(7));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    extensions: Extensions,
}

#[derive(Debug, Clone)]
struct IncomingMetadata(Arc<HeaderMap>);

/// Caller-supplied values for dynamic labels, keyed by label name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicLabelValues(Arc<HashMap<String, String>>);

impl DynamicLabelValues {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self(Arc::new(values))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this context extended with `value`.
    ///
    /// A previous value of the same type is replaced.
    pub fn with_value<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.extensions.insert(value);
        self
    }

    /// Looks up the value stored under type `T`.
    pub fn value<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    /// Attaches the metadata received from the peer (server side).
    pub fn with_incoming_metadata(self, metadata: HeaderMap) -> Self {
        self.with_value(IncomingMetadata(Arc::new(metadata)))
    }

    pub fn incoming_metadata(&self) -> Option<&HeaderMap> {
        self.value::<IncomingMetadata>().map(|md| md.0.as_ref())
    }

    /// Attaches values for the dynamic labels configured on the collectors.
    ///
    /// Values are looked up by label name at observation time; a label
    /// without a value is reported as an empty string.
    pub fn with_dynamic_label_values(self, values: HashMap<String, String>) -> Self {
        self.with_value(DynamicLabelValues::new(values))
    }

    pub fn dynamic_label_values(&self) -> Option<&DynamicLabelValues> {
        self.value::<DynamicLabelValues>()
    }
}
