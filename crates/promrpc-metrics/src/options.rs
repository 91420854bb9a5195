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

use crate::collector::NAMESPACE;
use promrpc_common::{Context, RpcStats, RpcTagInfo};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Default boundaries of the message size histograms, in bytes.
pub const DEFAULT_SIZE_BUCKETS: &[f64] = &[
    32.0, 128.0, 512.0, 2048.0, 8192.0, 32768.0, 131072.0, 524288.0, 2097152.0, 8388608.0,
];

/// Replaces the default label projection of a handler.
///
/// Must return one value per free label of the handler's vector, in the
/// vector's label order.
pub type HandleRpcLabelFn = Arc<dyn Fn(&Context, &RpcStats) -> Vec<String> + Send + Sync>;

/// Extra per-handler tagging hook, run after the call tag is stored.
pub type TagRpcFn = Arc<dyn Fn(Context, &RpcTagInfo) -> Context + Send + Sync>;

/// Options applied to every vector built by the collector constructors.
///
/// # Example
///
/// ```
/// use promrpc_metrics::CollectorOptions;
///
/// let opts: CollectorOptions = serde_json::from_str(
///     r#"{ "namespace": "myapp", "dynamic_labels": ["tenant"] }"#,
/// )?;
/// assert_eq!(opts.namespace, "myapp");
/// assert_eq!(opts.dynamic_labels, vec!["tenant".to_string()]);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorOptions {
    pub namespace: String,
    pub const_labels: HashMap<String, String>,
    /// Label names appended after the built-in ones; values come from
    /// [`Context::with_dynamic_label_values`].
    pub dynamic_labels: Vec<String>,
    pub duration_buckets: Vec<f64>,
    pub size_buckets: Vec<f64>,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            namespace: NAMESPACE.to_string(),
            const_labels: HashMap::new(),
            dynamic_labels: Vec::new(),
            duration_buckets: prometheus::DEFAULT_BUCKETS.to_vec(),
            size_buckets: DEFAULT_SIZE_BUCKETS.to_vec(),
        }
    }
}

impl CollectorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_const_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.const_labels.insert(name.into(), value.into());
        self
    }

    pub fn with_dynamic_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dynamic_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_duration_buckets(mut self, buckets: Vec<f64>) -> Self {
        self.duration_buckets = buckets;
        self
    }

    pub fn with_size_buckets(mut self, buckets: Vec<f64>) -> Self {
        self.size_buckets = buckets;
        self
    }

    /// Handler options sharing these dynamic labels.
    pub fn handler_options(&self) -> HandlerOptions {
        HandlerOptions::default().with_dynamic_labels(self.dynamic_labels.clone())
    }
}

/// Per-handler behavior.
#[derive(Clone, Default)]
pub struct HandlerOptions {
    pub dynamic_labels: Vec<String>,
    pub handle_rpc_label_fn: Option<HandleRpcLabelFn>,
    pub tag_rpc_fn: Option<TagRpcFn>,
}

impl HandlerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dynamic_labels(mut self, labels: Vec<String>) -> Self {
        self.dynamic_labels = labels;
        self
    }

    pub fn with_handle_rpc_label_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context, &RpcStats) -> Vec<String> + Send + Sync + 'static,
    {
        self.handle_rpc_label_fn = Some(Arc::new(f));
        self
    }

    pub fn with_tag_rpc_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(Context, &RpcTagInfo) -> Context + Send + Sync + 'static,
    {
        self.tag_rpc_fn = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for HandlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("dynamic_labels", &self.dynamic_labels)
            .field("handle_rpc_label_fn", &self.handle_rpc_label_fn.is_some())
            .field("tag_rpc_fn", &self.tag_rpc_fn.is_some())
            .finish()
    }
}
