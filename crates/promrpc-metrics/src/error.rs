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

use thiserror::Error;

/// Construction-time failures.
///
/// All of these are wiring mistakes: they are reported once, when a vector or
/// handler is built, and never from the event hot path.
#[derive(Error, Debug)]
pub enum PromrpcError {
    #[error("metric vector must expose exactly one descriptor, found {0}")]
    MalformedDescriptor(usize),

    #[error("metric partitioned with non-supported labels: {metric} uses {label}")]
    UnsupportedLabel { metric: String, label: String },

    #[error("cannot curry {label}: not a variable label of {metric}")]
    UnknownLabel { metric: String, label: String },

    #[error("cannot curry {label}: already curried on {metric}")]
    AlreadyCurried { metric: String, label: String },

    #[error("expected {expected} label values, got {got}")]
    Cardinality { expected: usize, got: usize },

    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

pub type Result<T> = std::result::Result<T, PromrpcError>;
