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

//! Construction-time discovery of the labels a vector still expects.

use crate::error::{PromrpcError, Result};
use crate::label::{LabelSchema, LabelSource};
use crate::vec::{CurriedVec, VectorMetric};
use prometheus::core::Collector;
use promrpc_common::Context;

/// Computes the effective schema of `vec`.
///
/// The result enables exactly the labels that are declared in `supported`
/// and still free on the vector. Free labels listed in `dynamic` are left to
/// the dynamic label lookup and do not appear in the result. Any other free
/// label is rejected.
pub fn introspect<V: VectorMetric>(
    vec: &CurriedVec<V>,
    supported: LabelSchema,
    dynamic: &[String],
) -> Result<LabelSchema> {
    let descs = vec.desc();
    if descs.len() != 1 {
        return Err(PromrpcError::MalformedDescriptor(descs.len()));
    }

    let mut effective = LabelSchema::empty();
    for label in vec.free_labels() {
        if dynamic.iter().any(|name| name == label) {
            continue;
        }
        if !supported.contains(label) {
            return Err(PromrpcError::UnsupportedLabel {
                metric: vec.name().to_string(),
                label: label.to_string(),
            });
        }
        effective.enable_name(label);
    }

    Ok(effective)
}

/// Maps a tag record onto the free label values of one vector.
///
/// Schema values come first in vocabulary order, then dynamic values in the
/// order the vector declares them. When the vector declares its free labels
/// in a different order, the values are permuted once per observation to
/// match it.
#[derive(Debug, Clone)]
pub(crate) struct Projection {
    schema: LabelSchema,
    dynamic: Vec<String>,
    order: Option<Vec<usize>>,
}

impl Projection {
    pub(crate) fn new<V: VectorMetric>(
        vec: &CurriedVec<V>,
        supported: LabelSchema,
        dynamic: &[String],
    ) -> Result<Self> {
        let schema = introspect(vec, supported, dynamic)?;
        let free = vec.free_labels();

        let dynamic: Vec<String> = free
            .iter()
            .filter(|label| dynamic.iter().any(|name| name == *label))
            .map(|label| label.to_string())
            .collect();

        let canonical: Vec<&str> = schema
            .labels()
            .into_iter()
            .chain(dynamic.iter().map(String::as_str))
            .collect();

        let order: Vec<usize> = free
            .iter()
            .filter_map(|label| canonical.iter().position(|name| name == label))
            .collect();
        let identity = order.iter().enumerate().all(|(i, pos)| i == *pos);

        Ok(Self {
            schema,
            dynamic,
            order: (!identity).then_some(order),
        })
    }

    pub(crate) fn schema(&self) -> LabelSchema {
        self.schema
    }

    /// Label values for one observation, in the vector's free label order.
    pub(crate) fn values<'a, S: LabelSource + ?Sized>(
        &'a self,
        source: &'a S,
        ctx: &'a Context,
    ) -> Vec<&'a str> {
        let mut values = self.schema.subset(source);

        if !self.dynamic.is_empty() {
            let provided = ctx.dynamic_label_values();
            values.extend(self.dynamic.iter().map(|name| {
                provided
                    .and_then(|provided| provided.get(name))
                    .unwrap_or_default()
            }));
        }

        match &self.order {
            Some(order) => order.iter().map(|pos| values[*pos]).collect(),
            None => values,
        }
    }
}
