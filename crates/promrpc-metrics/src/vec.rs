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

//! Metric vectors with pre-bound ("curried") labels.

use crate::error::{PromrpcError, Result};
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{
    Counter, CounterVec, Gauge, GaugeVec, Histogram, HistogramVec, IntCounter, IntCounterVec,
    IntGauge, IntGaugeVec,
};

/// A labelled prometheus vector that can hand out its child metrics.
pub trait VectorMetric: Collector + Clone + 'static {
    type Metric;

    /// Returns the child for `values`, given in variable label order.
    fn metric_with(&self, values: &[&str]) -> prometheus::Result<Self::Metric>;
}

macro_rules! impl_vector_metric {
    ($($vec:ty => $metric:ty),* $(,)?) => {
        $(
            impl VectorMetric for $vec {
                type Metric = $metric;

                fn metric_with(&self, values: &[&str]) -> prometheus::Result<Self::Metric> {
                    self.get_metric_with_label_values(values)
                }
            }
        )*
    };
}

impl_vector_metric!(
    IntCounterVec => IntCounter,
    CounterVec => Counter,
    IntGaugeVec => IntGauge,
    GaugeVec => Gauge,
    HistogramVec => Histogram,
);

/// A prometheus vector plus a set of label values bound ahead of time.
///
/// Curried labels keep their place in the exported series but are no longer
/// supplied at observation time: callers pass values for the
/// [`free_labels`](Self::free_labels) only, in the order they are listed.
///
/// # Example
///
/// ```
/// use prometheus::{IntCounterVec, Opts};
/// use promrpc_metrics::CurriedVec;
///
/// let vec = IntCounterVec::new(Opts::new("calls", "calls"), &["method", "service"])?;
/// let curried = CurriedVec::new(vec).curry_with(&[("service", "Greeter")])?;
///
/// assert_eq!(curried.free_labels(), vec!["method"]);
/// curried.get_metric_with(&["SayHello"])?.inc();
/// # Ok::<(), promrpc_metrics::PromrpcError>(())
/// ```
#[derive(Clone)]
pub struct CurriedVec<V> {
    inner: V,
    name: String,
    labels: Vec<(String, Option<String>)>,
}

impl<V: VectorMetric> CurriedVec<V> {
    /// Wraps `inner` with nothing curried.
    pub fn new(inner: V) -> Self {
        let (name, labels) = match inner.desc().first() {
            Some(desc) => (
                desc.fq_name.clone(),
                desc.variable_labels
                    .iter()
                    .map(|label| (label.clone(), None))
                    .collect(),
            ),
            None => (String::new(), Vec::new()),
        };

        Self {
            inner,
            name,
            labels,
        }
    }

    /// Binds values to some of the free labels.
    ///
    /// Fails if a label is not a variable label of the vector or was curried
    /// before.
    pub fn curry_with(mut self, bindings: &[(&str, &str)]) -> Result<Self> {
        for (label, value) in bindings {
            let slot = self
                .labels
                .iter_mut()
                .find(|(name, _)| name == label)
                .ok_or_else(|| PromrpcError::UnknownLabel {
                    metric: self.name.clone(),
                    label: label.to_string(),
                })?;

            if slot.1.is_some() {
                return Err(PromrpcError::AlreadyCurried {
                    metric: self.name.clone(),
                    label: label.to_string(),
                });
            }
            slot.1 = Some(value.to_string());
        }
        Ok(self)
    }

    pub fn inner(&self) -> &V {
        &self.inner
    }

    /// Fully qualified name of the wrapped vector.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variable labels still expecting a value, in declaration order.
    pub fn free_labels(&self) -> Vec<&str> {
        self.labels
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Curried labels with their bound values, in declaration order.
    pub fn curried_labels(&self) -> Vec<(&str, &str)> {
        self.labels
            .iter()
            .filter_map(|(name, value)| value.as_deref().map(|v| (name.as_str(), v)))
            .collect()
    }

    /// Returns the child for the given free label values.
    pub fn get_metric_with(&self, free: &[&str]) -> Result<V::Metric> {
        let expected = self.labels.iter().filter(|(_, v)| v.is_none()).count();
        if free.len() != expected {
            return Err(PromrpcError::Cardinality {
                expected,
                got: free.len(),
            });
        }

        let mut free = free.iter();
        let values: Vec<&str> = self
            .labels
            .iter()
            .map(|(_, curried)| match curried {
                Some(value) => value.as_str(),
                None => free.next().copied().unwrap_or_default(),
            })
            .collect();

        Ok(self.inner.metric_with(&values)?)
    }

    /// Like [`get_metric_with`](Self::get_metric_with), but panics on a
    /// cardinality mismatch the same way prometheus `with_label_values` does.
    pub fn with_label_values(&self, free: &[&str]) -> V::Metric {
        match self.get_metric_with(free) {
            Ok(metric) => metric,
            Err(err) => panic!("{}", err),
        }
    }
}

impl<V: VectorMetric> From<V> for CurriedVec<V> {
    fn from(inner: V) -> Self {
        Self::new(inner)
    }
}

impl<V: VectorMetric> Collector for CurriedVec<V> {
    fn desc(&self) -> Vec<&Desc> {
        self.inner.desc()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.inner.collect()
    }
}
