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

use std::fmt;

/// The fixed label vocabulary.
///
/// Variants are declared in alphabetical order of their names; [`Label::ALL`]
/// and every schema iteration rely on that order, so a new label must be
/// inserted at its alphabetical position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    ClientUserAgent,
    Code,
    IsFailFast,
    LocalAddr,
    Method,
    RemoteAddr,
    Service,
}

impl Label {
    pub const ALL: [Label; 7] = [
        Label::ClientUserAgent,
        Label::Code,
        Label::IsFailFast,
        Label::LocalAddr,
        Label::Method,
        Label::RemoteAddr,
        Label::Service,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Label::ClientUserAgent => "grpc_client_user_agent",
            Label::Code => "grpc_code",
            Label::IsFailFast => "grpc_is_fail_fast",
            Label::LocalAddr => "grpc_local_addr",
            Label::Method => "grpc_method",
            Label::RemoteAddr => "grpc_remote_addr",
            Label::Service => "grpc_service",
        }
    }

    pub fn from_name(name: &str) -> Option<Label> {
        Label::ALL.into_iter().find(|label| label.name() == name)
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tag record that can provide a value for any label of the vocabulary.
///
/// Labels the record does not carry (addresses on a call, codes on a
/// connection) resolve to an empty string.
pub trait LabelSource {
    fn label_value(&self, label: Label) -> &str;
}

/// Declares which labels of the vocabulary a metric concept uses.
///
/// A schema is a closed set of boolean flags, one per [`Label`]. It is the
/// only place label name literals come from: the ordered name list used to
/// build a vector ([`labels`](Self::labels)) and the ordered value list used
/// to observe it ([`subset`](Self::subset)) are produced by the same
/// iteration, so they always line up positionally.
///
/// # Example
///
/// ```
/// use promrpc_metrics::{Label, LabelSchema};
///
/// let schema = LabelSchema::of(&[Label::Service, Label::Method]);
/// assert_eq!(schema.labels(), vec!["grpc_method", "grpc_service"]);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LabelSchema {
    flags: u8,
}

impl LabelSchema {
    pub const fn empty() -> Self {
        Self { flags: 0 }
    }

    /// Builds a schema enabling exactly `labels`.
    pub const fn of(labels: &[Label]) -> Self {
        let mut flags = 0;
        let mut i = 0;
        while i < labels.len() {
            flags |= labels[i].bit();
            i += 1;
        }
        Self { flags }
    }

    pub const fn is_enabled(&self, label: Label) -> bool {
        self.flags & label.bit() != 0
    }

    pub fn enable(&mut self, label: Label) {
        self.flags |= label.bit();
    }

    pub const fn with(self, label: Label) -> Self {
        Self {
            flags: self.flags | label.bit(),
        }
    }

    /// Whether `name` belongs to the label vocabulary at all.
    pub fn is_known(&self, name: &str) -> bool {
        Label::from_name(name).is_some()
    }

    /// Whether `name` is a label this schema enables.
    pub fn contains(&self, name: &str) -> bool {
        Label::from_name(name).is_some_and(|label| self.is_enabled(label))
    }

    /// Enables the label called `name`; returns `false` for unknown names.
    pub fn enable_name(&mut self, name: &str) -> bool {
        match Label::from_name(name) {
            Some(label) => {
                self.enable(label);
                true
            }
            None => false,
        }
    }

    /// Whether every label enabled here is also enabled in `other`.
    pub const fn is_subset_of(&self, other: &LabelSchema) -> bool {
        self.flags & !other.flags == 0
    }

    pub const fn len(&self) -> usize {
        self.flags.count_ones() as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.flags == 0
    }

    /// Enabled labels in vocabulary order.
    pub fn iter(&self) -> impl Iterator<Item = Label> + '_ {
        Label::ALL
            .into_iter()
            .filter(move |label| self.is_enabled(*label))
    }

    /// Names of the enabled labels, in vocabulary order.
    pub fn labels(&self) -> Vec<&'static str> {
        self.iter().map(Label::name).collect()
    }

    /// Values of the enabled labels taken from `tag`, in the order of
    /// [`labels`](Self::labels).
    pub fn subset<'a, S: LabelSource + ?Sized>(&self, tag: &'a S) -> Vec<&'a str> {
        self.iter().map(|label| tag.label_value(label)).collect()
    }
}
