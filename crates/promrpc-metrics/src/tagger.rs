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

//! Tag records built once per call and per connection.

use crate::label::{Label, LabelSource};
use crate::useragent::NOT_AVAILABLE_YET;
use http::header::USER_AGENT;
use promrpc_common::{Code, ConnTagInfo, Context, RpcTagInfo};
use std::sync::Arc;

const UNKNOWN: &str = "unknown";

/// Labels of a call, fixed when the call is tagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTag {
    service: String,
    method: String,
    is_fail_fast: bool,
    client_user_agent: String,
}

impl CallTag {
    pub fn new(info: &RpcTagInfo, client_user_agent: impl Into<String>) -> Self {
        let (service, method) = split(&info.full_method_name);
        Self {
            service: service.to_string(),
            method: method.to_string(),
            is_fail_fast: info.fail_fast,
            client_user_agent: client_user_agent.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn is_fail_fast(&self) -> bool {
        self.is_fail_fast
    }

    /// User agent known at tagging time; only the server side can know it.
    pub fn client_user_agent(&self) -> &str {
        &self.client_user_agent
    }
}

impl LabelSource for CallTag {
    fn label_value(&self, label: Label) -> &str {
        match label {
            Label::ClientUserAgent => self.client_user_agent.as_str(),
            Label::IsFailFast => bool_str(self.is_fail_fast),
            Label::Method => self.method.as_str(),
            Label::Service => self.service.as_str(),
            Label::Code | Label::LocalAddr | Label::RemoteAddr => "",
        }
    }
}

/// Per-event view of a [`CallTag`] with the late-bound values applied.
///
/// The shared tag is never modified: the resolved user agent and the
/// terminal code only exist for the duration of one observation.
#[derive(Debug, Clone, Copy)]
pub struct CallLabels<'a> {
    pub tag: &'a CallTag,
    pub client_user_agent: &'a str,
    pub code: Option<Code>,
}

impl<'a> CallLabels<'a> {
    pub fn new(tag: &'a CallTag) -> Self {
        Self {
            tag,
            client_user_agent: tag.client_user_agent(),
            code: None,
        }
    }
}

impl LabelSource for CallLabels<'_> {
    fn label_value(&self, label: Label) -> &str {
        match label {
            Label::ClientUserAgent => self.client_user_agent,
            Label::Code => self.code.map(Code::as_str).unwrap_or_default(),
            other => self.tag.label_value(other),
        }
    }
}

/// Labels of a connection, fixed when the connection is tagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnTag {
    remote_addr: String,
    local_addr: String,
    client_user_agent: String,
}

impl ConnTag {
    pub fn new(info: &ConnTagInfo, client_user_agent: impl Into<String>) -> Self {
        Self {
            remote_addr: host(&info.remote_addr).to_string(),
            local_addr: info.local_addr.clone(),
            client_user_agent: client_user_agent.into(),
        }
    }

    /// Host part of the remote address.
    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    pub fn local_addr(&self) -> &str {
        &self.local_addr
    }

    pub fn client_user_agent(&self) -> &str {
        &self.client_user_agent
    }
}

impl LabelSource for ConnTag {
    fn label_value(&self, label: Label) -> &str {
        match label {
            Label::ClientUserAgent => self.client_user_agent.as_str(),
            Label::LocalAddr => self.local_addr.as_str(),
            Label::RemoteAddr => self.remote_addr.as_str(),
            Label::Code | Label::IsFailFast | Label::Method | Label::Service => "",
        }
    }
}

#[derive(Debug, Clone)]
struct TaggedCall(Arc<CallTag>);

#[derive(Debug, Clone)]
struct TaggedConn(Arc<ConnTag>);

/// Splits `/package.Service/Method` into its service and method parts.
///
/// Names without a `/` separator yield `("unknown", "unknown")`.
pub fn split(full_method_name: &str) -> (&str, &str) {
    let name = full_method_name
        .strip_prefix('/')
        .unwrap_or(full_method_name);
    name.rsplit_once('/').unwrap_or((UNKNOWN, UNKNOWN))
}

/// Builds the call tag and stores it in a copy of `ctx`.
pub fn tag_call(ctx: Context, info: &RpcTagInfo) -> Context {
    let user_agent = incoming_user_agent(&ctx).unwrap_or(NOT_AVAILABLE_YET);
    let tag = CallTag::new(info, user_agent);
    tracing::trace!(service = %tag.service, method = %tag.method, "call tagged");

    ctx.with_value(TaggedCall(Arc::new(tag)))
}

/// Builds the connection tag and stores it in a copy of `ctx`.
pub fn tag_conn(ctx: Context, info: &ConnTagInfo) -> Context {
    let user_agent = incoming_user_agent(&ctx).unwrap_or(NOT_AVAILABLE_YET);
    let tag = ConnTag::new(info, user_agent);

    ctx.with_value(TaggedConn(Arc::new(tag)))
}

/// The call tag stored by [`tag_call`], if any.
pub fn call_tag(ctx: &Context) -> Option<&CallTag> {
    ctx.value::<TaggedCall>().map(|tagged| tagged.0.as_ref())
}

/// The connection tag stored by [`tag_conn`], if any.
pub fn conn_tag(ctx: &Context) -> Option<&ConnTag> {
    ctx.value::<TaggedConn>().map(|tagged| tagged.0.as_ref())
}

fn incoming_user_agent(ctx: &Context) -> Option<&str> {
    let metadata = ctx.incoming_metadata()?;
    metadata.get(USER_AGENT)?.to_str().ok()
}

fn host(addr: &str) -> &str {
    match addr.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            if let Some(v6) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
                v6
            } else if host.is_empty() || host.contains(':') {
                // bare IPv6 address without a port
                addr
            } else {
                host
            }
        }
        _ => addr,
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, HeaderValue};

    #[test]
    fn test_split() {
        assert_eq!(split("/pkg.Service/Method"), ("pkg.Service", "Method"));
        assert_eq!(split("/Service/Method"), ("Service", "Method"));
        assert_eq!(split("pkg.Service/Method"), ("pkg.Service", "Method"));
        assert_eq!(split("no-separator"), ("unknown", "unknown"));
        assert_eq!(split(""), ("unknown", "unknown"));
    }

    #[test]
    fn test_host() {
        assert_eq!(host("10.0.0.1:50051"), "10.0.0.1");
        assert_eq!(host("[::1]:8080"), "::1");
        assert_eq!(host("localhost:8080"), "localhost");
        assert_eq!(host("::1"), "::1");
        assert_eq!(host("/var/run/app.sock"), "/var/run/app.sock");
    }

    #[test]
    fn test_tag_call() {
        let ctx = tag_call(Context::new(), &RpcTagInfo::new("/pkg.Service/Method", true));
        let tag = call_tag(&ctx).unwrap();

        assert_eq!(tag.service(), "pkg.Service");
        assert_eq!(tag.method(), "Method");
        assert!(tag.is_fail_fast());
        assert_eq!(tag.client_user_agent(), NOT_AVAILABLE_YET);
        assert_eq!(tag.label_value(Label::IsFailFast), "true");
        assert_eq!(tag.label_value(Label::Code), "");
    }

    #[test]
    fn test_tag_call_with_incoming_user_agent() {
        let mut md = HeaderMap::new();
        md.insert(USER_AGENT, HeaderValue::from_static("grpc-go/1.60"));

        let ctx = Context::new().with_incoming_metadata(md);
        let ctx = tag_call(ctx, &RpcTagInfo::new("/Service/Method", false));

        let tag = call_tag(&ctx).unwrap();
        assert_eq!(tag.client_user_agent(), "grpc-go/1.60");
        assert_eq!(tag.label_value(Label::IsFailFast), "false");
    }

    #[test]
    fn test_call_labels_view() {
        let tag = CallTag::new(&RpcTagInfo::new("/Service/Method", false), NOT_AVAILABLE_YET);
        let view = CallLabels {
            tag: &tag,
            client_user_agent: "resolved",
            code: Some(Code::NotFound),
        };

        assert_eq!(view.label_value(Label::ClientUserAgent), "resolved");
        assert_eq!(view.label_value(Label::Code), "NotFound");
        assert_eq!(view.label_value(Label::Method), "Method");
        // the shared tag keeps its original value
        assert_eq!(tag.client_user_agent(), NOT_AVAILABLE_YET);
    }

    #[test]
    fn test_tag_conn() {
        let info = ConnTagInfo::new("10.0.0.1:50051", "127.0.0.1:8080");
        let ctx = tag_conn(Context::new(), &info);
        let tag = conn_tag(&ctx).unwrap();

        assert_eq!(tag.remote_addr(), "10.0.0.1");
        assert_eq!(tag.local_addr(), "127.0.0.1:8080");
        assert_eq!(tag.client_user_agent(), NOT_AVAILABLE_YET);
        assert!(call_tag(&ctx).is_none());
    }
}
