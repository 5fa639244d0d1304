// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply template rendering.
//!
//! Templates carry `{placeholder}` tokens from a closed set:
//!
//! | token      | field            |
//! |------------|------------------|
//! | `{매장명}` | store name       |
//! | `{플랫폼}` | platform         |
//! | `{고객명}` | customer name    |
//! | `{메뉴}`   | subject / menu   |
//!
//! Any other `{...}` run is copied through untouched.

use replyd_core::types::ReplyContext;

/// Values substituted into a template. `None` renders as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateFields {
    pub store_name: Option<String>,
    pub platform: Option<String>,
    pub customer_name: Option<String>,
    pub subject: Option<String>,
}

impl TemplateFields {
    fn lookup(&self, key: &str) -> Option<&str> {
        let value = match key {
            "매장명" => &self.store_name,
            "플랫폼" => &self.platform,
            "고객명" => &self.customer_name,
            "메뉴" => &self.subject,
            _ => return None,
        };
        Some(value.as_deref().unwrap_or(""))
    }
}

impl From<&ReplyContext> for TemplateFields {
    fn from(ctx: &ReplyContext) -> Self {
        Self {
            store_name: ctx.store_name.clone(),
            platform: ctx.platform.clone(),
            customer_name: Some(ctx.customer_name.clone()),
            subject: Some(ctx.subject.clone()),
        }
    }
}

/// Render `body` with `fields`.
///
/// Substitution is a single left-to-right pass, so a substituted value that
/// itself looks like a placeholder is never expanded again.
pub fn render(body: &str, fields: &TemplateFields) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        // A later '{' before the '}' means this one cannot open a known token.
        let token = after
            .find(['{', '}'])
            .filter(|&i| after[i..].starts_with('}'))
            .and_then(|close| fields.lookup(&after[..close]).map(|v| (close, v)));

        match token {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
