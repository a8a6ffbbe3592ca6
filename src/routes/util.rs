//! Shared request parsing and fragment helpers for route handlers.

use std::str::FromStr;

/// Parse URL-encoded form body into key-value pairs.
/// Handles `key=value&key2=value2` format (from HTMX POST bodies).
pub fn parse_form_body(body: &str) -> Vec<(String, String)> {
    if body.is_empty() {
        return Vec::new();
    }
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, val) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(key), percent_decode(val))
        })
        .collect()
}

/// Percent-decode a URL-encoded value. Multi-byte UTF-8 sequences are
/// reassembled; malformed escapes are kept literally.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .and_then(|h| core::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                match hex {
                    Some(b) => {
                        out.push(b);
                        i += 3;
                        continue;
                    }
                    None => out.push(b'%'),
                }
            }
            b'+' => out.push(b' '),
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parse a query string into key-value pairs.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    let q = query.strip_prefix('?').unwrap_or(query);
    parse_form_body(q)
}

/// Helper to get a value by key from a list of key-value pairs.
pub fn get_param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Get and parse a numeric parameter. Missing or unparseable → `None`.
pub fn get_number<T: FromStr>(params: &[(String, String)], key: &str) -> Option<T> {
    get_param(params, key).and_then(|v| v.trim().parse().ok())
}

/// Escape text for HTML element content and double-quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Build an escaped `hx-vals` JSON object from key-value pairs.
fn hx_vals(vals: &[(&str, String)]) -> String {
    let map: serde_json::Map<String, serde_json::Value> = vals
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
        .collect();
    escape_html(&serde_json::Value::Object(map).to_string())
}

/// A button that POSTs `vals` to `path` and swaps the response into `target`.
pub fn hx_button(
    path: &str,
    target: &str,
    vals: &[(&str, String)],
    label: &str,
    class: &str,
    disabled: bool,
) -> String {
    format!(
        r#"<button hx-post="{}" hx-vals="{}" hx-target="{}" hx-swap="innerHTML" class="{}"{}>{}</button>"#,
        path,
        hx_vals(vals),
        target,
        class,
        if disabled { " disabled" } else { "" },
        label
    )
}

/// An invisible element that POSTs `vals` to `path` once, `delay_ms` after it
/// lands in the DOM. Replaced (and so cancelled) by any later swap.
pub fn hx_timer(path: &str, target: &str, vals: &[(&str, String)], delay_ms: u32) -> String {
    format!(
        r#"<div hidden hx-post="{}" hx-vals="{}" hx-trigger="load delay:{}ms" hx-target="{}" hx-swap="innerHTML"></div>"#,
        path,
        hx_vals(vals),
        delay_ms,
        target
    )
}

/// Inline error shown above a re-rendered screen.
pub fn error_banner(message: &str) -> String {
    format!(
        r#"<div role="alert" class="text-red-600 text-center mb-2">{}</div>"#,
        escape_html(message)
    )
}

/// Diagnostics comment carried by every rendered screen.
pub fn debug_comment(game: &str, detail: &str) -> String {
    format!("<!-- [hiking-games] {} {} -->", game, detail.replace("--", "- -"))
}
