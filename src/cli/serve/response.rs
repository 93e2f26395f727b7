//! HTTP response handlers.

use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::embed::serve::{HOTRELOAD_JS, HotreloadVars, script_tag};
use crate::utils::mime;

/// Respond with a staged file, injecting the live-reload client into HTML.
pub fn respond_file(request: Request, path: &Path, ws_port: Option<u16>) -> Result<()> {
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }
    if let Some(range) = range_header(&request) {
        return respond_range(request, path, content_type, &range);
    }

    let body = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let body = maybe_inject_hotreload(body, content_type, ws_port);
    send_body(request, 200, content_type, body)
}

/// 206 Partial Content for media seeking, streamed from disk.
fn respond_range(
    request: Request,
    path: &Path,
    content_type: &'static str,
    range: &str,
) -> Result<()> {
    let file_size = fs::metadata(path)?.len();
    let Some((start, end)) = parse_range(range, file_size) else {
        let response = Response::empty(StatusCode(416))
            .with_header(header("Content-Range", &format!("bytes */{file_size}"))?);
        request.respond(response)?;
        return Ok(());
    };
    let length = end - start + 1;

    let mut file = fs::File::open(path)?;
    file.seek(SeekFrom::Start(start))?;

    let response = Response::new(
        StatusCode(206),
        vec![
            header("Content-Type", content_type)?,
            header("Content-Range", &format!("bytes {start}-{end}/{file_size}"))?,
            header("Accept-Ranges", "bytes")?,
        ],
        file.take(length),
        usize::try_from(length).ok(),
        None,
    );
    request.respond(response)?;
    Ok(())
}

/// Parse `bytes=start-end` into an inclusive byte range within the file.
fn parse_range(range: &str, file_size: u64) -> Option<(u64, u64)> {
    let spec = range.trim().strip_prefix("bytes=")?;
    let (start, end) = spec.split_once('-')?;
    let last = file_size.checked_sub(1)?;

    let (start, end) = match (start.trim(), end.trim()) {
        ("", suffix) => {
            let suffix: u64 = suffix.parse().ok()?;
            (file_size.saturating_sub(suffix), last)
        }
        (start, "") => (start.parse().ok()?, last),
        (start, end) => (start.parse().ok()?, end.parse::<u64>().ok()?.min(last)),
    };
    (start <= end).then_some((start, end))
}

fn range_header(request: &Request) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Range"))
        .map(|h| h.value.to_string())
}

/// 301 to `location` (directory without trailing slash).
pub fn respond_redirect(request: Request, location: &str) -> Result<()> {
    let response = Response::empty(StatusCode(301)).with_header(header("Location", location)?);
    request.respond(response)?;
    Ok(())
}

/// Respond with 404: the staging tree's own `404.html` when present.
pub fn respond_not_found(request: Request, root: &Path, ws_port: Option<u16>) -> Result<()> {
    let custom = root.join("404.html");
    if is_head_request(&request) {
        return send_head(request, 404, mime::PLAIN);
    }
    if let Ok(body) = fs::read(&custom) {
        let body = maybe_inject_hotreload(body, mime::HTML, ws_port);
        return send_body(request, 404, mime::HTML, body);
    }
    send_body(request, 404, mime::PLAIN, b"404 Not Found".to_vec())
}

/// 503 while shutting down.
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, mime::PLAIN, b"503 Service Unavailable".to_vec())
}

/// The live-reload client, rendered for the bound WebSocket port.
pub fn respond_hotreload_js(request: Request, ws_port: u16) -> Result<()> {
    let body = HOTRELOAD_JS.render(&HotreloadVars { ws_port });
    send_body(request, 200, mime::JAVASCRIPT, body.into_bytes())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response = Response::empty(StatusCode(status))
        .with_header(header("Content-Type", content_type)?)
        .with_header(header("Cache-Control", "no-store")?);
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(header("Content-Type", content_type)?)
        .with_header(header("Cache-Control", "no-store")?);
    request.respond(response)?;
    Ok(())
}

fn header(key: &str, value: &str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow::anyhow!("invalid header {key}: {value}"))
}

/// Inject the client into HTML bodies when live reload is up.
fn maybe_inject_hotreload(body: Vec<u8>, content_type: &str, ws_port: Option<u16>) -> Vec<u8> {
    match ws_port {
        Some(_) if content_type.starts_with("text/html") => inject_before_body_end(&body, &script_tag()),
        _ => body,
    }
}

/// Insert `snippet` before the last `</body>`, or append when there is none.
fn inject_before_body_end(content: &[u8], snippet: &str) -> Vec<u8> {
    const PATTERN: &[u8] = b"</body>";

    let pos = content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
        .unwrap_or(content.len());

    let mut result = Vec::with_capacity(content.len() + snippet.len());
    result.extend_from_slice(&content[..pos]);
    result.extend_from_slice(snippet.as_bytes());
    result.extend_from_slice(&content[pos..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_before_last_body_end() {
        let html = b"<html><body><p>x</p></BODY></html>";
        let out = inject_before_body_end(html, "<script></script>");
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<html><body><p>x</p><script></script></BODY></html>"
        );
    }

    #[test]
    fn test_inject_appends_without_body() {
        let out = inject_before_body_end(b"<p>fragment</p>", "<s/>");
        assert_eq!(out, b"<p>fragment</p><s/>");
    }

    #[test]
    fn test_only_html_injected() {
        let css = b"a{}".to_vec();
        assert_eq!(maybe_inject_hotreload(css.clone(), mime::CSS, Some(35729)), css);
        let html = b"<body></body>".to_vec();
        assert_eq!(maybe_inject_hotreload(html.clone(), mime::HTML, None), html);
        assert_ne!(maybe_inject_hotreload(html.clone(), mime::HTML, Some(35729)), html);
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("bytes=0-499", 1000), Some((0, 499)));
        assert_eq!(parse_range("bytes=500-", 1000), Some((500, 999)));
        assert_eq!(parse_range("bytes=-200", 1000), Some((800, 999)));
        assert_eq!(parse_range("bytes=0-5000", 1000), Some((0, 999)));
        assert_eq!(parse_range("bytes=900-100", 1000), None);
        assert_eq!(parse_range("bytes=0-1", 0), None);
        assert_eq!(parse_range("items=0-1", 1000), None);
    }
}
