//! Conditional and ranged responses for static content.
//!
//! # Responsibilities
//! - Infer `Content-Type` from the resource name, else from its first bytes
//! - Derive `Last-Modified` and `ETag` from the modification time and size
//! - Answer conditional requests (304 / 412)
//! - Serve a single byte range (206 / 416)
//!
//! # Design Decisions
//! - Validators use whole seconds, matching HTTP date resolution
//! - Multi-range requests get the full body rather than multipart output
//! - Nothing is written before the content is positioned, so a failing
//!   seek leaves the response untouched

use std::io::{self, Read, Seek, SeekFrom};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};

use crate::fs::provider::{Content, OpenFile};
use crate::http::context::ResponseWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Precondition {
    Proceed,
    NotModified,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteRange {
    Full,
    Partial { start: u64, end: u64 },
    Unsatisfiable,
}

/// Write `file` into `writer` as the reply to `request`.
///
/// `name` is only used to infer the content type.
pub fn serve_content(
    request: &Request<Bytes>,
    writer: &mut ResponseWriter,
    name: &str,
    mut file: OpenFile,
) -> io::Result<()> {
    let size = file.meta().len;
    let modified = file
        .meta()
        .modified
        .and_then(unix_secs)
        .filter(|secs| *secs > 0);
    let etag = modified.map(|secs| format!("\"{:x}-{:x}\"", secs, size));
    let headers = request.headers();

    match check_preconditions(headers, request.method(), modified, etag.as_deref()) {
        Precondition::NotModified => {
            if let Some(tag) = &etag {
                set_header(writer, header::ETAG, tag);
            } else if let Some(secs) = modified {
                set_header(writer, header::LAST_MODIFIED, &http_date(secs));
            }
            writer.write_header(StatusCode::NOT_MODIFIED);
            return Ok(());
        }
        Precondition::Failed => {
            writer.write_header(StatusCode::PRECONDITION_FAILED);
            return Ok(());
        }
        Precondition::Proceed => {}
    }

    let range = match headers.get(header::RANGE).and_then(|v| v.to_str().ok()) {
        Some(value) if if_range_matches(headers, modified, etag.as_deref()) => {
            parse_range(value, size)
        }
        _ => ByteRange::Full,
    };

    let (status, start, len) = match range {
        ByteRange::Full => (StatusCode::OK, 0, size),
        ByteRange::Partial { start, end } => (StatusCode::PARTIAL_CONTENT, start, end - start + 1),
        ByteRange::Unsatisfiable => {
            set_header(writer, header::CONTENT_RANGE, &format!("bytes */{}", size));
            writer.error(
                StatusCode::RANGE_NOT_SATISFIABLE,
                "invalid range: failed to overlap",
            );
            return Ok(());
        }
    };

    let content_type = match writer.headers().get(header::CONTENT_TYPE) {
        Some(_) => None,
        None => Some(match mime_guess::from_path(name).first_raw() {
            Some(mime) => mime.to_string(),
            None => sniff_content_type(file.content())?.to_string(),
        }),
    };

    file.content().seek(SeekFrom::Start(start))?;

    if let Some(secs) = modified {
        set_header(writer, header::LAST_MODIFIED, &http_date(secs));
    }
    if let Some(tag) = &etag {
        set_header(writer, header::ETAG, tag);
    }
    if let Some(mime) = content_type {
        set_header(writer, header::CONTENT_TYPE, &mime);
    }
    set_header(writer, header::ACCEPT_RANGES, "bytes");
    set_header(writer, header::CONTENT_LENGTH, &len.to_string());
    if status == StatusCode::PARTIAL_CONTENT {
        let end = start + len - 1;
        set_header(
            writer,
            header::CONTENT_RANGE,
            &format!("bytes {}-{}/{}", start, end, size),
        );
    }

    writer.write_header(status);
    if request.method() != Method::HEAD {
        let mut limited = file.content().take(len);
        io::copy(&mut limited, writer)?;
    }
    Ok(())
}

/// Bytes inspected when the name does not reveal the content type.
const SNIFF_LEN: u64 = 512;

const HTML_TAGS: [&[u8]; 17] = [
    b"<!DOCTYPE HTML", b"<HTML", b"<HEAD", b"<SCRIPT", b"<IFRAME", b"<H1", b"<DIV",
    b"<FONT", b"<TABLE", b"<A", b"<STYLE", b"<TITLE", b"<B", b"<BODY", b"<BR", b"<P",
    b"<!--",
];

const MAGIC: [(&[u8], &str); 8] = [
    (b"%PDF-", "application/pdf"),
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b\x08", "application/x-gzip"),
    (b"<?xml", "text/xml; charset=utf-8"),
];

/// Guess a content type from the leading bytes of `content`.
///
/// Recognizes HTML openers and a few binary signatures. Anything else is
/// `text/plain` unless it contains control bytes.
fn sniff_content_type(content: &mut dyn Content) -> io::Result<&'static str> {
    content.seek(SeekFrom::Start(0))?;
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    (&mut *content).take(SNIFF_LEN).read_to_end(&mut head)?;
    Ok(sniff(&head))
}

fn sniff(data: &[u8]) -> &'static str {
    let start = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0c' | b'\r' | b' '))
        .unwrap_or(data.len());
    let trimmed = &data[start..];

    for tag in HTML_TAGS {
        if trimmed.len() > tag.len()
            && trimmed[..tag.len()].eq_ignore_ascii_case(tag)
            && matches!(trimmed[tag.len()], b' ' | b'>')
        {
            return "text/html; charset=utf-8";
        }
    }
    for (magic, mime) in MAGIC {
        if data.starts_with(magic) {
            return mime;
        }
    }

    let binary = data
        .iter()
        .any(|b| matches!(b, 0x00..=0x08 | 0x0b | 0x0e..=0x1a | 0x1c..=0x1f));
    if binary {
        "application/octet-stream"
    } else {
        "text/plain; charset=utf-8"
    }
}

fn set_header(writer: &mut ResponseWriter, name: header::HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        writer.headers_mut().insert(name, value);
    }
}

fn unix_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

fn http_date(secs: u64) -> String {
    httpdate::fmt_http_date(UNIX_EPOCH + std::time::Duration::from_secs(secs))
}

fn header_date(headers: &HeaderMap, name: header::HeaderName) -> Option<u64> {
    let value = headers.get(name)?.to_str().ok()?;
    httpdate::parse_http_date(value).ok().and_then(unix_secs)
}

/// Whether any entry of a comma-separated ETag list matches `etag`.
///
/// `weak` allows `W/` prefixed entries to match.
fn etag_list_matches(list: &str, etag: &str, weak: bool) -> bool {
    list.split(',').map(str::trim).any(|candidate| {
        if candidate == "*" {
            return true;
        }
        match candidate.strip_prefix("W/") {
            Some(tag) => weak && tag == etag,
            None => candidate == etag,
        }
    })
}

fn check_preconditions(
    headers: &HeaderMap,
    method: &Method,
    modified: Option<u64>,
    etag: Option<&str>,
) -> Precondition {
    if let Some(list) = headers.get(header::IF_MATCH).and_then(|v| v.to_str().ok()) {
        let matched = match etag {
            Some(tag) => etag_list_matches(list, tag, false),
            None => list.trim() == "*",
        };
        if !matched {
            return Precondition::Failed;
        }
    } else if let (Some(since), Some(secs)) =
        (header_date(headers, header::IF_UNMODIFIED_SINCE), modified)
    {
        if secs > since {
            return Precondition::Failed;
        }
    }

    let is_read = method == Method::GET || method == Method::HEAD;

    if let Some(list) = headers.get(header::IF_NONE_MATCH).and_then(|v| v.to_str().ok()) {
        let matched = match etag {
            Some(tag) => etag_list_matches(list, tag, true),
            None => list.trim() == "*",
        };
        if matched {
            return if is_read {
                Precondition::NotModified
            } else {
                Precondition::Failed
            };
        }
    } else if is_read {
        if let (Some(since), Some(secs)) =
            (header_date(headers, header::IF_MODIFIED_SINCE), modified)
        {
            if secs <= since {
                return Precondition::NotModified;
            }
        }
    }

    Precondition::Proceed
}

fn if_range_matches(headers: &HeaderMap, modified: Option<u64>, etag: Option<&str>) -> bool {
    let Some(value) = headers.get(header::IF_RANGE).and_then(|v| v.to_str().ok()) else {
        return true;
    };

    let value = value.trim();
    if value.starts_with('"') || value.starts_with("W/") {
        return etag.is_some_and(|tag| value == tag);
    }

    match (httpdate::parse_http_date(value).ok().and_then(unix_secs), modified) {
        (Some(date), Some(secs)) => date == secs,
        _ => false,
    }
}

fn parse_range(value: &str, size: u64) -> ByteRange {
    let Some(specs) = value.trim().strip_prefix("bytes=") else {
        return ByteRange::Unsatisfiable;
    };

    let specs: Vec<&str> = specs
        .split(',')
        .map(str::trim)
        .filter(|spec| !spec.is_empty())
        .collect();

    match specs.as_slice() {
        [spec] => parse_range_spec(spec, size),
        [] => ByteRange::Unsatisfiable,
        _ => ByteRange::Full,
    }
}

fn parse_range_spec(spec: &str, size: u64) -> ByteRange {
    let Some((first, last)) = spec.split_once('-') else {
        return ByteRange::Unsatisfiable;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        // suffix range: the last N bytes
        return match last.parse::<u64>() {
            Ok(0) | Err(_) => ByteRange::Unsatisfiable,
            Ok(_) if size == 0 => ByteRange::Unsatisfiable,
            Ok(n) => ByteRange::Partial {
                start: size.saturating_sub(n),
                end: size - 1,
            },
        };
    }

    let Ok(start) = first.parse::<u64>() else {
        return ByteRange::Unsatisfiable;
    };
    if start >= size {
        return ByteRange::Unsatisfiable;
    }

    let end = if last.is_empty() {
        size - 1
    } else {
        match last.parse::<u64>() {
            Ok(end) if end >= start => end.min(size - 1),
            _ => return ByteRange::Unsatisfiable,
        }
    };

    ByteRange::Partial { start, end }
}
