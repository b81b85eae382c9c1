//! Path resolution against the mount table
//!
//! Longest-prefix match over whole path segments, with a carve-out for a
//! root mount so `/` behaves like a conventional document root for
//! top-level files.

use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tracing::warn;

/// Resolve a raw (percent-encoded) request path to a file location.
///
/// Returns `None` when the path cannot be decoded, no mount matches, or the
/// remainder would escape the matched mount's directory.
pub fn resolve(request_path: &str, mounts: &HashMap<String, PathBuf>) -> Option<PathBuf> {
    let decoded = decode_path(request_path)?;
    let segments: Vec<&str> = decoded.split('/').filter(|s| !s.is_empty()).collect();

    if let [only] = segments.as_slice() {
        if let Some(root) = mounts.get("/") {
            return join_contained(root, only, request_path);
        }
    }

    // Whole segments only: "/ab" can never match a request for "/abc".
    for depth in (1..=segments.len()).rev() {
        let candidate = format!("/{}", segments[..depth].join("/"));
        if let Some(dir) = mounts.get(&candidate) {
            let rest = remainder_after(&decoded, depth);
            return join_contained(dir, rest, request_path);
        }
    }

    None
}

/// Strip query/fragment and percent-decode. Invalid UTF-8 fails the decode.
fn decode_path(raw: &str) -> Option<String> {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    percent_decode_str(&raw[..end])
        .decode_utf8()
        .ok()
        .map(std::borrow::Cow::into_owned)
}

/// The verbatim part of `decoded` that follows its first `depth` segments.
fn remainder_after(decoded: &str, depth: usize) -> &str {
    let mut seen = 0;
    let mut in_segment = false;
    for (idx, ch) in decoded.char_indices() {
        if ch == '/' {
            if in_segment {
                in_segment = false;
                if seen == depth {
                    return &decoded[idx..];
                }
            }
        } else if !in_segment {
            in_segment = true;
            seen += 1;
        }
    }
    ""
}

/// Join `rest` under `base`, refusing anything but plain path components.
fn join_contained(base: &Path, rest: &str, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(rest.trim_start_matches('/'));
    let contained = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

    if contained {
        Some(base.join(relative))
    } else {
        warn!(path = request_path, "Path traversal attempt blocked");
        None
    }
}
