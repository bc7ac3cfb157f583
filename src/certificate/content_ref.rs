//! Content-address extraction from a record's `contentRef`
//!
//! Accepts, in priority order:
//! - content URIs: `ipfs://<cid>/...`, `ipns://<cid>`, any non-HTTP scheme
//! - gateway references: `https://host/ipfs/<cid>/...` or `https://<cid>.ipfs.host/...`
//! - a bare CID
//!
//! A candidate only counts if it parses as a CID; the first match wins.

use std::str::FromStr;

use cid::Cid;

fn parse_cid(candidate: &str) -> Option<String> {
    if candidate.is_empty() {
        return None;
    }
    Cid::from_str(candidate).ok().map(|cid| cid.to_string())
}

/// First path segment, without query or fragment
fn first_segment(s: &str) -> &str {
    s.split(['/', '?', '#']).next().unwrap_or("")
}

fn from_content_uri(reference: &str) -> Option<String> {
    let (scheme, rest) = reference.split_once("://")?;
    if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") {
        return None;
    }
    // tolerate the legacy `ipfs://ipfs/<cid>` form
    let rest = rest.strip_prefix("ipfs/").unwrap_or(rest);
    parse_cid(first_segment(rest))
}

fn from_gateway(reference: &str) -> Option<String> {
    if let Some(idx) = reference.find("/ipfs/") {
        if let Some(cid) = parse_cid(first_segment(&reference[idx + "/ipfs/".len()..])) {
            return Some(cid);
        }
    }

    let (_, rest) = reference.split_once("://")?;
    let host = first_segment(rest);
    let (label, _) = host.split_once(".ipfs.")?;
    parse_cid(label)
}

/// Extract the content identifier from a content reference, if any
pub fn extract_cid(content_ref: &str) -> Option<String> {
    let reference = content_ref.trim();
    from_content_uri(reference)
        .or_else(|| from_gateway(reference))
        .or_else(|| parse_cid(reference))
}
