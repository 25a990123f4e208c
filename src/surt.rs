//! SURT url keys used to sort the index.

use url::{Host, Url};

/// Canonical sort key for `url`: `http://www.Example.com:80/A?b=2&a=1` becomes
/// `com,example)/a?a=1&b=2`.
///
/// Anything that is not an absolute http(s) URL is lowercased verbatim, with
/// whitespace percent-encoded so the key stays a single index field.
#[must_use]
pub fn urlkey(url: &str) -> String {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return verbatim_key(url);
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return verbatim_key(url);
    }
    let Some(host) = parsed.host() else {
        return verbatim_key(url);
    };

    let mut key = match host {
        Host::Domain(domain) => reverse_domain(domain),
        Host::Ipv4(addr) => addr.to_string(),
        Host::Ipv6(addr) => format!("[{addr}]"),
    };
    // `Url` already reports `None` for the scheme's default port.
    if let Some(port) = parsed.port() {
        key.push(':');
        key.push_str(&port.to_string());
    }
    key.push(')');
    key.push_str(parsed.path());
    if let Some(query) = parsed.query().filter(|q| !q.is_empty()) {
        let mut params: Vec<&str> = query.split('&').filter(|p| !p.is_empty()).collect();
        params.sort_unstable();
        key.push('?');
        key.push_str(&params.join("&"));
    }
    key.to_lowercase()
}

fn verbatim_key(url: &str) -> String {
    let mut key = String::with_capacity(url.len());
    for ch in url.trim().to_lowercase().chars() {
        if ch.is_whitespace() {
            let mut buf = [0u8; 4];
            for byte in ch.encode_utf8(&mut buf).bytes() {
                key.push_str(&format!("%{byte:02x}"));
            }
        } else {
            key.push(ch);
        }
    }
    key
}

fn reverse_domain(domain: &str) -> String {
    let domain = domain.trim_end_matches('.').to_lowercase();
    let domain = strip_www(&domain);
    let mut labels: Vec<&str> = domain.split('.').collect();
    labels.reverse();
    labels.join(",")
}

/// Drop a leading `www.`, `www1.`, `www2.` label.
fn strip_www(domain: &str) -> &str {
    if let Some(rest) = domain.strip_prefix("www") {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if let Some(tail) = rest[digits..].strip_prefix('.') {
            if !tail.is_empty() {
                return tail;
            }
        }
    }
    domain
}
