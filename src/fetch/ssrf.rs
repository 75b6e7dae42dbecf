//! SSRF-safe URL validation (spec.md §4.3).
//!
//! New module — the teacher had no equivalent (its scraper trusted
//! whatever URL it was given). This is load-bearing here because the core
//! loads attacker-influenced URLs (LLM picks, search results) and must not
//! be weaponized against internal services, so it gets the same
//! `anyhow`-free, fully-typed treatment as the rest of the fetch layer.

use std::net::IpAddr;
use url::Url;

const MAX_URL_LEN: usize = 2048;
const BLOCKED_TLDS: &[&str] = &[".local", ".internal", ".lan", ".localhost"];
const BLOCKED_PORTS: &[u16] = &[22, 23, 25, 3306, 5432, 6379, 11211, 27017];

/// Returns `true` iff `raw` is safe to navigate/scrape.
pub fn validate_url(raw: &str) -> bool {
    if raw.len() > MAX_URL_LEN {
        return false;
    }

    let Ok(url) = Url::parse(raw) else {
        return false;
    };

    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }

    let Some(host) = url.host_str() else {
        return false;
    };
    let host_lower = host.to_ascii_lowercase();

    if host_lower == "localhost" || host_lower == "0.0.0.0" || host_lower.starts_with("127.") {
        return false;
    }
    if BLOCKED_TLDS.iter().any(|tld| host_lower.ends_with(tld)) {
        return false;
    }

    if let Some(port) = url.port() {
        if BLOCKED_PORTS.contains(&port) {
            return false;
        }
    }

    if let Ok(ip) = host_lower.parse::<IpAddr>() {
        if is_unsafe_ip(ip) {
            return false;
        }
    }

    true
}

fn is_unsafe_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_unsafe_ipv4(v4),
        IpAddr::V6(v6) => {
            // IPv4-mapped IPv6 literals (`::ffff:127.0.0.1`) must be
            // unwrapped and re-checked against the V4 rules, or they sail
            // straight through every V6-only predicate below.
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_unsafe_ipv4(mapped);
            }
            v6.is_loopback() || v6.is_multicast() || v6.is_unspecified() || is_unique_local_v6(v6)
        }
    }
}

fn is_unsafe_ipv4(v4: std::net::Ipv4Addr) -> bool {
    v4.is_private()
        || v4.is_loopback()
        || v4.is_link_local()
        || v4.is_broadcast()
        || v4.is_documentation()
        || v4.is_multicast()
        || v4.is_unspecified()
        || is_reserved_v4(v4)
}

/// Class E and other reserved space (240.0.0.0/4), excluding the all-ones
/// broadcast address which `is_broadcast()` already rejects above.
fn is_reserved_v4(v4: std::net::Ipv4Addr) -> bool {
    v4.octets()[0] >= 240
}

fn is_unique_local_v6(v6: std::net::Ipv6Addr) -> bool {
    (v6.segments()[0] & 0xfe00) == 0xfc00
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_loopback_and_private_ips() {
        assert!(!validate_url("http://127.0.0.1:8080/"));
        assert!(!validate_url("http://127.0.0.1:6379/"));
        assert!(!validate_url("http://10.0.0.5/"));
        assert!(!validate_url("http://192.168.1.1/"));
        assert!(!validate_url("http://169.254.169.254/latest/meta-data"));
    }

    #[test]
    fn rejects_blocked_tlds_and_ports() {
        assert!(!validate_url("http://printer.local/"));
        assert!(!validate_url("http://db.internal/"));
        assert!(!validate_url("http://example.com:6379/"));
        assert!(!validate_url("http://example.com:5432/"));
    }

    #[test]
    fn rejects_bad_scheme_and_oversize() {
        assert!(!validate_url("ftp://example.com/file"));
        assert!(!validate_url("javascript:alert(1)"));
        let long = format!("http://example.com/{}", "a".repeat(3000));
        assert!(!validate_url(&long));
    }

    #[test]
    fn accepts_ordinary_public_urls() {
        assert!(validate_url("https://example.com/article"));
        assert!(validate_url("http://docs.rs/serde"));
    }

    #[test]
    fn rejects_ipv4_mapped_ipv6_bypass() {
        assert!(!validate_url("http://[::ffff:127.0.0.1]/"));
        assert!(!validate_url("http://[::ffff:169.254.169.254]/latest/meta-data"));
        assert!(!validate_url("http://[::ffff:10.0.0.5]/"));
    }

    #[test]
    fn rejects_reserved_ipv4_ranges() {
        assert!(!validate_url("http://240.0.0.1/"));
        assert!(!validate_url("http://255.0.0.1/"));
    }
}
