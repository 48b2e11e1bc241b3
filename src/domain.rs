/// Normalize a domain: lowercase + strip trailing dot.
pub fn normalize(domain: &str) -> String {
    let d = domain.to_ascii_lowercase();
    d.strip_suffix('.').unwrap_or(&d).to_string()
}

/// The DNS name a domain's DMARC policy is published at.
pub fn lookup_name(domain: &str) -> String {
    format!("_dmarc.{}", normalize(domain))
}
