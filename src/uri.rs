use std::fmt;

use thiserror::Error;
use url::Url;

/// A report destination: an absolute URI with an optional maximum report
/// size, written as `<uri>!<digits>[kmgt]` in rua= and ruf= tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportUri {
    /// Destination URI. In practice a mailto: address, but any absolute
    /// URI is accepted.
    pub uri: Url,
    /// Maximum report size in bytes, from the `!` suffix.
    pub max_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportUriError {
    #[error("not a valid URI: {0}")]
    InvalidUri(#[from] url::ParseError),
    #[error("invalid size limit \"{0}\"")]
    InvalidSizeLimit(String),
}

impl ReportUri {
    /// Parse a single report URI element. A `!` introduces the size limit;
    /// everything after the last `!` must then be a well-formed size token.
    pub fn parse(s: &str) -> Result<Self, ReportUriError> {
        let (uri_part, max_size) = match s.rfind('!') {
            Some(pos) => {
                let size = parse_size(&s[pos + 1..])
                    .ok_or_else(|| ReportUriError::InvalidSizeLimit(s[pos + 1..].to_string()))?;
                (&s[..pos], Some(size))
            }
            None => (s, None),
        };

        let uri = Url::parse(uri_part)?;
        Ok(ReportUri { uri, max_size })
    }

    /// Convenience constructor without a size limit.
    pub fn new(uri: Url) -> Self {
        ReportUri { uri, max_size: None }
    }
}

impl fmt::Display for ReportUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri)?;
        if let Some(size) = self.max_size {
            write!(f, "!{}", size)?;
        }
        Ok(())
    }
}

/// Parse a size token: decimal digits with an optional binary unit suffix
/// (k, m, g, t — case-insensitive).
fn parse_size(s: &str) -> Option<u64> {
    let (digits, shift) = match s.as_bytes().last()? {
        b'k' | b'K' => (&s[..s.len() - 1], 10),
        b'm' | b'M' => (&s[..s.len() - 1], 20),
        b'g' | b'G' => (&s[..s.len() - 1], 30),
        b't' | b'T' => (&s[..s.len() - 1], 40),
        _ => (s, 0),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: u64 = digits.parse().ok()?;
    n.checked_shl(shift).filter(|v| v >> shift == n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mailto_without_size() {
        let uri = ReportUri::parse("mailto:dmarc@example.com").unwrap();
        assert_eq!(uri.uri.as_str(), "mailto:dmarc@example.com");
        assert!(uri.max_size.is_none());
    }

    #[test]
    fn mailto_with_kilobyte_size() {
        let uri = ReportUri::parse("mailto:dmarc@example.com!100k").unwrap();
        assert_eq!(uri.max_size, Some(100 * 1024));
    }

    #[test]
    fn mailto_with_megabyte_size() {
        let uri = ReportUri::parse("mailto:dmarc@example.com!10m").unwrap();
        assert_eq!(uri.max_size, Some(10 * 1024 * 1024));
    }

    #[test]
    fn size_units_are_case_insensitive() {
        assert_eq!(
            ReportUri::parse("mailto:a@b.com!10K").unwrap().max_size,
            Some(10 * 1024)
        );
        assert_eq!(
            ReportUri::parse("mailto:a@b.com!2G").unwrap().max_size,
            Some(2 * 1024 * 1024 * 1024)
        );
        assert_eq!(
            ReportUri::parse("mailto:a@b.com!1t").unwrap().max_size,
            Some(1024u64 * 1024 * 1024 * 1024)
        );
    }

    #[test]
    fn bare_byte_size() {
        let uri = ReportUri::parse("mailto:a@b.com!5000").unwrap();
        assert_eq!(uri.max_size, Some(5000));
    }

    #[test]
    fn empty_size_suffix_rejected() {
        let err = ReportUri::parse("mailto:a@b.com!").unwrap_err();
        assert!(matches!(err, ReportUriError::InvalidSizeLimit(_)));
    }

    #[test]
    fn non_numeric_size_rejected() {
        let err = ReportUri::parse("mailto:a@b.com!big").unwrap_err();
        assert!(matches!(err, ReportUriError::InvalidSizeLimit(_)));
    }

    #[test]
    fn relative_uri_rejected() {
        let err = ReportUri::parse("dmarc@example.com").unwrap_err();
        assert!(matches!(err, ReportUriError::InvalidUri(_)));
    }

    #[test]
    fn https_uri_accepted() {
        let uri = ReportUri::parse("https://example.com/report").unwrap();
        assert_eq!(uri.uri.scheme(), "https");
    }

    #[test]
    fn display_without_size() {
        let uri = ReportUri::parse("mailto:d@rua.agari.com").unwrap();
        assert_eq!(uri.to_string(), "mailto:d@rua.agari.com");
    }

    #[test]
    fn display_renders_size_in_bytes() {
        let uri = ReportUri::parse("mailto:a@b.com!1k").unwrap();
        assert_eq!(uri.to_string(), "mailto:a@b.com!1024");
    }

    #[test]
    fn display_round_trips() {
        let uri = ReportUri::parse("mailto:a@b.com!2048").unwrap();
        assert_eq!(ReportUri::parse(&uri.to_string()).unwrap(), uri);
    }
}
