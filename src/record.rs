//! The validated policy record. Stored attributes are optional; effective
//! values come from the accessor methods, which apply the tag defaults on
//! every read. `sp()` falls back to the stored `p`, so the subdomain
//! policy always tracks the requested policy when not set explicitly.

use std::fmt;

use crate::types::{AlignmentMode, FailureOption, Policy, ReportFormat, Version};
use crate::uri::ReportUri;

const DEFAULT_FO: &[FailureOption] = &[FailureOption::Zero];

/// A DMARC policy record.
///
/// Two ways in:
/// - [`Record::parse`] — the strict entry point; validates the tag-value
///   grammar and rejects anything malformed.
/// - a struct literal over the public fields — the permissive entry point
///   for callers that already hold typed values. No cross-tag validation
///   is performed there.
///
/// ```
/// use dmarc_record::{Policy, Record, Version};
///
/// let record = Record {
///     v: Some(Version::Dmarc1),
///     p: Some(Policy::Reject),
///     ..Record::default()
/// };
/// assert_eq!(record.sp(), Some(Policy::Reject));
/// assert_eq!(record.to_string(), "v=DMARC1; p=reject");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// Version (v= tag).
    pub v: Option<Version>,
    /// Requested policy (p= tag).
    pub p: Option<Policy>,
    /// Subdomain policy (sp= tag).
    pub sp: Option<Policy>,
    /// DKIM alignment mode (adkim= tag).
    pub adkim: Option<AlignmentMode>,
    /// SPF alignment mode (aspf= tag).
    pub aspf: Option<AlignmentMode>,
    /// Failure reporting options (fo= tag).
    pub fo: Option<Vec<FailureOption>>,
    /// Percentage of mail subject to the policy (pct= tag).
    pub pct: Option<u8>,
    /// Failure report format (rf= tag).
    pub rf: Option<ReportFormat>,
    /// Aggregate report interval in seconds (ri= tag).
    pub ri: Option<u32>,
    /// Aggregate report URIs (rua= tag).
    pub rua: Option<Vec<ReportUri>>,
    /// Failure report URIs (ruf= tag).
    pub ruf: Option<Vec<ReportUri>>,
}

impl Record {
    /// Stored version, if any.
    pub fn v(&self) -> Option<Version> {
        self.v
    }

    /// Stored requested policy, if any.
    pub fn p(&self) -> Option<Policy> {
        self.p
    }

    /// Effective subdomain policy: the stored sp, else the current stored p.
    /// Computed on every read, never cached.
    pub fn sp(&self) -> Option<Policy> {
        self.sp.or(self.p)
    }

    /// Effective DKIM alignment mode; relaxed by default.
    pub fn adkim(&self) -> AlignmentMode {
        self.adkim.unwrap_or(AlignmentMode::Relaxed)
    }

    /// Effective SPF alignment mode; relaxed by default.
    pub fn aspf(&self) -> AlignmentMode {
        self.aspf.unwrap_or(AlignmentMode::Relaxed)
    }

    /// Effective failure reporting options; `0` by default, never empty.
    pub fn fo(&self) -> &[FailureOption] {
        self.fo.as_deref().unwrap_or(DEFAULT_FO)
    }

    /// Effective percentage of mail subject to the policy; 100 by default.
    pub fn pct(&self) -> u8 {
        self.pct.unwrap_or(100)
    }

    /// Effective failure report format; afrf by default.
    pub fn rf(&self) -> ReportFormat {
        self.rf.unwrap_or(ReportFormat::Afrf)
    }

    /// Effective report interval in seconds; one day by default.
    pub fn ri(&self) -> u32 {
        self.ri.unwrap_or(86400)
    }

    /// Aggregate report URIs; empty when the tag is absent.
    pub fn rua(&self) -> &[ReportUri] {
        self.rua.as_deref().unwrap_or(&[])
    }

    /// Failure report URIs; empty when the tag is absent.
    pub fn ruf(&self) -> &[ReportUri] {
        self.ruf.as_deref().unwrap_or(&[])
    }
}

/// Canonical tag-value form: tags in the order v, p, sp, adkim, aspf, rua,
/// ruf, fo, pct, rf, ri; only explicitly stored tags are emitted; pairs
/// joined by `"; "` with no trailing separator.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pairs = Vec::new();
        if let Some(v) = self.v {
            pairs.push(format!("v={}", v));
        }
        if let Some(p) = self.p {
            pairs.push(format!("p={}", p));
        }
        if let Some(sp) = self.sp {
            pairs.push(format!("sp={}", sp));
        }
        if let Some(adkim) = self.adkim {
            pairs.push(format!("adkim={}", adkim));
        }
        if let Some(aspf) = self.aspf {
            pairs.push(format!("aspf={}", aspf));
        }
        if let Some(rua) = &self.rua {
            pairs.push(format!("rua={}", join(rua, ",")));
        }
        if let Some(ruf) = &self.ruf {
            pairs.push(format!("ruf={}", join(ruf, ",")));
        }
        if let Some(fo) = &self.fo {
            pairs.push(format!("fo={}", join(fo, ":")));
        }
        if let Some(pct) = self.pct {
            pairs.push(format!("pct={}", pct));
        }
        if let Some(rf) = self.rf {
            pairs.push(format!("rf={}", rf));
        }
        if let Some(ri) = self.ri {
            pairs.push(format!("ri={}", ri));
        }
        f.write_str(&pairs.join("; "))
    }
}

fn join<T: fmt::Display>(items: &[T], sep: &str) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_has_relaxed_dkim_alignment() {
        assert_eq!(Record::default().adkim(), AlignmentMode::Relaxed);
    }

    #[test]
    fn default_record_has_relaxed_spf_alignment() {
        assert_eq!(Record::default().aspf(), AlignmentMode::Relaxed);
    }

    #[test]
    fn default_record_reports_on_all_failing() {
        assert_eq!(Record::default().fo(), [FailureOption::Zero]);
    }

    #[test]
    fn default_record_applies_to_all_mail() {
        assert_eq!(Record::default().pct(), 100);
    }

    #[test]
    fn default_record_has_afrf_report_format() {
        assert_eq!(Record::default().rf(), ReportFormat::Afrf);
    }

    #[test]
    fn default_record_has_one_day_report_interval() {
        assert_eq!(Record::default().ri(), 86400);
    }

    #[test]
    fn direct_construction_assigns_fields() {
        let record = Record {
            v: Some(Version::Dmarc1),
            p: Some(Policy::None),
            adkim: Some(AlignmentMode::Relaxed),
            ..Record::default()
        };
        assert_eq!(record.v(), Some(Version::Dmarc1));
        assert_eq!(record.p(), Some(Policy::None));
        assert_eq!(record.adkim(), AlignmentMode::Relaxed);
    }

    #[test]
    fn sp_falls_back_to_p() {
        let record = Record {
            v: Some(Version::Dmarc1),
            p: Some(Policy::None),
            ..Record::default()
        };
        assert_eq!(record.sp(), Some(Policy::None));
    }

    #[test]
    fn sp_tracks_p_across_constructions() {
        for p in [Policy::None, Policy::Quarantine, Policy::Reject] {
            let record = Record {
                p: Some(p),
                ..Record::default()
            };
            assert_eq!(record.sp(), Some(p));
        }
    }

    #[test]
    fn explicit_sp_wins_over_p() {
        let record = Record {
            p: Some(Policy::Reject),
            sp: Some(Policy::None),
            ..Record::default()
        };
        assert_eq!(record.sp(), Some(Policy::None));
    }

    #[test]
    fn sp_of_empty_record_is_none() {
        assert_eq!(Record::default().sp(), None);
    }

    #[test]
    fn to_string_canonical_form() {
        let rua = ReportUri::parse("mailto:d@rua.agari.com").unwrap();
        let record = Record {
            v: Some(Version::Dmarc1),
            p: Some(Policy::Reject),
            rua: Some(vec![rua.clone()]),
            ruf: Some(vec![rua]),
            fo: Some(vec![
                FailureOption::Zero,
                FailureOption::One,
                FailureOption::D,
            ]),
            ..Record::default()
        };
        assert_eq!(
            record.to_string(),
            "v=DMARC1; p=reject; rua=mailto:d@rua.agari.com; ruf=mailto:d@rua.agari.com; fo=0:1:d"
        );
    }

    #[test]
    fn to_string_omits_defaulted_tags() {
        let record = Record {
            v: Some(Version::Dmarc1),
            p: Some(Policy::None),
            ..Record::default()
        };
        assert_eq!(record.to_string(), "v=DMARC1; p=none");
    }

    #[test]
    fn to_string_orders_all_tags_canonically() {
        let record = Record {
            v: Some(Version::Dmarc1),
            p: Some(Policy::Quarantine),
            sp: Some(Policy::None),
            adkim: Some(AlignmentMode::Strict),
            aspf: Some(AlignmentMode::Relaxed),
            fo: Some(vec![FailureOption::One]),
            pct: Some(25),
            rf: Some(ReportFormat::Afrf),
            ri: Some(3600),
            rua: Some(vec![ReportUri::parse("mailto:a@b.com").unwrap()]),
            ruf: Some(vec![ReportUri::parse("mailto:c@d.com").unwrap()]),
        };
        assert_eq!(
            record.to_string(),
            "v=DMARC1; p=quarantine; sp=none; adkim=s; aspf=r; \
             rua=mailto:a@b.com; ruf=mailto:c@d.com; fo=1; pct=25; rf=afrf; ri=3600"
        );
    }

    #[test]
    fn empty_record_serializes_to_empty_string() {
        assert_eq!(Record::default().to_string(), "");
    }

    #[test]
    fn uri_lists_join_with_comma() {
        let record = Record {
            v: Some(Version::Dmarc1),
            p: Some(Policy::None),
            rua: Some(vec![
                ReportUri::parse("mailto:a@b.com").unwrap(),
                ReportUri::parse("mailto:c@d.com!2048").unwrap(),
            ]),
            ..Record::default()
        };
        assert_eq!(
            record.to_string(),
            "v=DMARC1; p=none; rua=mailto:a@b.com,mailto:c@d.com!2048"
        );
    }
}
