//! Per-tag value grammar: which tag names exist, what value syntax each
//! accepts, and the coercion into typed values. Failures come back as
//! `FailureNode`s localized to the offending byte offset.

use crate::error::FailureNode;
use crate::types::{AlignmentMode, FailureOption, Policy, ReportFormat, Version};
use crate::uri::ReportUri;

/// The closed set of recognized tag names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tag {
    V,
    P,
    Sp,
    Adkim,
    Aspf,
    Fo,
    Pct,
    Rf,
    Ri,
    Rua,
    Ruf,
}

impl Tag {
    /// Look up a tag by name, case-insensitively.
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "v" => Some(Tag::V),
            "p" => Some(Tag::P),
            "sp" => Some(Tag::Sp),
            "adkim" => Some(Tag::Adkim),
            "aspf" => Some(Tag::Aspf),
            "fo" => Some(Tag::Fo),
            "pct" => Some(Tag::Pct),
            "rf" => Some(Tag::Rf),
            "ri" => Some(Tag::Ri),
            "rua" => Some(Tag::Rua),
            "ruf" => Some(Tag::Ruf),
            _ => None,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Tag::V => "v",
            Tag::P => "p",
            Tag::Sp => "sp",
            Tag::Adkim => "adkim",
            Tag::Aspf => "aspf",
            Tag::Fo => "fo",
            Tag::Pct => "pct",
            Tag::Rf => "rf",
            Tag::Ri => "ri",
            Tag::Rua => "rua",
            Tag::Ruf => "ruf",
        }
    }
}

/// A tag value coerced to its typed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TagValue {
    Version(Version),
    Policy(Policy),
    Alignment(AlignmentMode),
    FailureOptions(Vec<FailureOption>),
    Percent(u8),
    Format(ReportFormat),
    Interval(u32),
    Uris(Vec<ReportUri>),
}

/// Apply a tag's value grammar. `offset` is the byte offset of `value`
/// within the original record string, used to localize failures.
pub(crate) fn parse_value(tag: Tag, value: &str, offset: usize) -> Result<TagValue, FailureNode> {
    match tag {
        Tag::V => Version::parse(value).map(TagValue::Version).ok_or_else(|| {
            FailureNode::leaf(
                format!(
                    "expected the literal \"{}\", found \"{}\"",
                    Version::TOKEN,
                    value
                ),
                offset,
            )
        }),
        Tag::P | Tag::Sp => Policy::parse(value).map(TagValue::Policy).ok_or_else(|| {
            FailureNode::leaf(
                format!(
                    "expected one of \"none\", \"quarantine\", \"reject\", found \"{}\"",
                    value
                ),
                offset,
            )
        }),
        Tag::Adkim | Tag::Aspf => AlignmentMode::parse(value)
            .map(TagValue::Alignment)
            .ok_or_else(|| {
                FailureNode::leaf(
                    format!("expected \"r\" or \"s\", found \"{}\"", value),
                    offset,
                )
            }),
        Tag::Fo => parse_failure_options(value, offset).map(TagValue::FailureOptions),
        Tag::Pct => parse_percent(value, offset).map(TagValue::Percent),
        Tag::Rf => ReportFormat::parse(value)
            .map(TagValue::Format)
            .ok_or_else(|| {
                FailureNode::leaf(format!("unknown report format \"{}\"", value), offset)
            }),
        Tag::Ri => parse_interval(value, offset).map(TagValue::Interval),
        Tag::Rua | Tag::Ruf => parse_uri_list(value, offset).map(TagValue::Uris),
    }
}

/// fo= value: colon-separated options, each one of 0 / 1 / d / s, order
/// preserved. The list must be non-empty and wholly valid.
fn parse_failure_options(value: &str, offset: usize) -> Result<Vec<FailureOption>, FailureNode> {
    if value.is_empty() {
        return Err(FailureNode::leaf("empty failure reporting options", offset));
    }

    let mut options = Vec::new();
    let mut bad = Vec::new();
    for (elem_offset, elem) in split_offsets(value, ':', offset) {
        match FailureOption::parse(elem) {
            Some(opt) => options.push(opt),
            None => bad.push(FailureNode::leaf(
                format!(
                    "invalid option \"{}\", expected one of \"0\", \"1\", \"d\", \"s\"",
                    elem
                ),
                elem_offset,
            )),
        }
    }

    if bad.is_empty() {
        Ok(options)
    } else {
        Err(FailureNode::branch(
            "failure reporting options",
            offset,
            bad,
        ))
    }
}

/// pct= value: plain non-negative decimal in 0..=100. No sign, no
/// whitespace, no other numeric forms.
fn parse_percent(value: &str, offset: usize) -> Result<u8, FailureNode> {
    let mismatch = || {
        FailureNode::leaf(
            format!(
                "expected an integer between 0 and 100, found \"{}\"",
                value
            ),
            offset,
        )
    };
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(mismatch());
    }
    match value.parse::<u32>() {
        Ok(n) if n <= 100 => Ok(n as u8),
        _ => Err(mismatch()),
    }
}

/// ri= value: plain non-negative decimal number of seconds.
fn parse_interval(value: &str, offset: usize) -> Result<u32, FailureNode> {
    let mismatch = || {
        FailureNode::leaf(
            format!("expected a non-negative integer, found \"{}\"", value),
            offset,
        )
    };
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(mismatch());
    }
    value.parse::<u32>().map_err(|_| mismatch())
}

/// rua=/ruf= value: comma-separated report URIs, surrounding whitespace
/// trimmed per element. Any malformed element fails the whole tag.
fn parse_uri_list(value: &str, offset: usize) -> Result<Vec<ReportUri>, FailureNode> {
    let mut uris = Vec::new();
    let mut bad = Vec::new();
    for (raw_offset, raw) in split_offsets(value, ',', offset) {
        let elem = raw.trim();
        let elem_offset = raw_offset + (raw.len() - raw.trim_start().len());
        if elem.is_empty() {
            bad.push(FailureNode::leaf("empty report URI", elem_offset));
            continue;
        }
        match ReportUri::parse(elem) {
            Ok(uri) => uris.push(uri),
            Err(err) => bad.push(FailureNode::leaf(
                format!("\"{}\": {}", elem, err),
                elem_offset,
            )),
        }
    }

    if !bad.is_empty() {
        return Err(FailureNode::branch("report URIs", offset, bad));
    }
    if uris.is_empty() {
        return Err(FailureNode::leaf("empty report URI list", offset));
    }
    Ok(uris)
}

/// Split on a separator, yielding each part with its byte offset relative
/// to the start of the original record string.
fn split_offsets<'a>(
    value: &'a str,
    sep: char,
    base: usize,
) -> impl Iterator<Item = (usize, &'a str)> {
    let mut pos = 0;
    value.split(sep).map(move |part| {
        let at = base + pos;
        pos += part.len() + sep.len_utf8();
        (at, part)
    })
}
