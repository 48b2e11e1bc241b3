//! Strict record parser. All-or-nothing: any malformed segment, unknown
//! tag, value mismatch, or missing mandatory tag rejects the whole input
//! with a diagnostic tree; there is no partial or lenient mode.

use crate::error::{FailureNode, InvalidRecord};
use crate::grammar::{self, Tag, TagValue};
use crate::record::Record;

impl Record {
    /// Parse a raw DMARC TXT record string.
    ///
    /// The record must start with `v=DMARC1`, contain a `p=` tag, and
    /// every `tag=value` pair must match the grammar of a recognized tag.
    pub fn parse(raw: &str) -> Result<Self, InvalidRecord> {
        parse_record(raw)
    }
}

struct Segment<'a> {
    text: &'a str,
    offset: usize,
}

pub(crate) fn parse_record(raw: &str) -> Result<Record, InvalidRecord> {
    let segments = segments(raw);
    if segments.is_empty() {
        return Err(invalid(vec![FailureNode::leaf(
            format!("empty record, expected \"v={}\"", crate::types::Version::TOKEN),
            0,
        )]));
    }

    let mut record = Record::default();

    for (index, seg) in segments.iter().enumerate() {
        let Some(eq) = seg.text.find('=') else {
            return Err(invalid(vec![segment_failure(
                seg,
                FailureNode::leaf("expected \"tag=value\", no \"=\" found", seg.offset),
            )]));
        };
        let name = seg.text[..eq].trim_end();
        if name.is_empty() {
            return Err(invalid(vec![segment_failure(
                seg,
                FailureNode::leaf("empty tag name", seg.offset),
            )]));
        }
        let after_eq = &seg.text[eq + 1..];
        let value = after_eq.trim_start();
        let value_offset = seg.offset + eq + 1 + (after_eq.len() - value.len());

        // v= carries the version and is position-constrained: first, only.
        if index == 0 && !name.eq_ignore_ascii_case("v") {
            return Err(invalid(vec![segment_failure(
                seg,
                FailureNode::leaf(
                    format!("expected the version tag \"v\" first, found \"{}\"", name),
                    seg.offset,
                ),
            )]));
        }
        if index > 0 && name.eq_ignore_ascii_case("v") {
            return Err(invalid(vec![tag_failure(
                "v",
                seg.offset,
                FailureNode::leaf("the version tag may only appear first", seg.offset),
            )]));
        }

        let Some(tag) = Tag::from_name(name) else {
            return Err(invalid(vec![tag_failure(
                name,
                seg.offset,
                FailureNode::leaf("unrecognized tag name", seg.offset),
            )]));
        };

        match grammar::parse_value(tag, value, value_offset) {
            Ok(value) => apply(&mut record, tag, value),
            Err(node) => {
                return Err(invalid(vec![tag_failure(tag.name(), seg.offset, node)]));
            }
        }
    }

    if record.p.is_none() {
        return Err(invalid(vec![FailureNode::leaf(
            "missing required tag \"p\"",
            raw.len(),
        )]));
    }

    Ok(record)
}

/// Split on `;`, yielding trimmed non-empty segments with the byte offset
/// of each segment's first non-whitespace byte.
fn segments(raw: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut pos = 0;
    for part in raw.split(';') {
        let trimmed = part.trim();
        if !trimmed.is_empty() {
            let lead = part.len() - part.trim_start().len();
            out.push(Segment {
                text: trimmed,
                offset: pos + lead,
            });
        }
        pos += part.len() + 1;
    }
    out
}

/// Store a parsed value. Later occurrences of a tag overwrite earlier ones.
fn apply(record: &mut Record, tag: Tag, value: TagValue) {
    match (tag, value) {
        (Tag::V, TagValue::Version(v)) => record.v = Some(v),
        (Tag::P, TagValue::Policy(p)) => record.p = Some(p),
        (Tag::Sp, TagValue::Policy(p)) => record.sp = Some(p),
        (Tag::Adkim, TagValue::Alignment(a)) => record.adkim = Some(a),
        (Tag::Aspf, TagValue::Alignment(a)) => record.aspf = Some(a),
        (Tag::Fo, TagValue::FailureOptions(opts)) => record.fo = Some(opts),
        (Tag::Pct, TagValue::Percent(n)) => record.pct = Some(n),
        (Tag::Rf, TagValue::Format(rf)) => record.rf = Some(rf),
        (Tag::Ri, TagValue::Interval(n)) => record.ri = Some(n),
        (Tag::Rua, TagValue::Uris(uris)) => record.rua = Some(uris),
        (Tag::Ruf, TagValue::Uris(uris)) => record.ruf = Some(uris),
        (tag, value) => unreachable!("grammar returned {:?} for tag {:?}", value, tag),
    }
}

fn invalid(children: Vec<FailureNode>) -> InvalidRecord {
    InvalidRecord::new(FailureNode::branch("malformed DMARC record", 0, children))
}

fn segment_failure(seg: &Segment<'_>, cause: FailureNode) -> FailureNode {
    FailureNode::branch(
        format!("segment \"{}\"", seg.text),
        seg.offset,
        vec![cause],
    )
}

fn tag_failure(name: &str, offset: usize, cause: FailureNode) -> FailureNode {
    FailureNode::branch(format!("tag \"{}\"", name), offset, vec![cause])
}
