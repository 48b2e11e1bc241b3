use std::fmt;

/// One node of a parse diagnostic tree: a grammar rule or input region that
/// failed, the byte offset it failed at, and the sub-failures beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureNode {
    pub label: String,
    pub offset: usize,
    pub children: Vec<FailureNode>,
}

impl FailureNode {
    pub fn leaf(label: impl Into<String>, offset: usize) -> Self {
        FailureNode {
            label: label.into(),
            offset,
            children: Vec::new(),
        }
    }

    pub fn branch(label: impl Into<String>, offset: usize, children: Vec<FailureNode>) -> Self {
        FailureNode {
            label: label.into(),
            offset,
            children,
        }
    }

    /// The first leaf reachable from this node. Identifies the innermost
    /// rule that failed.
    pub fn first_leaf(&self) -> &FailureNode {
        let mut node = self;
        while let Some(child) = node.children.first() {
            node = child;
        }
        node
    }

    fn render(&self, out: &mut String, prefix: &str) {
        for (i, child) in self.children.iter().enumerate() {
            let last = i + 1 == self.children.len();
            out.push_str(prefix);
            out.push_str(if last { "└─ " } else { "├─ " });
            out.push_str(&child.label);
            out.push_str(&format!(" (at byte {})", child.offset));
            out.push('\n');
            let deeper = format!("{}{}", prefix, if last { "   " } else { "│  " });
            child.render(out, &deeper);
        }
    }
}

/// Strict-parse failure. The input string is not a well-formed DMARC record;
/// `tree()` pinpoints the tag, rule, and byte offset that rejected it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRecord {
    root: FailureNode,
}

impl fmt::Display for InvalidRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let leaf = self.root.first_leaf();
        write!(
            f,
            "invalid DMARC record: {} (at byte {})",
            leaf.label, leaf.offset
        )
    }
}

impl std::error::Error for InvalidRecord {}

impl InvalidRecord {
    pub(crate) fn new(root: FailureNode) -> Self {
        InvalidRecord { root }
    }

    /// The structured diagnostic tree.
    pub fn tree(&self) -> &FailureNode {
        &self.root
    }

    /// Render the diagnostic tree for human inspection, one node per line
    /// with box-drawing branches.
    pub fn ascii_tree(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.root.label);
        out.push('\n');
        self.root.render(&mut out, "");
        out
    }
}
