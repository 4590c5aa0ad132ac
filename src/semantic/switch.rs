//! Per-switch bookkeeping for case-label validation.
//!
//! A [`SwitchContext`] is created lazily the first time the analyzer reaches
//! a Switch node and lives for the rest of the run. It caches the switch
//! subject's inferred type from the first visit (later fixed-point visits
//! may see a widened subject, but labels are judged against what the switch
//! dispatches on) and tracks which label values have been seen so duplicates
//! can be reported at their second occurrence.
//!
//! Label keys are tag-qualified (`int:1` vs `str:1`), so an integer label
//! and a string label that happen to print alike never collide.
//!
//! Case nodes are scanned once per pass: a node revisited during the
//! fixed-point loop skips recording, otherwise it would collide with its own
//! labels. The label scratch is cleared before the diagnostic pass so every
//! duplicate is reported exactly once there.

use crate::ast::Span;
use crate::cfg::NodeId;
use crate::semantic::types::TypeTag;
use crate::semantic::value::{ScrData, ScrValue};
use rustc_hash::{FxHashMap, FxHashSet};

/// Builds the tag-qualified duplicate-detection key for a case label, or
/// `None` when the label's value is not statically known.
pub fn case_key(data: &ScrData) -> Option<String> {
    let value = data.value.as_ref()?;
    let key = match value {
        ScrValue::Int(i) => format!("int:{i}"),
        ScrValue::Bool(b) => format!("bool:{b}"),
        ScrValue::Float(f) => format!("float:{f}"),
        ScrValue::String(s) if data.tag.contains(TypeTag::HASH) => {
            format!("hash:{}", s.to_lowercase())
        }
        ScrValue::String(s) if data.tag == TypeTag::ISTRING => format!("istr:{s}"),
        ScrValue::String(s) => format!("str:{s}"),
        _ => return None,
    };
    Some(key)
}

/// Whether a label of type `label` can match a subject of type `subject`.
pub fn label_compatible(subject: TypeTag, label: TypeTag) -> bool {
    subject.is_any() || subject.intersects(label)
}

/// Bookkeeping for one switch statement.
#[derive(Debug, Default)]
pub struct SwitchContext {
    subject_tag: Option<TypeTag>,
    seen_labels: FxHashMap<String, Span>,
    scanned_cases: FxHashSet<NodeId>,
    default_seen: Option<Span>,
}

impl SwitchContext {
    /// Caches the subject's type from the first visit; later visits keep
    /// the original.
    pub fn cache_subject(&mut self, tag: TypeTag) {
        if self.subject_tag.is_none() {
            self.subject_tag = Some(tag);
        }
    }

    pub fn subject_tag(&self) -> Option<TypeTag> {
        self.subject_tag
    }

    /// Marks a case node as scanned; returns false if it already was, in
    /// which case its labels must not be recorded again.
    pub fn begin_case(&mut self, node: NodeId) -> bool {
        self.scanned_cases.insert(node)
    }

    /// Records a label key. Returns the span of the earlier occurrence when
    /// the key is a duplicate.
    pub fn record_label(&mut self, key: String, span: Span) -> Option<Span> {
        match self.seen_labels.get(&key) {
            Some(earlier) => Some(*earlier),
            None => {
                self.seen_labels.insert(key, span);
                None
            }
        }
    }

    /// Records a `default` label. Returns the span of the earlier default
    /// when this is the second one.
    pub fn record_default(&mut self, span: Span) -> Option<Span> {
        match self.default_seen {
            Some(earlier) => Some(earlier),
            None => {
                self.default_seen = Some(span);
                None
            }
        }
    }

    /// Clears label scratch but keeps the cached subject type. Called
    /// between the fixed-point and diagnostic passes.
    fn reset_labels(&mut self) {
        self.seen_labels.clear();
        self.scanned_cases.clear();
        self.default_seen = None;
    }
}

/// All switch contexts of one analysis run, keyed by Switch node.
#[derive(Debug, Default)]
pub struct SwitchAnalysis {
    contexts: FxHashMap<NodeId, SwitchContext>,
}

impl SwitchAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// The context for a switch node, created on first access.
    pub fn context_mut(&mut self, switch: NodeId) -> &mut SwitchContext {
        self.contexts.entry(switch).or_default()
    }

    /// Resets every context's label scratch for the diagnostic pass.
    pub fn reset_labels(&mut self) {
        for context in self.contexts.values_mut() {
            context.reset_labels();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_keys_are_tag_qualified() {
        let int_one = case_key(&ScrData::int(1)).unwrap();
        let str_one = case_key(&ScrData::string("1")).unwrap();
        assert_ne!(int_one, str_one);

        let istr = case_key(&ScrData::istring("1")).unwrap();
        assert_ne!(istr, str_one);

        assert!(case_key(&ScrData::of(TypeTag::INT)).is_none());
    }

    #[test]
    fn test_duplicate_label_detection() {
        let mut ctx = SwitchContext::default();
        assert!(ctx.record_label("int:1".to_string(), Span::new(0, 1)).is_none());
        assert!(ctx.record_label("int:2".to_string(), Span::new(2, 3)).is_none());
        let earlier = ctx.record_label("int:1".to_string(), Span::new(4, 5));
        assert_eq!(earlier, Some(Span::new(0, 1)));
    }

    #[test]
    fn test_case_node_scanned_once_per_pass() {
        let mut ctx = SwitchContext::default();
        assert!(ctx.begin_case(NodeId(3)));
        assert!(!ctx.begin_case(NodeId(3)));

        ctx.reset_labels();
        assert!(ctx.begin_case(NodeId(3)));
    }

    #[test]
    fn test_subject_cached_on_first_visit() {
        let mut ctx = SwitchContext::default();
        ctx.cache_subject(TypeTag::INT);
        ctx.cache_subject(TypeTag::INT | TypeTag::STRING);
        assert_eq!(ctx.subject_tag(), Some(TypeTag::INT));
    }

    #[test]
    fn test_duplicate_default() {
        let mut ctx = SwitchContext::default();
        assert!(ctx.record_default(Span::new(0, 7)).is_none());
        assert_eq!(ctx.record_default(Span::new(9, 16)), Some(Span::new(0, 7)));
    }

    #[test]
    fn test_label_compatibility() {
        assert!(label_compatible(TypeTag::INT, TypeTag::INT));
        assert!(!label_compatible(TypeTag::INT, TypeTag::STRING));
        assert!(label_compatible(TypeTag::ANY, TypeTag::HASH));
        assert!(label_compatible(TypeTag::INT | TypeTag::STRING, TypeTag::STRING));
    }

    #[test]
    fn test_reset_keeps_subject() {
        let mut analysis = SwitchAnalysis::new();
        analysis.context_mut(NodeId(0)).cache_subject(TypeTag::STRING);
        analysis
            .context_mut(NodeId(0))
            .record_label("str:a".to_string(), Span::new(0, 3));
        analysis.reset_labels();

        let ctx = analysis.context_mut(NodeId(0));
        assert_eq!(ctx.subject_tag(), Some(TypeTag::STRING));
        assert!(ctx.record_label("str:a".to_string(), Span::new(0, 3)).is_none());
    }
}
