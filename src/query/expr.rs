//! Query expression tree
//!
//! The deserialized form of one RPC query. Converting an expression binds
//! every leaf to a segment and instantiates the matching iterator tree.

use crate::isr::{AndIsr, Isr, IsrTree, NotIsr, OrIsr, PhraseIsr, SynOrIsr, WordIsr};
use crate::segment::Segment;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    SynOr {
        original: Box<Expr>,
        synonyms: Box<Expr>,
        advance_right: u32,
        advance_left: u32,
    },
    Not {
        included: Box<Expr>,
        excluded: Box<Expr>,
    },
    Word(String),
    Phrase(Vec<String>),
}

impl Expr {
    /// Instantiate the iterator for this expression against one segment
    pub fn to_isr<'a>(&self, segment: &'a Segment) -> Isr<'a> {
        match self {
            Expr::And(left, right) => Isr::And(Box::new(AndIsr::new(
                left.to_isr(segment),
                right.to_isr(segment),
            ))),
            Expr::Or(left, right) => Isr::Or(Box::new(OrIsr::new(
                left.to_isr(segment),
                right.to_isr(segment),
            ))),
            Expr::SynOr {
                original,
                synonyms,
                advance_right,
                advance_left,
            } => Isr::SynOr(Box::new(SynOrIsr::new(
                original.to_isr(segment),
                synonyms.to_isr(segment),
                *advance_right,
                *advance_left,
            ))),
            Expr::Not { included, excluded } => Isr::Not(Box::new(NotIsr::new(
                included.to_isr(segment),
                excluded.to_isr(segment),
            ))),
            Expr::Word(stem) => Isr::Word(WordIsr::open(segment, stem)),
            Expr::Phrase(stems) => Isr::Phrase(PhraseIsr::new(segment, stems)),
        }
    }

    /// Build a full iterator tree bound to `segment`
    pub fn to_tree<'a>(&self, segment: &'a Segment) -> IsrTree<'a> {
        IsrTree::from_root(segment, self.to_isr(segment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::testutil::write_segment;
    use crate::segment::WordFlags;

    #[test]
    fn test_to_tree_flattens_terms_in_order() {
        let b = WordFlags(0);
        let (_dir, segment) = write_segment(|w| {
            w.add_document("https://one.com", "", &[("a", b), ("c", b)], true);
        });

        let expr = Expr::And(
            Box::new(Expr::Word("a".into())),
            Box::new(Expr::Or(
                Box::new(Expr::Word("c".into())),
                Box::new(Expr::Word("a".into())), // duplicate, skipped
            )),
        );
        let tree = expr.to_tree(&segment);
        let terms = tree.flattened_terms();
        let keys: Vec<&str> = terms.iter().map(|t| t.key()).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }
}
