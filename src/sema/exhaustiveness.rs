//! Match-arm coverage tracking, grounded on the arm-processing loop
//! described for `Match` in the semantic analyzer: each arm folds into a
//! running coverage record, and exhaustiveness is decided once from the
//! scrutinee's type after every arm has been seen.
use std::collections::HashSet;

use crate::ast::{LiteralPattern, MatchArm, Pattern};
use crate::sema::TypeRef;

#[derive(Debug, Default)]
pub struct MatchCoverage {
    pub has_irrefutable: bool,
    pub covers_null: bool,
    pub covers_some: bool,
    pub covered_integers: HashSet<i64>,
    pub covered_booleans: HashSet<bool>,
    /// Index (into the arm list) of the first irrefutable arm seen, used
    /// to flag every later arm as redundant (fully shadowed).
    first_irrefutable_index: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmVerdict {
    Ok,
    /// Fully shadowed by an earlier irrefutable arm.
    Redundant,
}

impl MatchCoverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one arm's pattern into the running coverage, returning
    /// whether the arm is live or fully shadowed by an earlier wildcard.
    pub fn record_arm(&mut self, index: usize, pattern: &Pattern) -> ArmVerdict {
        if let Some(first) = self.first_irrefutable_index {
            if index > first {
                return ArmVerdict::Redundant;
            }
        }
        match pattern {
            Pattern::Wildcard | Pattern::Binding(_) => {
                self.has_irrefutable = true;
                self.first_irrefutable_index.get_or_insert(index);
            }
            Pattern::Literal(LiteralPattern::Null) => self.covers_null = true,
            Pattern::Literal(LiteralPattern::Bool(b)) => {
                self.covered_booleans.insert(*b);
            }
            Pattern::Literal(LiteralPattern::Int(i)) => {
                self.covered_integers.insert(*i);
            }
            Pattern::Literal(LiteralPattern::Str(_)) => {}
            Pattern::Constructor { .. } => self.covers_some = true,
            Pattern::Tuple(_) => self.covers_some = true,
        }
        ArmVerdict::Ok
    }

    /// Decides exhaustiveness from the scrutinee's type after every arm
    /// has been folded in.
    pub fn is_exhaustive(&self, scrutinee_ty: &TypeRef) -> bool {
        if self.has_irrefutable {
            return true;
        }
        match scrutinee_ty {
            TypeRef::Boolean => self.covered_booleans.contains(&true) && self.covered_booleans.contains(&false),
            TypeRef::Optional(_) => self.covers_null && self.covers_some,
            TypeRef::Integer => false,
            _ => false,
        }
    }

    /// Names one uncovered case for the diagnostic message, when the
    /// scrutinee's type has a small enough set of cases to name one.
    /// Returns `None` once the match is exhaustive (nothing to name) or
    /// for scrutinee types (e.g. `Integer`) with no finite case set.
    pub fn missing_case(&self, scrutinee_ty: &TypeRef) -> Option<&'static str> {
        if self.is_exhaustive(scrutinee_ty) {
            return None;
        }
        match scrutinee_ty {
            TypeRef::Boolean if !self.covered_booleans.contains(&true) => Some("true"),
            TypeRef::Boolean if !self.covered_booleans.contains(&false) => Some("false"),
            TypeRef::Optional(_) if !self.covers_null => Some("null"),
            TypeRef::Optional(_) if !self.covers_some => Some("some"),
            _ => None,
        }
    }
}

pub fn check_arms(arms: &[MatchArm], scrutinee_ty: &TypeRef) -> (MatchCoverage, Vec<usize>) {
    let mut coverage = MatchCoverage::new();
    let mut redundant = Vec::new();
    for (i, arm) in arms.iter().enumerate() {
        if coverage.record_arm(i, &arm.pattern) == ArmVerdict::Redundant {
            redundant.push(i);
        }
    }
    let _ = coverage.is_exhaustive(scrutinee_ty);
    (coverage, redundant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceLoc;

    fn arm(pattern: Pattern) -> MatchArm {
        MatchArm {
            id: crate::ast::NodeIdGen::new().next(),
            loc: SourceLoc::INVALID,
            pattern,
            guard: None,
            body: crate::ast::MatchArmBody::Expr(Box::new(crate::ast::Expr {
                id: crate::ast::NodeIdGen::new().next(),
                loc: SourceLoc::INVALID,
                kind: crate::ast::ExprKind::UnitLiteral,
            })),
        }
    }

    #[test]
    fn boolean_requires_both_values() {
        let arms = vec![arm(Pattern::Literal(LiteralPattern::Bool(true)))];
        let (coverage, _) = check_arms(&arms, &TypeRef::Boolean);
        assert!(!coverage.is_exhaustive(&TypeRef::Boolean));

        let arms = vec![arm(Pattern::Literal(LiteralPattern::Bool(true))), arm(Pattern::Literal(LiteralPattern::Bool(false)))];
        let (coverage, _) = check_arms(&arms, &TypeRef::Boolean);
        assert!(coverage.is_exhaustive(&TypeRef::Boolean));
    }

    #[test]
    fn optional_requires_null_and_some() {
        let inner = Box::new(TypeRef::Integer);
        let arms = vec![arm(Pattern::Literal(LiteralPattern::Null)), arm(Pattern::Binding("x".to_string()))];
        let (coverage, redundant) = check_arms(&arms, &TypeRef::Optional(inner.clone()));
        assert!(coverage.is_exhaustive(&TypeRef::Optional(inner)));
        assert!(redundant.is_empty());
    }

    #[test]
    fn arm_after_wildcard_is_redundant() {
        let arms = vec![arm(Pattern::Wildcard), arm(Pattern::Literal(LiteralPattern::Int(1)))];
        let (_, redundant) = check_arms(&arms, &TypeRef::Integer);
        assert_eq!(redundant, vec![1]);
    }
}
