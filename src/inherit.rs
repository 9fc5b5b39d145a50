//! Inherited documentation — target resolution and non-destructive merge.
//!
//! The resolver is a strategy trait so the identifier-prefix heuristic can
//! later be swapped for one backed by real symbol data without touching
//! the merge logic.

use crate::links::owning_type_id;
use crate::model::{DocMember, DocModel, MemberContent};

/// Finds the entity another entity should inherit content from.
pub trait InheritStrategy {
    /// Resolve the inheritance source for `member`, or `None` when there
    /// is nothing to inherit. A miss is not an error.
    fn resolve<'m>(&self, model: &'m DocModel, member: &DocMember) -> Option<&'m DocMember>;
}

/// Default strategy: explicit target lookup, else a base-type walk over
/// successively shorter dotted prefixes of the owning type.
///
/// The walk has no real type-hierarchy knowledge. It is best-effort and
/// can in principle match a same-named method in an unrelated type whose
/// identifier happens to be a prefix; callers treat the result as a
/// documentation hint, not a symbol fact.
pub struct PrefixWalk;

impl InheritStrategy for PrefixWalk {
    fn resolve<'m>(&self, model: &'m DocModel, member: &DocMember) -> Option<&'m DocMember> {
        let directive = member.content.inherit.as_ref()?;

        if let Some(cref) = directive.cref.as_deref() {
            return model.get(cref);
        }

        // Heuristic: drop trailing segments of the owning type and look
        // for a method with the same simple-name-and-parameters suffix.
        let owning = owning_type_id(&member.id);
        let suffix = member.id.strip_prefix(owning)?.strip_prefix('.')?;
        let segments: Vec<&str> = owning.split('.').collect();
        for keep in (1..segments.len()).rev() {
            let prefix = segments[..keep].join(".");
            let candidate = format!("M:{prefix}.{suffix}");
            if let Some(found) = model.get(&candidate) {
                return Some(found);
            }
        }
        None
    }
}

/// Copy missing sections from `from` into `into`.
///
/// Author-supplied content is never overwritten: scalar sections copy only
/// when absent, parameters merge per-name, and the list-valued sections
/// (exceptions, see-also, examples) copy all-or-nothing. Running the merge
/// twice changes nothing.
pub fn merge_inherited(into: &mut MemberContent, from: &MemberContent) {
    if into.summary.is_none() {
        into.summary = from.summary.clone();
    }
    if into.remarks.is_none() {
        into.remarks = from.remarks.clone();
    }
    if into.returns.is_none() {
        into.returns = from.returns.clone();
    }

    for param in &from.params {
        if !into.params.iter().any(|p| p.name == param.name) {
            into.params.push(param.clone());
        }
    }
    for type_param in &from.type_params {
        if !into.type_params.iter().any(|p| p.name == type_param.name) {
            into.type_params.push(type_param.clone());
        }
    }

    if into.exceptions.is_empty() {
        into.exceptions = from.exceptions.clone();
    }
    if into.see_also.is_empty() {
        into.see_also = from.see_also.clone();
    }
    if into.examples.is_empty() {
        into.examples = from.examples.clone();
    }
}
