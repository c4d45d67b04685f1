//! Identifier minification for the shrike shrinker.
//!
//! Given a resolved [`ProgramModel`] and a naming strategy, this crate
//! assigns short, unique names to classes, methods, and fields while
//! preserving the semantics of virtual dispatch, interface dispatch, and
//! inner-class attributes.
//!
//! The hard part is not generating names but deciding when two members may
//! share one. Method scopes are modeled on the subtype tree with two parallel
//! hierarchical states: reservation states track names that must not be
//! handed out (library members, keep rules, apply-mapping), attached at each
//! class's *frontier* so program-side reservations block a name upward
//! without polluting the subtree's own pool; naming states track committed
//! assignments so subtypes inherit the names of methods they override. Both
//! are keyed per signature, so methods whose prototypes cannot collide in
//! dispatch draw from disjoint pools.
//!
//! Interfaces break the tree shape: a method declared by several related
//! interfaces must receive one name that is free in every class that could
//! dispatch to it. Interface methods are therefore assigned before class
//! methods, searching all impacted scopes at once and generating candidates
//! from the interface's own state so that rejected candidates stay available
//! for class methods later.
//!
//! Classes are renamed first (methods and fields do not depend on the new
//! type names), then methods, then fields:
//!
//! 1. Class renaming — reserve pinned descriptors, rename per
//!    package/outer-class namespace, then name dangling pruned types.
//! 2. Method phases — reserve hierarchy-wide, reserve + assign across the
//!    interface lattice, assign top-down per class, then rewrite non-rebound
//!    references in parallel.
//! 3. Fields — per-holder scopes with inherited reserved sets.
//!
//! The entry point is [`Minifier::run`]; [`minify`] wires up the standard
//! [`MinificationStrategy`] from keep rules and an apply-mapping.

mod class_minifier;
mod error;
mod field_minifier;
mod interface_minifier;
mod method_minifier;
mod name_source;
mod naming_state;
mod options;
mod reservation_state;
mod signature;
mod strategy;

pub use class_minifier::ClassRenaming;
pub use error::MinifyError;
pub use field_minifier::FieldRenaming;
pub use method_minifier::{MethodRenaming, UnresolvedReference};
pub use name_source::{identifier, NameCounters};
pub use options::{MemberOrdering, MinifyOptions};
pub use signature::{MethodSignature, SignatureKey, SignaturePolicy};
pub use strategy::{
    ApplyMapping, ClassNamingStrategy, InternalNamingState, KeepRules, MemberNamingStrategy,
    MinificationStrategy,
};

use shrike_model::{ProgramModel, SubtypingInfo};

use crate::class_minifier::ClassNameMinifier;
use crate::field_minifier::FieldNameMinifier;
use crate::method_minifier::MethodNameMinifier;

/// The three output tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Renaming {
    pub classes: ClassRenaming,
    pub methods: MethodRenaming,
    pub fields: FieldRenaming,
}

/// Runs the minification pipeline over a program model.
pub struct Minifier<'m> {
    model: &'m ProgramModel,
    options: MinifyOptions,
}

impl<'m> Minifier<'m> {
    pub fn new(model: &'m ProgramModel, options: MinifyOptions) -> Self {
        Self { model, options }
    }

    /// Computes all renaming tables. Deterministic: the same model, strategy,
    /// and options produce identical tables on every run.
    pub fn run(
        &self,
        class_strategy: &dyn ClassNamingStrategy,
        member_strategy: &dyn MemberNamingStrategy,
    ) -> Result<Renaming, MinifyError> {
        tracing::debug!("minifying class names");
        let classes =
            ClassNameMinifier::new(self.model, class_strategy, &self.options).compute_renaming()?;

        let subtyping = SubtypingInfo::compute(self.model);

        tracing::debug!("minifying method names");
        let methods = MethodNameMinifier::new(self.model, member_strategy, &self.options)
            .compute_renaming(&subtyping)?;

        tracing::debug!("minifying field names");
        let fields =
            FieldNameMinifier::new(self.model, member_strategy, &self.options).compute_renaming()?;

        Ok(Renaming {
            classes,
            methods,
            fields,
        })
    }
}

/// Convenience entry point using the standard strategy.
pub fn minify(
    model: &ProgramModel,
    options: MinifyOptions,
    keep: KeepRules,
    mapping: ApplyMapping,
) -> Result<Renaming, MinifyError> {
    let strategy = MinificationStrategy::new(model, keep, mapping)?;
    Minifier::new(model, options).run(&strategy, &strategy)
}
