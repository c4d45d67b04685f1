use serde::{Deserialize, Serialize};

use crate::signature::SignaturePolicy;

/// Minification behavior switches.
///
/// A host CLI maps its flags (`-dontusemixedcaseclassnames`,
/// `-repackageclasses`, ...) onto this struct; the core itself reads no
/// environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinifyOptions {
    /// Preserve inner-class nesting: an inner class is renamed under its
    /// outer class's final binary name plus the attribute separator.
    pub keep_inner_class_structure: bool,

    /// When false, candidate class names are compared case-insensitively, so
    /// `Aa` and `aA` collide.
    pub mixed_case_class_names: bool,

    /// Reuse method names across differing return types (class-file output
    /// only). Widens the signature key from parameters to the full prototype.
    pub overload_aggressively: bool,

    /// Move all eligible program classes into this package (binary form,
    /// e.g. `"a"`). Kept classes and pinned outer classes stay in place.
    pub repackage_classes: Option<String>,

    /// Traversal order for declared members. The final tables must not
    /// depend on it; tests flip it to prove that.
    pub member_ordering: MemberOrdering,
}

impl Default for MinifyOptions {
    fn default() -> Self {
        Self {
            keep_inner_class_structure: true,
            mixed_case_class_names: true,
            overload_aggressively: false,
            repackage_classes: None,
            member_ordering: MemberOrdering::Declaration,
        }
    }
}

impl MinifyOptions {
    pub fn signature_policy(&self) -> SignaturePolicy {
        if self.overload_aggressively {
            SignaturePolicy::FullProto
        } else {
            SignaturePolicy::ParamsOnly
        }
    }
}

/// Deterministic, test-controlled member traversal order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberOrdering {
    #[default]
    Declaration,
    Reversed,
}

impl MemberOrdering {
    pub fn apply<'a, T>(&self, items: &'a [T]) -> Vec<&'a T> {
        let mut out: Vec<&T> = items.iter().collect();
        if *self == MemberOrdering::Reversed {
            out.reverse();
        }
        out
    }
}
