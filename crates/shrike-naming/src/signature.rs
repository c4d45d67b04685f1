//! Signature keys: the equivalence classes of method signatures that must
//! not share names.

use shrike_core::{Name, TypeId};
use shrike_model::{MethodDef, MethodRef, Proto};

/// How prototypes project onto signature keys.
///
/// Dalvik dispatch takes the full prototype into account, so names may be
/// reused across differing parameter lists; the return type only
/// participates under aggressive overloading for class-file output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignaturePolicy {
    ParamsOnly,
    FullProto,
}

impl SignaturePolicy {
    pub fn key_of(self, proto: &Proto) -> SignatureKey {
        match self {
            SignaturePolicy::ParamsOnly => SignatureKey::Params(proto.params.clone()),
            SignaturePolicy::FullProto => SignatureKey::Proto(proto.params.clone(), proto.ret),
        }
    }

    pub fn signature_of(self, method: &MethodRef) -> MethodSignature {
        MethodSignature {
            name: method.name.clone(),
            key: self.key_of(&method.proto),
        }
    }

    pub fn signature_of_def(self, method: &MethodDef) -> MethodSignature {
        MethodSignature {
            name: method.name.clone(),
            key: self.key_of(&method.proto),
        }
    }
}

/// Methods whose keys differ inhabit disjoint name pools.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignatureKey {
    Params(Box<[TypeId]>),
    Proto(Box<[TypeId]>, TypeId),
}

/// A holder-independent method identity: original name plus signature key.
///
/// An override chain shares one `MethodSignature`, which is what lets a
/// subclass pick up the name its supertype's declaration was assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodSignature {
    pub name: Name,
    pub key: SignatureKey,
}
