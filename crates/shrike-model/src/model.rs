use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use shrike_core::descriptor;
use shrike_core::{Name, TypeId};
use smol_str::SmolStr;
use thiserror::Error;

pub const OBJECT_DESCRIPTOR: &str = "Ljava/lang/Object;";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("duplicate class definition for {descriptor}")]
    DuplicateClass { descriptor: String },
    #[error("cyclic hierarchy through {descriptor}")]
    CyclicHierarchy { descriptor: String },
    #[error("class {descriptor} has a malformed descriptor")]
    MalformedDescriptor { descriptor: String },
}

/// Where a class comes from, which decides whether it may be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// Part of the program being shrunk; eligible for renaming.
    Program,
    /// Compiled against but not shrunk; names are fixed (apply-mapping aside).
    Classpath,
    /// Platform/library classes; names are always fixed.
    Library,
    /// Referenced but absent from the input. Treated as a library class
    /// rooted at `java.lang.Object`, with no members.
    Missing,
}

/// JVM access flags, stored raw the way class files carry them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessFlags(pub u16);

impl AccessFlags {
    pub const PUBLIC: u16 = 0x0001;
    pub const PRIVATE: u16 = 0x0002;
    pub const PROTECTED: u16 = 0x0004;
    pub const STATIC: u16 = 0x0008;
    pub const FINAL: u16 = 0x0010;
    pub const INTERFACE: u16 = 0x0200;
    pub const ABSTRACT: u16 = 0x0400;
    pub const SYNTHETIC: u16 = 0x1000;

    #[inline]
    pub fn contains(self, flag: u16) -> bool {
        self.0 & flag != 0
    }

    #[inline]
    pub fn is_public(self) -> bool {
        self.contains(Self::PUBLIC)
    }

    #[inline]
    pub fn is_private(self) -> bool {
        self.contains(Self::PRIVATE)
    }

    #[inline]
    pub fn is_package_private(self) -> bool {
        self.0 & (Self::PUBLIC | Self::PRIVATE | Self::PROTECTED) == 0
    }

    #[inline]
    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    #[inline]
    pub fn is_interface(self) -> bool {
        self.contains(Self::INTERFACE)
    }
}

/// A method prototype: parameter types and return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Proto {
    pub params: Box<[TypeId]>,
    pub ret: TypeId,
}

/// A method reference: holder, name, prototype.
///
/// References are value types; the same `(holder, name, proto)` triple always
/// compares equal whether it points at a declaration or an up-call through a
/// subclass holder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub holder: TypeId,
    pub name: Name,
    pub proto: Proto,
}

/// A field reference: holder, name, field type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub holder: TypeId,
    pub name: Name,
    pub ty: TypeId,
}

#[derive(Debug, Clone)]
pub struct MethodDef {
    pub name: Name,
    pub proto: Proto,
    pub access: AccessFlags,
}

impl MethodDef {
    /// Constructors and class initializers keep their names unconditionally.
    pub fn is_initializer(&self) -> bool {
        self.name == "<init>" || self.name == "<clinit>"
    }

    pub fn reference(&self, holder: TypeId) -> MethodRef {
        MethodRef {
            holder,
            name: self.name.clone(),
            proto: self.proto.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: Name,
    pub ty: TypeId,
    pub access: AccessFlags,
}

impl FieldDef {
    pub fn reference(&self, holder: TypeId) -> FieldRef {
        FieldRef {
            holder,
            name: self.name.clone(),
            ty: self.ty,
        }
    }
}

/// The `InnerClasses` attribute entry for a member class.
///
/// `separator` is `"$"` for source-level nesting; compiler-synthesized classes
/// may bind to a synthesized prefix with a different separator.
#[derive(Debug, Clone)]
pub struct InnerClassAttribute {
    pub outer: TypeId,
    pub inner_name: Name,
    pub separator: SmolStr,
}

#[derive(Debug, Clone)]
pub struct ClassDef {
    pub id: TypeId,
    pub kind: ClassKind,
    pub access: AccessFlags,
    pub super_type: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub inner_class: Option<InnerClassAttribute>,
    pub methods: Vec<MethodDef>,
    pub fields: Vec<FieldDef>,
}

impl ClassDef {
    #[inline]
    pub fn is_program(&self) -> bool {
        self.kind == ClassKind::Program
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.access.is_interface()
    }
}

#[derive(Debug)]
struct TypeEntry {
    descriptor: String,
    def: Option<ClassDef>,
    pruned: bool,
}

/// The immutable class graph handed to the minifier.
#[derive(Debug)]
pub struct ProgramModel {
    types: Vec<TypeEntry>,
    by_descriptor: HashMap<String, TypeId>,
    object: TypeId,
    /// Every method reference observed in code bodies, for the non-rebound
    /// rewrite pass. Holders may be subclasses that do not declare the method.
    method_references: Vec<MethodRef>,
}

impl ProgramModel {
    pub fn builder() -> ProgramModelBuilder {
        ProgramModelBuilder::new()
    }

    #[inline]
    pub fn object_type(&self) -> TypeId {
        self.object
    }

    #[inline]
    pub fn descriptor(&self, ty: TypeId) -> &str {
        &self.types[ty.index()].descriptor
    }

    pub fn type_by_descriptor(&self, descriptor: &str) -> Option<TypeId> {
        self.by_descriptor.get(descriptor).copied()
    }

    /// The class definition for `ty`, if the input contains one.
    pub fn definition(&self, ty: TypeId) -> Option<&ClassDef> {
        self.types[ty.index()].def.as_ref()
    }

    /// True when `ty` was defined in the program source but removed by tree
    /// shaking; it may still be mentioned in protos and field types.
    pub fn was_pruned(&self, ty: TypeId) -> bool {
        self.types[ty.index()].pruned
    }

    /// All defined classes, in deterministic insertion order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.types.iter().filter_map(|entry| entry.def.as_ref())
    }

    pub fn program_classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes().filter(|class| class.is_program())
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes().filter(|class| class.is_interface())
    }

    /// Reference types that are mentioned but neither defined nor pruned.
    /// Primitive and array descriptors are not classes and never qualify.
    pub fn missing_types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.types.iter().enumerate().filter_map(|(i, entry)| {
            (entry.def.is_none()
                && !entry.pruned
                && descriptor::is_class_descriptor(&entry.descriptor))
            .then(|| TypeId::new(i as u32))
        })
    }

    pub fn method_references(&self) -> &[MethodRef] {
        &self.method_references
    }

    pub(crate) fn type_count(&self) -> usize {
        self.types.len()
    }
}

/// Mutable builder for [`ProgramModel`].
///
/// Types are interned by descriptor on first mention; definitions may be
/// attached in any order. `build` validates the result and fails on duplicate
/// definitions, malformed descriptors, and supertype/interface cycles.
#[derive(Debug)]
pub struct ProgramModelBuilder {
    types: Vec<TypeEntry>,
    by_descriptor: HashMap<String, TypeId>,
    object: TypeId,
    method_references: Vec<MethodRef>,
    errors: Vec<ModelError>,
}

impl Default for ProgramModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramModelBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            types: Vec::new(),
            by_descriptor: HashMap::new(),
            object: TypeId::new(0),
            method_references: Vec::new(),
            errors: Vec::new(),
        };
        builder.object = builder.type_id(OBJECT_DESCRIPTOR);
        builder
    }

    /// Interns `descriptor`, returning the id it is already known under if any.
    pub fn type_id(&mut self, descriptor: &str) -> TypeId {
        match self.by_descriptor.entry(descriptor.to_string()) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = TypeId::new(self.types.len() as u32);
                entry.insert(id);
                self.types.push(TypeEntry {
                    descriptor: descriptor.to_string(),
                    def: None,
                    pruned: false,
                });
                id
            }
        }
    }

    /// Starts a class definition. Defaults: program kind, public access,
    /// `java.lang.Object` supertype (none for Object itself).
    pub fn class(&mut self, descriptor: &str) -> ClassBuilder<'_> {
        let id = self.type_id(descriptor);
        let super_type = (descriptor != OBJECT_DESCRIPTOR).then(|| OBJECT_DESCRIPTOR.to_string());
        ClassBuilder {
            builder: self,
            id,
            kind: ClassKind::Program,
            access: AccessFlags(AccessFlags::PUBLIC),
            super_type,
            interfaces: Vec::new(),
            inner_class: None,
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Marks a type as pruned by tree shaking.
    pub fn prune(&mut self, descriptor: &str) -> TypeId {
        let id = self.type_id(descriptor);
        self.types[id.index()].pruned = true;
        id
    }

    /// Records a method reference observed in code, for the non-rebound pass.
    pub fn reference_method(
        &mut self,
        holder: &str,
        name: &str,
        params: &[&str],
        ret: &str,
    ) -> MethodRef {
        let holder = self.type_id(holder);
        let proto = self.proto(params, ret);
        let reference = MethodRef {
            holder,
            name: Name::from(name),
            proto,
        };
        self.method_references.push(reference.clone());
        reference
    }

    pub fn proto(&mut self, params: &[&str], ret: &str) -> Proto {
        let params = params
            .iter()
            .map(|p| self.type_id(p))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Proto {
            params,
            ret: self.type_id(ret),
        }
    }

    pub fn build(mut self) -> Result<ProgramModel, ModelError> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }
        self.errors = Vec::new();

        let model = ProgramModel {
            types: self.types,
            by_descriptor: self.by_descriptor,
            object: self.object,
            method_references: self.method_references,
        };
        model.check_acyclic()?;
        Ok(model)
    }
}

impl ProgramModel {
    fn check_acyclic(&self) -> Result<(), ModelError> {
        // 0 = unvisited, 1 = on stack, 2 = done.
        let mut mark = vec![0u8; self.type_count()];
        for start in 0..self.type_count() {
            self.visit_acyclic(TypeId::new(start as u32), &mut mark)?;
        }
        Ok(())
    }

    fn visit_acyclic(&self, ty: TypeId, mark: &mut [u8]) -> Result<(), ModelError> {
        match mark[ty.index()] {
            2 => return Ok(()),
            1 => {
                return Err(ModelError::CyclicHierarchy {
                    descriptor: self.descriptor(ty).to_string(),
                })
            }
            _ => {}
        }
        mark[ty.index()] = 1;
        if let Some(def) = self.definition(ty) {
            if let Some(superty) = def.super_type {
                self.visit_acyclic(superty, mark)?;
            }
            for &iface in &def.interfaces {
                self.visit_acyclic(iface, mark)?;
            }
        }
        mark[ty.index()] = 2;
        Ok(())
    }
}

/// Fluent builder for a single class definition.
pub struct ClassBuilder<'a> {
    builder: &'a mut ProgramModelBuilder,
    id: TypeId,
    kind: ClassKind,
    access: AccessFlags,
    super_type: Option<String>,
    interfaces: Vec<String>,
    inner_class: Option<(String, String, SmolStr)>,
    methods: Vec<(String, Vec<String>, String, AccessFlags)>,
    fields: Vec<(String, String, AccessFlags)>,
}

impl ClassBuilder<'_> {
    pub fn kind(mut self, kind: ClassKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn library(self) -> Self {
        self.kind(ClassKind::Library)
    }

    pub fn classpath(self) -> Self {
        self.kind(ClassKind::Classpath)
    }

    pub fn access(mut self, access: AccessFlags) -> Self {
        self.access = access;
        self
    }

    pub fn interface(mut self) -> Self {
        self.access.0 |= AccessFlags::INTERFACE | AccessFlags::ABSTRACT;
        self
    }

    pub fn super_type(mut self, descriptor: &str) -> Self {
        self.super_type = Some(descriptor.to_string());
        self
    }

    /// Only `java.lang.Object` itself goes without a supertype.
    pub fn no_super_type(mut self) -> Self {
        self.super_type = None;
        self
    }

    pub fn implements(mut self, descriptor: &str) -> Self {
        self.interfaces.push(descriptor.to_string());
        self
    }

    pub fn inner_class_of(mut self, outer: &str, inner_name: &str) -> Self {
        self.inner_class = Some((outer.to_string(), inner_name.to_string(), SmolStr::new("$")));
        self
    }

    pub fn inner_separator(mut self, separator: &str) -> Self {
        if let Some((_, _, sep)) = self.inner_class.as_mut() {
            *sep = SmolStr::new(separator);
        }
        self
    }

    pub fn method(mut self, name: &str, params: &[&str], ret: &str) -> Self {
        self.methods.push((
            name.to_string(),
            params.iter().map(|p| p.to_string()).collect(),
            ret.to_string(),
            AccessFlags(AccessFlags::PUBLIC),
        ));
        self
    }

    pub fn method_with_access(
        mut self,
        name: &str,
        params: &[&str],
        ret: &str,
        access: AccessFlags,
    ) -> Self {
        self.methods.push((
            name.to_string(),
            params.iter().map(|p| p.to_string()).collect(),
            ret.to_string(),
            access,
        ));
        self
    }

    pub fn field(mut self, name: &str, ty: &str) -> Self {
        self.fields
            .push((name.to_string(), ty.to_string(), AccessFlags(AccessFlags::PUBLIC)));
        self
    }

    /// Finishes the definition and returns the class id.
    pub fn build(self) -> TypeId {
        let ClassBuilder {
            builder,
            id,
            kind,
            access,
            super_type,
            interfaces,
            inner_class,
            methods,
            fields,
        } = self;

        let descriptor = builder.types[id.index()].descriptor.clone();
        if !descriptor::is_class_descriptor(&descriptor) {
            builder.errors.push(ModelError::MalformedDescriptor { descriptor });
            return id;
        }
        if builder.types[id.index()].def.is_some() {
            builder.errors.push(ModelError::DuplicateClass { descriptor });
            return id;
        }

        let super_type = super_type.map(|s| builder.type_id(&s));
        let interfaces = interfaces.iter().map(|i| builder.type_id(i)).collect();
        let inner_class = inner_class.map(|(outer, inner_name, separator)| InnerClassAttribute {
            outer: builder.type_id(&outer),
            inner_name: Name::from(inner_name.as_str()),
            separator,
        });
        let methods = methods
            .into_iter()
            .map(|(name, params, ret, access)| {
                let params: Vec<&str> = params.iter().map(String::as_str).collect();
                MethodDef {
                    name: Name::from(name.as_str()),
                    proto: builder.proto(&params, &ret),
                    access,
                }
            })
            .collect();
        let fields = fields
            .into_iter()
            .map(|(name, ty, access)| FieldDef {
                name: Name::from(name.as_str()),
                ty: builder.type_id(&ty),
                access,
            })
            .collect();

        builder.types[id.index()].def = Some(ClassDef {
            id,
            kind,
            access,
            super_type,
            interfaces,
            inner_class,
            methods,
            fields,
        });
        id
    }
}

/// Interns the set of descriptors a class's members mention, for the
/// dangling-type pass.
pub fn referenced_types(class: &ClassDef) -> HashSet<TypeId> {
    let mut out = HashSet::new();
    for method in &class.methods {
        out.extend(method.proto.params.iter().copied());
        out.insert(method.proto.ret);
    }
    for field in &class.fields {
        out.insert(field.ty);
    }
    out
}
