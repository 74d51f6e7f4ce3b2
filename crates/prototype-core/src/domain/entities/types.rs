//! Runtime types.
//!
//! A [`Type`] is a cheap handle with identity semantics: two handles are
//! equal iff they denote the same type. Predeclared scalar types are
//! process-wide singletons and composite constructors (`ptr_to`, `slice_of`,
//! `array_of`, `map_of`) are canonicalised, so `Type::slice_of(&Type::int())`
//! always yields the same handle.
//!
//! Named types are described with a [`TypeBuilder`]. The builder hands out
//! its [`Type`] before `build()` so a definition can refer to itself:
//!
//! ```rust
//! use prototype_core::domain::{Type, TypeBuilder};
//!
//! let node = TypeBuilder::structure("Node");
//! let this = node.handle();
//! let node = node
//!     .field("Value", &Type::int())
//!     .field("Next", &Type::ptr_to(&this))
//!     .build()
//!     .unwrap();
//! assert_eq!(node, this);
//! assert_eq!(node.fields()[1].ty().to_string(), "*Node");
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::domain::entities::methods::{
    Behaviour, BoxError, CloneFromFn, CloneToFn, Method, StringerFn, TextMarshalFn,
    TextUnmarshalFn,
};
use crate::domain::entities::tag::StructTag;
use crate::domain::entities::value::Value;
use crate::domain::error::DomainError;
use crate::domain::validation::DomainValidator;
use crate::domain::value_objects::{Kind, Receiver, WellKnown};

// ── Identity ─────────────────────────────────────────────────────────────────

/// Process-unique type identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u64);

impl TypeId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

// ── Type ─────────────────────────────────────────────────────────────────────

/// Handle on a runtime type.
#[derive(Clone)]
pub struct Type(Arc<TypeInfo>);

struct TypeInfo {
    id: TypeId,
    name: Option<String>,
    kind: Kind,
    well_known: Option<WellKnown>,
    def: OnceLock<TypeDef>,
}

/// Everything that may be filled in after the handle exists.
#[derive(Default)]
pub(crate) struct TypeDef {
    pub(crate) elem: Option<Type>,
    pub(crate) key: Option<Type>,
    pub(crate) len: usize,
    pub(crate) fields: Vec<StructField>,
    pub(crate) methods: Vec<Method>,
    pub(crate) behaviour: Behaviour,
}

fn empty_def() -> &'static TypeDef {
    static EMPTY: OnceLock<TypeDef> = OnceLock::new();
    EMPTY.get_or_init(TypeDef::default)
}

impl Type {
    fn fresh(name: Option<String>, kind: Kind, well_known: Option<WellKnown>) -> Self {
        Self(Arc::new(TypeInfo {
            id: TypeId::next(),
            name,
            kind,
            well_known,
            def: OnceLock::new(),
        }))
    }

    fn defined(name: Option<String>, kind: Kind, def: TypeDef) -> Self {
        let ty = Self::fresh(name, kind, None);
        let _ = ty.0.def.set(def);
        ty
    }

    pub fn id(&self) -> TypeId {
        self.0.id
    }

    pub fn kind(&self) -> Kind {
        self.0.kind
    }

    /// The declared name; `None` for unnamed composites.
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    pub fn well_known(&self) -> Option<WellKnown> {
        self.0.well_known
    }

    /// Whether the definition has been published (always true except for
    /// builder handles whose `build()` has not run yet).
    pub fn is_defined(&self) -> bool {
        self.0.def.get().is_some()
    }

    fn def(&self) -> &TypeDef {
        self.0.def.get().unwrap_or_else(|| empty_def())
    }

    /// Element type of pointers, slices, arrays and maps.
    pub fn elem(&self) -> Option<&Type> {
        self.def().elem.as_ref()
    }

    /// Key type of maps.
    pub fn key(&self) -> Option<&Type> {
        self.def().key.as_ref()
    }

    /// Length of array types.
    pub fn array_len(&self) -> usize {
        self.def().len
    }

    pub fn fields(&self) -> &[StructField] {
        &self.def().fields
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields().iter().position(|f| f.name() == name)
    }

    pub fn methods(&self) -> &[Method] {
        &self.def().methods
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods().iter().find(|m| m.name() == name)
    }

    pub fn behaviour(&self) -> &Behaviour {
        &self.def().behaviour
    }

    /// Values of `self` may be stored in slots of `other`.
    pub fn assignable_to(&self, other: &Type) -> bool {
        self == other || other.kind() == Kind::Interface
    }

    /// `T` for `*T`, `self` otherwise.
    pub fn deref(&self) -> Type {
        match (self.kind(), self.elem()) {
            (Kind::Ptr, Some(elem)) => elem.clone(),
            _ => self.clone(),
        }
    }

    /// `[]uint8` or any named slice of `uint8`.
    pub fn is_bytes(&self) -> bool {
        self.kind() == Kind::Slice && self.elem().is_some_and(|e| e.kind() == Kind::Uint8)
    }

    // ── predeclared ──────────────────────────────────────────────────────

    /// The predeclared type of a scalar kind, `time` or `any`.
    pub fn basic(kind: Kind) -> Option<Type> {
        BASIC_KINDS
            .iter()
            .position(|k| *k == kind)
            .map(predeclared)
    }

    pub fn bool() -> Type {
        predeclared(0)
    }
    pub fn int() -> Type {
        predeclared(1)
    }
    pub fn int8() -> Type {
        predeclared(2)
    }
    pub fn int16() -> Type {
        predeclared(3)
    }
    pub fn int32() -> Type {
        predeclared(4)
    }
    pub fn int64() -> Type {
        predeclared(5)
    }
    pub fn uint() -> Type {
        predeclared(6)
    }
    pub fn uint8() -> Type {
        predeclared(7)
    }
    pub fn uint16() -> Type {
        predeclared(8)
    }
    pub fn uint32() -> Type {
        predeclared(9)
    }
    pub fn uint64() -> Type {
        predeclared(10)
    }
    pub fn float32() -> Type {
        predeclared(11)
    }
    pub fn float64() -> Type {
        predeclared(12)
    }
    pub fn string() -> Type {
        predeclared(13)
    }
    pub fn time() -> Type {
        predeclared(14)
    }
    /// The empty interface: the dynamic slot type.
    pub fn any() -> Type {
        predeclared(15)
    }

    /// `[]uint8`.
    pub fn bytes() -> Type {
        Type::slice_of(&Type::uint8())
    }

    /// Named `int64` counting nanoseconds.
    pub fn duration() -> Type {
        static DURATION: OnceLock<Type> = OnceLock::new();
        DURATION
            .get_or_init(|| Type::defined(Some("Duration".into()), Kind::Int64, TypeDef::default()))
            .clone()
    }

    // ── composites ───────────────────────────────────────────────────────

    pub fn ptr_to(elem: &Type) -> Type {
        composite(CompositeKey::Ptr(elem.id()), || {
            Type::defined(
                None,
                Kind::Ptr,
                TypeDef {
                    elem: Some(elem.clone()),
                    ..TypeDef::default()
                },
            )
        })
    }

    pub fn slice_of(elem: &Type) -> Type {
        composite(CompositeKey::Slice(elem.id()), || {
            Type::defined(
                None,
                Kind::Slice,
                TypeDef {
                    elem: Some(elem.clone()),
                    ..TypeDef::default()
                },
            )
        })
    }

    pub fn array_of(elem: &Type, len: usize) -> Type {
        composite(CompositeKey::Array(elem.id(), len), || {
            Type::defined(
                None,
                Kind::Array,
                TypeDef {
                    elem: Some(elem.clone()),
                    len,
                    ..TypeDef::default()
                },
            )
        })
    }

    pub fn map_of(key: &Type, elem: &Type) -> Type {
        composite(CompositeKey::Map(key.id(), elem.id()), || {
            Type::defined(
                None,
                Kind::Map,
                TypeDef {
                    key: Some(key.clone()),
                    elem: Some(elem.clone()),
                    ..TypeDef::default()
                },
            )
        })
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Type {}

impl std::hash::Hash for Type {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.name() {
            return f.write_str(name);
        }
        let elem = |f: &mut fmt::Formatter<'_>| match self.elem() {
            Some(e) => write!(f, "{e}"),
            None => f.write_str("?"),
        };
        match self.kind() {
            Kind::Ptr => {
                f.write_str("*")?;
                elem(f)
            }
            Kind::Slice => {
                f.write_str("[]")?;
                elem(f)
            }
            Kind::Array => {
                write!(f, "[{}]", self.array_len())?;
                elem(f)
            }
            Kind::Map => {
                match self.key() {
                    Some(k) => write!(f, "map[{k}]")?,
                    None => f.write_str("map[?]")?,
                }
                elem(f)
            }
            Kind::Interface => f.write_str("interface {}"),
            Kind::Struct => f.write_str("struct {...}"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({self})")
    }
}

// ── predeclared storage ──────────────────────────────────────────────────────

const BASIC_KINDS: [Kind; 16] = [
    Kind::Bool,
    Kind::Int,
    Kind::Int8,
    Kind::Int16,
    Kind::Int32,
    Kind::Int64,
    Kind::Uint,
    Kind::Uint8,
    Kind::Uint16,
    Kind::Uint32,
    Kind::Uint64,
    Kind::Float32,
    Kind::Float64,
    Kind::String,
    Kind::Time,
    Kind::Interface,
];

fn predeclared(slot: usize) -> Type {
    static BASIC: OnceLock<Vec<Type>> = OnceLock::new();
    BASIC.get_or_init(|| {
        BASIC_KINDS
            .iter()
            .map(|kind| {
                let name = match kind {
                    Kind::Time => "Time",
                    Kind::Interface => "any",
                    other => other.as_str(),
                };
                Type::defined(Some(name.to_string()), *kind, TypeDef::default())
            })
            .collect()
    })[slot]
        .clone()
}

// ── composite canonicalisation ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CompositeKey {
    Ptr(TypeId),
    Slice(TypeId),
    Array(TypeId, usize),
    Map(TypeId, TypeId),
}

fn composite(key: CompositeKey, make: impl FnOnce() -> Type) -> Type {
    static COMPOSITES: OnceLock<DashMap<CompositeKey, Type>> = OnceLock::new();
    let cache = COMPOSITES.get_or_init(DashMap::new);
    if let Some(found) = cache.get(&key) {
        return found.value().clone();
    }
    cache.entry(key).or_insert_with(make).value().clone()
}

// ── StructField ──────────────────────────────────────────────────────────────

/// A declared struct field.
#[derive(Debug, Clone)]
pub struct StructField {
    name: String,
    ty: Type,
    embedded: bool,
    tag: StructTag,
}

impl StructField {
    pub fn new(name: impl Into<String>, ty: &Type) -> Self {
        Self {
            name: name.into(),
            ty: ty.clone(),
            embedded: false,
            tag: StructTag::default(),
        }
    }

    /// An embedded field; its name is the (dereferenced) type's name.
    pub fn embedded(ty: &Type) -> Self {
        let name = ty.deref().name().unwrap_or_default().to_string();
        Self {
            name,
            ty: ty.clone(),
            embedded: true,
            tag: StructTag::default(),
        }
    }

    pub fn with_tag(mut self, tag: StructTag) -> Self {
        self.tag = tag;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    pub fn tag(&self) -> &StructTag {
        &self.tag
    }

    /// Exported iff the name starts with an uppercase letter.
    pub fn is_exported(&self) -> bool {
        self.name.chars().next().is_some_and(char::is_uppercase)
    }
}

// ── TypeBuilder ──────────────────────────────────────────────────────────────

/// Builder for named types.
pub struct TypeBuilder {
    ty: Type,
    def: TypeDef,
    error: Option<DomainError>,
}

impl TypeBuilder {
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            ty: Type::fresh(Some(name.into()), kind, None),
            def: TypeDef::default(),
            error: None,
        }
    }

    pub fn structure(name: impl Into<String>) -> Self {
        Self::new(name, Kind::Struct)
    }

    /// A new named type sharing the underlying structure of `underlying`.
    pub fn named(name: impl Into<String>, underlying: &Type) -> Self {
        let mut builder = Self::new(name, underlying.kind());
        builder.def.elem = underlying.elem().cloned();
        builder.def.key = underlying.key().cloned();
        builder.def.len = underlying.array_len();
        builder.def.fields = underlying.fields().to_vec();
        builder
    }

    pub(crate) fn well_known(wk: WellKnown) -> Self {
        Self {
            ty: Type::fresh(Some(wk.as_str().to_string()), Kind::Struct, Some(wk)),
            def: TypeDef::default(),
            error: None,
        }
    }

    /// The type being built, usable before `build()` for self-reference.
    pub fn handle(&self) -> Type {
        self.ty.clone()
    }

    pub(crate) fn kind(&self) -> Kind {
        self.ty.kind()
    }

    pub fn elem(mut self, ty: &Type) -> Self {
        self.def.elem = Some(ty.clone());
        self
    }

    pub fn key(mut self, ty: &Type) -> Self {
        self.def.key = Some(ty.clone());
        self
    }

    pub fn len(mut self, len: usize) -> Self {
        self.def.len = len;
        self
    }

    pub fn field(self, name: impl Into<String>, ty: &Type) -> Self {
        self.field_with(StructField::new(name, ty))
    }

    /// A field with a raw `key:"value"` tag.
    pub fn tagged_field(mut self, name: impl Into<String>, ty: &Type, raw_tag: &str) -> Self {
        match StructTag::parse(raw_tag) {
            Ok(tag) => self.field_with(StructField::new(name, ty).with_tag(tag)),
            Err(e) => {
                self.error.get_or_insert(e);
                self
            }
        }
    }

    pub fn embed(self, ty: &Type) -> Self {
        self.field_with(StructField::embedded(ty))
    }

    pub fn field_with(mut self, field: StructField) -> Self {
        self.def.fields.push(field);
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.def.methods.push(method);
        self
    }

    pub fn clone_from<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Value, &Value) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let f: CloneFromFn = Arc::new(f);
        self.def.behaviour.clone_from = Some(f);
        self
    }

    pub fn clone_to<F>(mut self, receiver: Receiver, f: F) -> Self
    where
        F: Fn(&Value, &mut Value) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let f: CloneToFn = Arc::new(f);
        self.def.behaviour.clone_to = Some((receiver, f));
        self
    }

    pub fn text_marshaler<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        let f: TextMarshalFn = Arc::new(f);
        self.def.behaviour.text_marshal = Some(f);
        self
    }

    pub fn text_unmarshaler<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Value, &str) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let f: TextUnmarshalFn = Arc::new(f);
        self.def.behaviour.text_unmarshal = Some(f);
        self
    }

    pub fn stringer<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        let f: StringerFn = Arc::new(f);
        self.def.behaviour.stringer = Some(f);
        self
    }

    /// Check the definition's internal consistency.
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }

        let type_name = self.ty.to_string();
        let incomplete = |part| DomainError::IncompleteType {
            type_name: type_name.clone(),
            part,
        };

        match self.kind() {
            Kind::Ptr | Kind::Slice | Kind::Array if self.def.elem.is_none() => {
                return Err(incomplete("element type"));
            }
            Kind::Map => {
                let key = self.def.key.as_ref().ok_or_else(|| incomplete("key type"))?;
                if self.def.elem.is_none() {
                    return Err(incomplete("element type"));
                }
                if !is_comparable(key) {
                    return Err(DomainError::UncomparableKey {
                        key_type: key.to_string(),
                    });
                }
            }
            Kind::Struct => {
                let mut seen = std::collections::HashSet::new();
                for field in &self.def.fields {
                    if !seen.insert(field.name()) {
                        return Err(DomainError::DuplicateField {
                            type_name,
                            field: field.name().to_string(),
                        });
                    }
                    if field.is_embedded() && field.ty().deref().kind() != Kind::Struct {
                        return Err(DomainError::InvalidEmbedding {
                            type_name,
                            field: field.name().to_string(),
                        });
                    }
                    if contains_by_value(field.ty(), self.ty.id(), 0) {
                        return Err(DomainError::RecursiveType {
                            type_name,
                            field: field.name().to_string(),
                        });
                    }
                }
            }
            _ => {}
        }

        Ok(())
    }

    pub fn build(self) -> Result<Type, DomainError> {
        DomainValidator::validate_builder(&self)?;
        Ok(self.finish())
    }

    /// Publish without validation; used for built-in definitions.
    pub(crate) fn finish(self) -> Type {
        let _ = self.ty.0.def.set(self.def);
        self.ty
    }
}

/// Whether values of `ty` may be hashed as map keys.
pub(crate) fn is_comparable(ty: &Type) -> bool {
    match ty.kind() {
        Kind::Slice | Kind::Map => false,
        Kind::Array => ty.elem().is_none_or(is_comparable),
        Kind::Struct => ty.fields().iter().all(|f| is_comparable(f.ty())),
        _ => true,
    }
}

/// Whether `ty` holds a value of type `needle` inline (through struct fields
/// and array elements), which would make the type infinitely large.
fn contains_by_value(ty: &Type, needle: TypeId, depth: usize) -> bool {
    if ty.id() == needle {
        return true;
    }
    if depth > 64 {
        return false;
    }
    match ty.kind() {
        Kind::Struct => ty
            .fields()
            .iter()
            .any(|f| contains_by_value(f.ty(), needle, depth + 1)),
        Kind::Array => ty
            .elem()
            .is_some_and(|e| contains_by_value(e, needle, depth + 1)),
        _ => false,
    }
}
