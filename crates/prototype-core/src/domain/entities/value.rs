//! Runtime values.
//!
//! A [`Value`] pairs a [`Type`] with its representation. Cloning a `Value`
//! copies scalars, arrays and structs, and shares the storage behind
//! slices, maps and pointers, the same way assignment behaves for
//! reference-like kinds. Shared storage sits behind `parking_lot` locks so
//! values can be handed across threads.
//!
//! Equality is deep: two values are equal when their types are identical
//! and their contents are recursively equal, following pointers and
//! tolerating cycles.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use parking_lot::RwLock;

use crate::domain::entities::types::{Type, TypeId};
use crate::domain::error::DomainError;
use crate::domain::value_objects::Kind;

/// Timestamps carry their offset.
pub type Time = DateTime<FixedOffset>;

/// Pointee storage.
pub type Cell = Arc<RwLock<Value>>;

pub(crate) type SliceData = Arc<RwLock<Vec<Value>>>;
pub(crate) type MapData = Arc<RwLock<BTreeMap<MapKey, (Value, Value)>>>;

/// The zero timestamp: the Unix epoch at UTC.
pub fn epoch() -> Time {
    DateTime::<Utc>::default().fixed_offset()
}

/// Hashable projection of a comparable value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(u64),
    Str(String),
    Time(i64, u32),
    Addr(usize),
    Seq(Vec<MapKey>),
    Dyn(TypeId, Box<MapKey>),
}

#[derive(Clone)]
pub(crate) enum Repr {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Time(Time),
    Array(Vec<Value>),
    Slice(Option<SliceData>),
    Map(Option<MapData>),
    Struct(Vec<Value>),
    Ptr(Option<Cell>),
    Interface(Option<Box<Value>>),
}

#[derive(Clone)]
pub struct Value {
    ty: Type,
    repr: Repr,
}

fn zero_repr(ty: &Type) -> Repr {
    match ty.kind() {
        Kind::Bool => Repr::Bool(false),
        Kind::Int | Kind::Int8 | Kind::Int16 | Kind::Int32 | Kind::Int64 => Repr::Int(0),
        Kind::Uint | Kind::Uint8 | Kind::Uint16 | Kind::Uint32 | Kind::Uint64 => Repr::Uint(0),
        Kind::Float32 | Kind::Float64 => Repr::Float(0.0),
        Kind::String => Repr::Str(String::new()),
        Kind::Time => Repr::Time(epoch()),
        Kind::Array => Repr::Array(match ty.elem() {
            Some(elem) => (0..ty.array_len()).map(|_| Value::zero(elem)).collect(),
            None => Vec::new(),
        }),
        Kind::Slice => Repr::Slice(None),
        Kind::Map => Repr::Map(None),
        Kind::Struct => Repr::Struct(ty.fields().iter().map(|f| Value::zero(f.ty())).collect()),
        Kind::Ptr => Repr::Ptr(None),
        Kind::Interface => Repr::Interface(None),
    }
}

fn wrong_kind(operation: &'static str, ty: &Type) -> DomainError {
    DomainError::WrongKind {
        operation,
        kind: ty.kind().to_string(),
    }
}

fn elem_of(ty: &Type, kind: Kind, operation: &'static str) -> Result<Type, DomainError> {
    if ty.kind() != kind {
        return Err(wrong_kind(operation, ty));
    }
    ty.elem().cloned().ok_or_else(|| DomainError::IncompleteType {
        type_name: ty.to_string(),
        part: "element type",
    })
}

fn addr<T>(arc: &Arc<T>) -> usize {
    Arc::as_ptr(arc) as usize
}

/// Box `value` into the interface type `iface`, flattening nested interfaces.
fn box_into(value: Value, iface: &Type) -> Value {
    let payload = match value.repr {
        Repr::Interface(payload) => payload,
        repr => Some(Box::new(Value { ty: value.ty, repr })),
    };
    Value {
        ty: iface.clone(),
        repr: Repr::Interface(payload),
    }
}

/// Make `value` storable in a slot of type `slot`.
pub(crate) fn coerce(value: Value, slot: &Type) -> Result<Value, DomainError> {
    if value.ty == *slot {
        return Ok(value);
    }
    if slot.kind() == Kind::Interface {
        return Ok(box_into(value, slot));
    }
    Err(DomainError::TypeMismatch {
        expected: slot.to_string(),
        actual: value.ty.to_string(),
    })
}

impl Value {
    // ── constructors ─────────────────────────────────────────────────────

    /// The zero value of `ty`.
    pub fn zero(ty: &Type) -> Value {
        Value {
            ty: ty.clone(),
            repr: zero_repr(ty),
        }
    }

    /// The nil `any`.
    pub fn nil() -> Value {
        Value::zero(&Type::any())
    }

    pub fn bool(b: bool) -> Value {
        Value::from_parts(Type::bool(), Repr::Bool(b))
    }

    pub fn int(n: i64) -> Value {
        Value::from_parts(Type::int(), Repr::Int(n))
    }

    pub fn int8(n: i8) -> Value {
        Value::from_parts(Type::int8(), Repr::Int(n.into()))
    }

    pub fn int16(n: i16) -> Value {
        Value::from_parts(Type::int16(), Repr::Int(n.into()))
    }

    pub fn int32(n: i32) -> Value {
        Value::from_parts(Type::int32(), Repr::Int(n.into()))
    }

    pub fn int64(n: i64) -> Value {
        Value::from_parts(Type::int64(), Repr::Int(n))
    }

    pub fn uint(n: u64) -> Value {
        Value::from_parts(Type::uint(), Repr::Uint(n))
    }

    pub fn uint8(n: u8) -> Value {
        Value::from_parts(Type::uint8(), Repr::Uint(n.into()))
    }

    pub fn uint16(n: u16) -> Value {
        Value::from_parts(Type::uint16(), Repr::Uint(n.into()))
    }

    pub fn uint32(n: u32) -> Value {
        Value::from_parts(Type::uint32(), Repr::Uint(n.into()))
    }

    pub fn uint64(n: u64) -> Value {
        Value::from_parts(Type::uint64(), Repr::Uint(n))
    }

    pub fn float32(x: f32) -> Value {
        Value::from_parts(Type::float32(), Repr::Float(x.into()))
    }

    pub fn float64(x: f64) -> Value {
        Value::from_parts(Type::float64(), Repr::Float(x))
    }

    pub fn string(s: impl Into<String>) -> Value {
        Value::from_parts(Type::string(), Repr::Str(s.into()))
    }

    pub fn time(t: Time) -> Value {
        Value::from_parts(Type::time(), Repr::Time(t))
    }

    /// A `Duration` of `nanos` nanoseconds.
    pub fn duration(nanos: i64) -> Value {
        Value::from_parts(Type::duration(), Repr::Int(nanos))
    }

    /// A non-nil `[]uint8`.
    pub fn bytes(b: impl AsRef<[u8]>) -> Value {
        let items = b.as_ref().iter().map(|x| Value::uint8(*x)).collect();
        Value::from_parts(
            Type::bytes(),
            Repr::Slice(Some(Arc::new(RwLock::new(items)))),
        )
    }

    /// A signed integer of the named type `ty`.
    pub fn of_int(ty: &Type, n: i64) -> Result<Value, DomainError> {
        if !ty.kind().is_int() {
            return Err(wrong_kind("of_int", ty));
        }
        let (lo, hi) = ty.kind().int_range();
        if n < lo || n > hi {
            return Err(DomainError::ValueOutOfRange {
                value: n.to_string(),
                type_name: ty.to_string(),
            });
        }
        Ok(Value::from_parts(ty.clone(), Repr::Int(n)))
    }

    /// An unsigned integer of the named type `ty`.
    pub fn of_uint(ty: &Type, n: u64) -> Result<Value, DomainError> {
        if !ty.kind().is_uint() {
            return Err(wrong_kind("of_uint", ty));
        }
        if n > ty.kind().uint_max() {
            return Err(DomainError::ValueOutOfRange {
                value: n.to_string(),
                type_name: ty.to_string(),
            });
        }
        Ok(Value::from_parts(ty.clone(), Repr::Uint(n)))
    }

    pub fn of_float(ty: &Type, x: f64) -> Result<Value, DomainError> {
        match ty.kind() {
            Kind::Float64 => Ok(Value::from_parts(ty.clone(), Repr::Float(x))),
            Kind::Float32 => Ok(Value::from_parts(ty.clone(), Repr::Float(f64::from(x as f32)))),
            _ => Err(wrong_kind("of_float", ty)),
        }
    }

    pub fn of_string(ty: &Type, s: impl Into<String>) -> Result<Value, DomainError> {
        if ty.kind() != Kind::String {
            return Err(wrong_kind("of_string", ty));
        }
        Ok(Value::from_parts(ty.clone(), Repr::Str(s.into())))
    }

    pub fn of_bool(ty: &Type, b: bool) -> Result<Value, DomainError> {
        if ty.kind() != Kind::Bool {
            return Err(wrong_kind("of_bool", ty));
        }
        Ok(Value::from_parts(ty.clone(), Repr::Bool(b)))
    }

    /// A non-nil `[]elem`.
    pub fn slice(elem: &Type, items: Vec<Value>) -> Result<Value, DomainError> {
        Value::new_slice(&Type::slice_of(elem), items)
    }

    /// A non-nil slice of the (possibly named) slice type `ty`.
    pub fn new_slice(ty: &Type, items: Vec<Value>) -> Result<Value, DomainError> {
        let elem = elem_of(ty, Kind::Slice, "new_slice")?;
        let items = items
            .into_iter()
            .map(|v| coerce(v, &elem))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::from_parts(
            ty.clone(),
            Repr::Slice(Some(Arc::new(RwLock::new(items)))),
        ))
    }

    /// A `[len(items)]elem` array.
    pub fn array(elem: &Type, items: Vec<Value>) -> Result<Value, DomainError> {
        let ty = Type::array_of(elem, items.len());
        let items = items
            .into_iter()
            .map(|v| coerce(v, elem))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::from_parts(ty, Repr::Array(items)))
    }

    /// A non-nil `map[key]elem`.
    pub fn map(key: &Type, elem: &Type, pairs: Vec<(Value, Value)>) -> Result<Value, DomainError> {
        Value::new_map(&Type::map_of(key, elem), pairs)
    }

    /// A non-nil map of the (possibly named) map type `ty`.
    pub fn new_map(ty: &Type, pairs: Vec<(Value, Value)>) -> Result<Value, DomainError> {
        if ty.kind() != Kind::Map {
            return Err(wrong_kind("new_map", ty));
        }
        let mut map = Value::zero(ty);
        map.ensure_map(true);
        for (k, v) in pairs {
            map.map_insert(k, v)?;
        }
        Ok(map)
    }

    /// A struct of type `ty` from positional field values.
    pub fn structure(ty: &Type, fields: Vec<Value>) -> Result<Value, DomainError> {
        if ty.kind() != Kind::Struct {
            return Err(wrong_kind("structure", ty));
        }
        let declared = ty.fields();
        if declared.len() != fields.len() {
            return Err(DomainError::OutOfRange {
                index: fields.len(),
                len: declared.len(),
            });
        }
        let fields = fields
            .into_iter()
            .zip(declared)
            .map(|(v, f)| coerce(v, f.ty()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::from_parts(ty.clone(), Repr::Struct(fields)))
    }

    /// A pointer to a fresh cell holding `v`.
    pub fn ptr(v: Value) -> Value {
        let ty = Type::ptr_to(&v.ty);
        Value::from_parts(ty, Repr::Ptr(Some(Arc::new(RwLock::new(v)))))
    }

    pub fn nil_ptr(elem: &Type) -> Value {
        Value::zero(&Type::ptr_to(elem))
    }

    /// `v` stored in an `any`.
    pub fn boxed(v: Value) -> Value {
        box_into(v, &Type::any())
    }

    /// `v` stored in the interface type `iface`.
    pub fn boxed_as(iface: &Type, v: Value) -> Result<Value, DomainError> {
        if iface.kind() != Kind::Interface {
            return Err(wrong_kind("boxed_as", iface));
        }
        Ok(box_into(v, iface))
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn kind(&self) -> Kind {
        self.ty.kind()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.repr {
            Repr::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.repr {
            Repr::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self.repr {
            Repr::Uint(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.repr {
            Repr::Float(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.repr {
            Repr::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<&Time> {
        match &self.repr {
            Repr::Time(t) => Some(t),
            _ => None,
        }
    }

    /// Contents of a byte slice; `None` for other types and for nil.
    pub fn as_bytes(&self) -> Option<Vec<u8>> {
        if !self.ty.is_bytes() {
            return None;
        }
        let data = self.slice_data()?;
        let items = data.read();
        items
            .iter()
            .map(|b| b.as_u64().and_then(|n| u8::try_from(n).ok()))
            .collect()
    }

    pub fn is_nil(&self) -> bool {
        matches!(
            self.repr,
            Repr::Slice(None) | Repr::Map(None) | Repr::Ptr(None) | Repr::Interface(None)
        )
    }

    /// Whether this is the zero value of its type.
    pub fn is_zero(&self) -> bool {
        match &self.repr {
            Repr::Bool(b) => !b,
            Repr::Int(n) => *n == 0,
            Repr::Uint(n) => *n == 0,
            Repr::Float(x) => *x == 0.0,
            Repr::Str(s) => s.is_empty(),
            Repr::Time(t) => *t == epoch(),
            Repr::Array(items) | Repr::Struct(items) => items.iter().all(Value::is_zero),
            _ => self.is_nil(),
        }
    }

    /// Byte length of strings, element count of arrays, slices and maps.
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Str(s) => s.len(),
            Repr::Array(items) => items.len(),
            Repr::Slice(Some(data)) => data.read().len(),
            Repr::Map(Some(data)) => data.read().len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Struct fields in declaration order; empty for other kinds.
    pub fn fields(&self) -> &[Value] {
        match &self.repr {
            Repr::Struct(fields) => fields,
            _ => &[],
        }
    }

    pub fn field(&self, i: usize) -> Option<&Value> {
        self.fields().get(i)
    }

    pub fn field_mut(&mut self, i: usize) -> Option<&mut Value> {
        match &mut self.repr {
            Repr::Struct(fields) => fields.get_mut(i),
            _ => None,
        }
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Value> {
        self.ty.field_index(name).and_then(|i| self.field(i))
    }

    pub fn set_field(&mut self, name: &str, v: Value) -> Result<(), DomainError> {
        let no_field = |ty: &Type| DomainError::NoSuchField {
            type_name: ty.to_string(),
            field: name.to_string(),
        };
        let ty = self.ty.clone();
        let i = ty.field_index(name).ok_or_else(|| no_field(&ty))?;
        let v = coerce(v, ty.fields()[i].ty())?;
        let slot = self.field_mut(i).ok_or_else(|| no_field(&ty))?;
        *slot = v;
        Ok(())
    }

    /// Snapshot of the pointee.
    pub fn elem(&self) -> Option<Value> {
        self.cell().map(|c| c.read().clone())
    }

    pub fn cell(&self) -> Option<&Cell> {
        match &self.repr {
            Repr::Ptr(Some(cell)) => Some(cell),
            _ => None,
        }
    }

    /// Concrete value stored in an interface.
    pub fn payload(&self) -> Option<&Value> {
        match &self.repr {
            Repr::Interface(Some(v)) => Some(v),
            _ => None,
        }
    }

    /// Snapshot of array or slice elements.
    pub fn items(&self) -> Vec<Value> {
        match &self.repr {
            Repr::Array(items) => items.clone(),
            Repr::Slice(Some(data)) => data.read().clone(),
            _ => Vec::new(),
        }
    }

    pub fn index(&self, i: usize) -> Option<Value> {
        match &self.repr {
            Repr::Array(items) => items.get(i).cloned(),
            Repr::Slice(Some(data)) => data.read().get(i).cloned(),
            _ => None,
        }
    }

    /// Append to a slice, allocating it if nil. The backing storage is
    /// shared with every copy of this value.
    pub fn push(&mut self, v: Value) -> Result<(), DomainError> {
        let elem = elem_of(&self.ty, Kind::Slice, "push")?;
        let v = coerce(v, &elem)?;
        match &mut self.repr {
            Repr::Slice(Some(data)) => data.write().push(v),
            repr => *repr = Repr::Slice(Some(Arc::new(RwLock::new(vec![v])))),
        }
        Ok(())
    }

    pub fn map_get(&self, key: &Value) -> Option<Value> {
        let data = self.map_data()?;
        let key = coerce(key.clone(), self.ty.key()?).ok()?;
        let mk = key.map_key().ok()?;
        data.read().get(&mk).map(|(_, v)| v.clone())
    }

    /// Insert into a map, allocating it if nil.
    pub fn map_insert(&mut self, key: Value, v: Value) -> Result<(), DomainError> {
        let key_ty = self.ty.key().cloned().ok_or_else(|| wrong_kind("map_insert", &self.ty))?;
        let elem = elem_of(&self.ty, Kind::Map, "map_insert")?;
        let key = coerce(key, &key_ty)?;
        let v = coerce(v, &elem)?;
        let mk = key.map_key()?;
        let data = self
            .ensure_map(false)
            .ok_or_else(|| wrong_kind("map_insert", &self.ty))?;
        data.write().insert(mk, (key, v));
        Ok(())
    }

    /// Snapshot of map entries in key order.
    pub fn map_entries(&self) -> Vec<(Value, Value)> {
        match self.map_data() {
            Some(data) => data.read().values().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// The hashable projection of this value.
    pub fn map_key(&self) -> Result<MapKey, DomainError> {
        Ok(match &self.repr {
            Repr::Bool(b) => MapKey::Bool(*b),
            Repr::Int(n) => MapKey::Int(*n),
            Repr::Uint(n) => MapKey::Uint(*n),
            Repr::Float(x) => MapKey::Float(if *x == 0.0 { 0 } else { x.to_bits() }),
            Repr::Str(s) => MapKey::Str(s.clone()),
            Repr::Time(t) => MapKey::Time(t.timestamp(), t.timestamp_subsec_nanos()),
            Repr::Array(items) | Repr::Struct(items) => MapKey::Seq(
                items
                    .iter()
                    .map(Value::map_key)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Repr::Ptr(None) | Repr::Interface(None) => MapKey::Nil,
            Repr::Ptr(Some(cell)) => MapKey::Addr(addr(cell)),
            Repr::Interface(Some(v)) => MapKey::Dyn(v.ty.id(), Box::new(v.map_key()?)),
            Repr::Slice(_) | Repr::Map(_) => {
                return Err(DomainError::UncomparableKey {
                    key_type: self.ty.to_string(),
                });
            }
        })
    }

    /// Assign `v`, boxing it when this slot is an interface.
    pub fn set(&mut self, v: Value) -> Result<(), DomainError> {
        *self = coerce(v, &self.ty)?;
        Ok(())
    }

    /// Write through a pointer.
    pub fn store(&self, v: Value) -> Result<(), DomainError> {
        let elem = elem_of(&self.ty, Kind::Ptr, "store")?;
        let cell = self.cell().ok_or_else(|| DomainError::NilDereference {
            type_name: self.ty.to_string(),
        })?;
        let v = coerce(v, &elem)?;
        *cell.write() = v;
        Ok(())
    }

    /// Address of the shared storage behind a pointer, slice or map.
    pub fn identity(&self) -> Option<usize> {
        match &self.repr {
            Repr::Ptr(Some(cell)) => Some(addr(cell)),
            Repr::Slice(Some(data)) => Some(addr(data)),
            Repr::Map(Some(data)) => Some(addr(data)),
            _ => None,
        }
    }

    // ── crate internals ──────────────────────────────────────────────────

    pub(crate) fn from_parts(ty: Type, repr: Repr) -> Value {
        Value { ty, repr }
    }

    pub(crate) fn repr(&self) -> &Repr {
        &self.repr
    }

    /// Replace the representation, keeping the slot type.
    pub(crate) fn put(&mut self, repr: Repr) {
        self.repr = repr;
    }

    /// The pointee cell of a pointer slot, allocating a zero pointee when
    /// nil or when `fresh` is requested.
    pub(crate) fn alloc_cell(&mut self, fresh: bool) -> Option<Cell> {
        let elem = self.ty.elem()?.clone();
        match &mut self.repr {
            Repr::Ptr(Some(cell)) if !fresh => Some(cell.clone()),
            Repr::Ptr(slot) => {
                let cell = Arc::new(RwLock::new(Value::zero(&elem)));
                *slot = Some(cell.clone());
                Some(cell)
            }
            _ => None,
        }
    }

    /// The pointee cell of an interface holding a non-nil pointer.
    pub(crate) fn payload_cell(&self) -> Option<Cell> {
        self.payload().and_then(|p| p.cell().cloned())
    }

    pub(crate) fn slice_data(&self) -> Option<&SliceData> {
        match &self.repr {
            Repr::Slice(Some(data)) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn map_data(&self) -> Option<&MapData> {
        match &self.repr {
            Repr::Map(Some(data)) => Some(data),
            _ => None,
        }
    }

    /// The storage of a map slot, allocating it when nil or when `fresh`.
    pub(crate) fn ensure_map(&mut self, fresh: bool) -> Option<MapData> {
        match &mut self.repr {
            Repr::Map(Some(data)) if !fresh => Some(data.clone()),
            Repr::Map(slot) => {
                let data: MapData = Arc::new(RwLock::new(BTreeMap::new()));
                *slot = Some(data.clone());
                Some(data)
            }
            _ => None,
        }
    }
}

// ── equality ─────────────────────────────────────────────────────────────────

fn deep_eq(a: &Value, b: &Value, seen: &mut HashSet<(usize, usize)>) -> bool {
    if a.ty != b.ty {
        return false;
    }
    match (&a.repr, &b.repr) {
        (Repr::Bool(x), Repr::Bool(y)) => x == y,
        (Repr::Int(x), Repr::Int(y)) => x == y,
        (Repr::Uint(x), Repr::Uint(y)) => x == y,
        (Repr::Float(x), Repr::Float(y)) => x == y,
        (Repr::Str(x), Repr::Str(y)) => x == y,
        (Repr::Time(x), Repr::Time(y)) => x == y,
        (Repr::Array(x), Repr::Array(y)) | (Repr::Struct(x), Repr::Struct(y)) => {
            seq_eq(x, y, seen)
        }
        (Repr::Slice(x), Repr::Slice(y)) => match (x, y) {
            (None, None) => true,
            (Some(x), Some(y)) => {
                if Arc::ptr_eq(x, y) || !seen.insert((addr(x), addr(y))) {
                    return true;
                }
                let (xs, ys) = (x.read().clone(), y.read().clone());
                seq_eq(&xs, &ys, seen)
            }
            _ => false,
        },
        (Repr::Map(x), Repr::Map(y)) => match (x, y) {
            (None, None) => true,
            (Some(x), Some(y)) => {
                if Arc::ptr_eq(x, y) || !seen.insert((addr(x), addr(y))) {
                    return true;
                }
                let (xs, ys) = (x.read().clone(), y.read().clone());
                xs.len() == ys.len()
                    && xs.iter().all(|(k, (_, xv))| {
                        ys.get(k).is_some_and(|(_, yv)| deep_eq(xv, yv, seen))
                    })
            }
            _ => false,
        },
        (Repr::Ptr(x), Repr::Ptr(y)) => match (x, y) {
            (None, None) => true,
            (Some(x), Some(y)) => {
                if Arc::ptr_eq(x, y) || !seen.insert((addr(x), addr(y))) {
                    return true;
                }
                let (xv, yv) = (x.read().clone(), y.read().clone());
                deep_eq(&xv, &yv, seen)
            }
            _ => false,
        },
        (Repr::Interface(x), Repr::Interface(y)) => match (x, y) {
            (None, None) => true,
            (Some(x), Some(y)) => deep_eq(x, y, seen),
            _ => false,
        },
        _ => false,
    }
}

fn seq_eq(xs: &[Value], ys: &[Value], seen: &mut HashSet<(usize, usize)>) -> bool {
    xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_eq(x, y, seen))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        deep_eq(self, other, &mut HashSet::new())
    }
}

// ── formatting ───────────────────────────────────────────────────────────────

fn write_value(
    v: &Value,
    f: &mut fmt::Formatter<'_>,
    active: &mut Vec<usize>,
    quote: bool,
) -> fmt::Result {
    match &v.repr {
        Repr::Bool(b) => write!(f, "{b}"),
        Repr::Int(n) => write!(f, "{n}"),
        Repr::Uint(n) => write!(f, "{n}"),
        Repr::Float(x) if v.kind() == Kind::Float32 => write!(f, "{}", *x as f32),
        Repr::Float(x) => write!(f, "{x}"),
        Repr::Str(s) if quote => write!(f, "{s:?}"),
        Repr::Str(s) => f.write_str(s),
        Repr::Time(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        Repr::Array(items) => write_seq(f, items, active),
        Repr::Struct(fields) => {
            write!(f, "{}{{", v.ty)?;
            for (i, (decl, field)) in v.ty.fields().iter().zip(fields).enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}: ", decl.name())?;
                write_value(field, f, active, true)?;
            }
            f.write_str("}")
        }
        Repr::Slice(Some(data)) => guarded(f, addr(data), active, |f, active| {
            let items = data.read().clone();
            write_seq(f, &items, active)
        }),
        Repr::Map(Some(data)) => guarded(f, addr(data), active, |f, active| {
            let entries: Vec<_> = data.read().values().cloned().collect();
            f.write_str("map[")?;
            for (i, (k, val)) in entries.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write_value(k, f, active, true)?;
                f.write_str(":")?;
                write_value(val, f, active, true)?;
            }
            f.write_str("]")
        }),
        Repr::Ptr(Some(cell)) => guarded(f, addr(cell), active, |f, active| {
            let pointee = cell.read().clone();
            f.write_str("&")?;
            write_value(&pointee, f, active, true)
        }),
        Repr::Interface(Some(payload)) => write_value(payload, f, active, quote),
        Repr::Slice(None) | Repr::Map(None) | Repr::Ptr(None) | Repr::Interface(None) => {
            f.write_str("nil")
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Value], active: &mut Vec<usize>) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write_value(item, f, active, true)?;
    }
    f.write_str("]")
}

fn guarded(
    f: &mut fmt::Formatter<'_>,
    id: usize,
    active: &mut Vec<usize>,
    body: impl FnOnce(&mut fmt::Formatter<'_>, &mut Vec<usize>) -> fmt::Result,
) -> fmt::Result {
    if active.contains(&id) {
        return f.write_str("<cycle>");
    }
    active.push(id);
    let result = body(f, active);
    active.pop();
    result
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.ty)?;
        write_value(self, f, &mut Vec::new(), true)?;
        f.write_str(")")
    }
}

/// Strings display bare; everything else as in `Debug` without the type.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(self, f, &mut Vec::new(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::types::TypeBuilder;

    fn point() -> Type {
        TypeBuilder::structure("Point")
            .field("X", &Type::int())
            .field("Y", &Type::int())
            .build()
            .unwrap()
    }

    #[test]
    fn zero_values() {
        assert!(Value::zero(&Type::int()).is_zero());
        assert!(Value::zero(&Type::slice_of(&Type::int())).is_nil());
        assert_eq!(Value::zero(&Type::time()).as_time(), Some(&epoch()));
        let p = Value::zero(&point());
        assert_eq!(p.fields().len(), 2);
        assert!(p.is_zero());
    }

    #[test]
    fn nil_and_empty_slices_differ() {
        let nil = Value::zero(&Type::slice_of(&Type::int()));
        let empty = Value::slice(&Type::int(), vec![]).unwrap();
        assert_ne!(nil, empty);
        assert!(empty.is_empty());
        assert!(!empty.is_nil());
    }

    #[test]
    fn equality_requires_same_type() {
        assert_eq!(Value::int(1), Value::int(1));
        assert_ne!(Value::int(1), Value::int64(1));
        assert_ne!(Value::int(1), Value::int(2));
    }

    #[test]
    fn clones_share_slice_storage() {
        let a = Value::slice(&Type::int(), vec![Value::int(1)]).unwrap();
        let mut b = a.clone();
        b.push(Value::int(2)).unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn struct_fields_by_name() {
        let mut p = Value::structure(&point(), vec![Value::int(1), Value::int(2)]).unwrap();
        p.set_field("Y", Value::int(5)).unwrap();
        assert_eq!(p.field_by_name("Y").and_then(Value::as_i64), Some(5));
        assert!(p.set_field("Z", Value::int(0)).is_err());
        assert!(p.set_field("X", Value::string("no")).is_err());
    }

    #[test]
    fn interface_slots_box_values() {
        let mut slot = Value::nil();
        slot.set(Value::int(3)).unwrap();
        assert_eq!(slot.payload().and_then(Value::as_i64), Some(3));
        let items = Value::slice(&Type::any(), vec![Value::string("a"), Value::int(1)]).unwrap();
        assert_eq!(items.index(0).unwrap().payload().and_then(|v| v.as_str().map(String::from)), Some("a".into()));
    }

    #[test]
    fn maps_insert_and_lookup() {
        let m = Value::map(
            &Type::string(),
            &Type::int(),
            vec![(Value::string("b"), Value::int(2)), (Value::string("a"), Value::int(1))],
        )
        .unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.map_get(&Value::string("a")), Some(Value::int(1)));
        let keys: Vec<_> = m.map_entries().into_iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn slices_are_not_keys() {
        let key = Value::bytes(b"k");
        assert!(matches!(key.map_key(), Err(DomainError::UncomparableKey { .. })));
    }

    #[test]
    fn pointers_compare_by_pointee() {
        let a = Value::ptr(Value::int(1));
        let b = Value::ptr(Value::int(1));
        assert_eq!(a, b);
        assert_ne!(a.identity(), b.identity());
        b.store(Value::int(2)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn cyclic_values_compare_and_print() {
        let node = TypeBuilder::structure("Node");
        let handle = node.handle();
        let node = node.field("Next", &Type::ptr_to(&handle)).build().unwrap();

        let a = Value::ptr(Value::zero(&node));
        let mut inner = a.elem().unwrap();
        inner.set_field("Next", a.clone()).unwrap();
        a.store(inner).unwrap();

        assert_eq!(a, a.clone());
        assert!(format!("{a:?}").contains("<cycle>"));
    }

    #[test]
    fn ranged_constructors() {
        let small = TypeBuilder::named("Small", &Type::int8()).build().unwrap();
        assert!(Value::of_int(&small, 127).is_ok());
        assert!(matches!(
            Value::of_int(&small, 128),
            Err(DomainError::ValueOutOfRange { .. })
        ));
        assert!(Value::of_uint(&small, 1).is_err());
    }

    #[test]
    fn display_is_bare() {
        assert_eq!(Value::string("x").to_string(), "x");
        assert_eq!(Value::float32(1.1).to_string(), "1.1");
        let s = Value::slice(&Type::string(), vec![Value::string("x")]).unwrap();
        assert_eq!(s.to_string(), r#"["x"]"#);
    }

    #[test]
    fn bytes_round_trip() {
        assert_eq!(Value::bytes(b"hi").as_bytes(), Some(b"hi".to_vec()));
        assert_eq!(Value::zero(&Type::bytes()).as_bytes(), None);
    }
}
