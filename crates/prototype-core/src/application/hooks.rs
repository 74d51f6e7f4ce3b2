//! User override tables.
//!
//! Hooks are keyed by `(source selector, target selector)` at three levels:
//! concrete values (deep equality), type identity and kind. The first level
//! that matches wins and is the only action taken for the node.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::domain::{BoxError, FullPath, Kind, Type, TypeId, Value};

/// `hook(path, target, source)`.
pub type HookFn = Arc<dyn Fn(&FullPath, &mut Value, &Value) -> Result<(), BoxError> + Send + Sync>;

/// Which table produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookLevel {
    Value,
    Type,
    Kind,
}

impl HookLevel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Type => "type",
            Self::Kind => "kind",
        }
    }
}

impl fmt::Display for HookLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Default)]
pub struct HookTable {
    values: Vec<(Value, Value, HookFn)>,
    types: HashMap<(TypeId, TypeId), HookFn>,
    kinds: HashMap<(Kind, Kind), HookFn>,
}

impl HookTable {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.types.is_empty() && self.kinds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len() + self.types.len() + self.kinds.len()
    }

    /// Later registrations for the same pair replace earlier ones.
    pub fn add_value(&mut self, source: Value, target: Value, hook: HookFn) {
        self.values.retain(|(s, t, _)| !(*s == source && *t == target));
        self.values.push((source, target, hook));
    }

    pub fn add_type(&mut self, source: &Type, target: &Type, hook: HookFn) {
        self.types.insert((source.id(), target.id()), hook);
    }

    pub fn add_kind(&mut self, source: Kind, target: Kind, hook: HookFn) {
        self.kinds.insert((source, target), hook);
    }

    /// The first hook matching `source → target`, value level first.
    pub fn lookup(&self, target: &Value, source: &Value) -> Option<(HookLevel, HookFn)> {
        if let Some((_, _, hook)) = self
            .values
            .iter()
            .find(|(s, t, _)| s == source && t == target)
        {
            return Some((HookLevel::Value, hook.clone()));
        }
        if let Some(hook) = self.types.get(&(source.ty().id(), target.ty().id())) {
            return Some((HookLevel::Type, hook.clone()));
        }
        self.kinds
            .get(&(source.kind(), target.kind()))
            .map(|hook| (HookLevel::Kind, hook.clone()))
    }
}

impl fmt::Debug for HookTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookTable")
            .field("values", &self.values.len())
            .field("types", &self.types.len())
            .field("kinds", &self.kinds.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> HookFn {
        Arc::new(|_, _, _| Ok(()))
    }

    #[test]
    fn levels_are_consulted_in_order() {
        let mut table = HookTable::default();
        table.add_kind(Kind::Int64, Kind::String, noop());
        table.add_type(&Type::int(), &Type::string(), noop());
        table.add_value(Value::int(7), Value::string(""), noop());

        let target = Value::string("");
        let (level, _) = table.lookup(&target, &Value::int(7)).unwrap();
        assert_eq!(level, HookLevel::Value);
        let (level, _) = table.lookup(&target, &Value::int(8)).unwrap();
        assert_eq!(level, HookLevel::Type);
        let (level, _) = table.lookup(&target, &Value::int64(8)).unwrap();
        assert_eq!(level, HookLevel::Kind);
        assert!(table.lookup(&Value::bool(false), &Value::int(7)).is_none());
    }

    #[test]
    fn value_hooks_replace_by_pair() {
        let mut table = HookTable::default();
        table.add_value(Value::int(1), Value::int(0), noop());
        table.add_value(Value::int(1), Value::int(0), noop());
        assert_eq!(table.len(), 1);
        assert!(!table.is_empty());
    }
}
