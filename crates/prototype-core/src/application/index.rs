//! Structural index of struct types.
//!
//! For every `(struct type, tag key, accessor prefixes)` the engine computes,
//! once, the flattened list of reachable fields (promoted through untagged
//! embedded structs), which descriptor wins each label, and which getter and
//! setter methods serve each field.
//!
//! Dominance follows embedding rules: the shallowest descriptor wins; at
//! equal depth a single tagged descriptor beats untagged ones; anything else
//! is ambiguous and the label has no dominant. Every descriptor that does not
//! win its label is recessive and is matched by full name instead.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use tracing::debug;

use crate::application::options::Options;
use crate::domain::{Kind, Method, Type, TypeId};

#[derive(Debug, Clone)]
pub(crate) struct FieldDescriptor {
    /// Field positions from the indexed struct down to this field.
    pub(crate) index: Vec<usize>,
    pub(crate) name: String,
    /// Dotted declared names along `index`, e.g. `Inner.Leaf.A`.
    pub(crate) full_name: String,
    pub(crate) label: String,
    pub(crate) tagged: bool,
    pub(crate) ignored: bool,
    pub(crate) omit_empty: bool,
    pub(crate) exported: bool,
    pub(crate) getter: Option<Method>,
    pub(crate) setter: Option<Method>,
}

impl FieldDescriptor {
    pub(crate) fn depth(&self) -> usize {
        self.index.len().saturating_sub(1)
    }
}

#[derive(Debug, Default)]
pub(crate) struct StructIndex {
    fields: Vec<FieldDescriptor>,
    dominants: Vec<usize>,
    by_label: HashMap<String, usize>,
    recessives: BTreeMap<String, Vec<usize>>,
}

impl StructIndex {
    /// Dominant descriptors in discovery order.
    pub(crate) fn dominants(&self) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.dominants.iter().map(|&i| &self.fields[i])
    }

    /// The dominant for `label`: exact match first, then the comparer.
    pub(crate) fn dominant(&self, label: &str, opts: &Options) -> Option<&FieldDescriptor> {
        if let Some(&i) = self.by_label.get(label) {
            return Some(&self.fields[i]);
        }
        self.dominants()
            .find(|fd| opts.names_match(&fd.label, label))
    }

    pub(crate) fn recessive_labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.recessives.keys().map(String::as_str)
    }

    /// Recessive descriptors for `label`, matched like [`Self::dominant`].
    pub(crate) fn recessives(&self, label: &str, opts: &Options) -> Vec<&FieldDescriptor> {
        let list = self.recessives.get(label).or_else(|| {
            self.recessives
                .iter()
                .find(|(l, _)| opts.names_match(l, label))
                .map(|(_, list)| list)
        });
        list.map(|list| list.iter().map(|&i| &self.fields[i]).collect())
            .unwrap_or_default()
    }
}

type IndexKey = (TypeId, String, String, String);

fn cache() -> &'static DashMap<IndexKey, Arc<StructIndex>> {
    static CACHE: OnceLock<DashMap<IndexKey, Arc<StructIndex>>> = OnceLock::new();
    CACHE.get_or_init(DashMap::new)
}

/// The index of `ty` under `tag_key`, built on first use.
pub(crate) fn index_of(ty: &Type, tag_key: &str, opts: &Options) -> Arc<StructIndex> {
    let key = (
        ty.id(),
        tag_key.to_string(),
        opts.getter_prefix.clone(),
        opts.setter_prefix.clone(),
    );
    if let Some(found) = cache().get(&key) {
        return found.clone();
    }

    let built = Arc::new(build(ty, tag_key, &opts.getter_prefix, &opts.setter_prefix));
    debug!(
        type_name = %ty,
        tag_key,
        fields = built.fields.len(),
        dominants = built.dominants.len(),
        "struct index built"
    );
    cache().entry(key).or_insert(built).clone()
}

fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn accessor(owner: &Type, prefix: &str, field: &str, want_getter: bool) -> Option<Method> {
    let name = format!("{prefix}{}", upper_first(field));
    owner
        .method(&name)
        .filter(|m| if want_getter { m.is_getter() } else { m.is_setter() })
        .cloned()
}

fn struct_of(ty: &Type) -> Option<Type> {
    let ty = ty.deref();
    (ty.kind() == Kind::Struct).then_some(ty)
}

fn build(root: &Type, tag_key: &str, getter_prefix: &str, setter_prefix: &str) -> StructIndex {
    let mut fields = Vec::new();
    let mut visited: HashSet<TypeId> = HashSet::new();
    let mut level: VecDeque<(Type, Vec<usize>, String)> = VecDeque::new();
    level.push_back((root.clone(), Vec::new(), String::new()));

    while !level.is_empty() {
        let mut next = VecDeque::new();
        let mut this_level = HashSet::new();
        for (owner, base, prefix) in level.drain(..) {
            // the same type twice at one depth yields equal-depth duplicates
            if visited.contains(&owner.id()) {
                continue;
            }
            this_level.insert(owner.id());
            for (i, f) in owner.fields().iter().enumerate() {
                let mut index = base.clone();
                index.push(i);
                let full_name = format!("{prefix}{}", f.name());
                let spec = f.tag().lookup(tag_key);
                let label = spec.as_ref().and_then(|s| s.label()).map(str::to_string);

                if f.is_embedded() && label.is_none() && !spec.as_ref().is_some_and(|s| s.is_skip()) {
                    if let Some(inner) = struct_of(f.ty()) {
                        next.push_back((inner, index, format!("{full_name}.")));
                        continue;
                    }
                }

                fields.push(FieldDescriptor {
                    index,
                    name: f.name().to_string(),
                    full_name,
                    tagged: label.is_some(),
                    label: label.unwrap_or_else(|| f.name().to_string()),
                    ignored: spec.as_ref().is_some_and(|s| s.is_skip()),
                    omit_empty: spec.as_ref().is_some_and(|s| s.has_option("omitempty")),
                    exported: f.is_exported(),
                    getter: accessor(&owner, getter_prefix, f.name(), true),
                    setter: accessor(&owner, setter_prefix, f.name(), false),
                });
            }
        }
        visited.extend(this_level);
        level = next;
    }

    resolve(fields)
}

fn resolve(fields: Vec<FieldDescriptor>) -> StructIndex {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, fd) in fields.iter().enumerate() {
        if !fd.ignored {
            groups.entry(fd.label.as_str()).or_default().push(i);
        }
    }

    let mut winners = HashMap::new();
    let mut recessives: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (label, candidates) in &groups {
        let shallowest = candidates
            .iter()
            .map(|&i| fields[i].depth())
            .min()
            .unwrap_or_default();
        let top: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&i| fields[i].depth() == shallowest)
            .collect();
        let winner = match top.as_slice() {
            [only] => Some(*only),
            _ => {
                let tagged: Vec<usize> = top.iter().copied().filter(|&i| fields[i].tagged).collect();
                match tagged.as_slice() {
                    [only] => Some(*only),
                    _ => None,
                }
            }
        };
        if let Some(w) = winner {
            winners.insert(label.to_string(), w);
        }
        let rest: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&i| Some(i) != winner)
            .collect();
        if !rest.is_empty() {
            recessives.insert(label.to_string(), rest);
        }
    }

    let mut dominants: Vec<usize> = winners.values().copied().collect();
    dominants.sort_unstable();

    StructIndex {
        fields,
        dominants,
        by_label: winners,
        recessives,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TypeBuilder, Value};

    fn opts() -> Options {
        Options::default()
    }

    /// `Parent { Inner1, Inner2 { Inner3 { A, B, C }, A, B }, A }`
    fn shadowing() -> Type {
        let inner1 = TypeBuilder::structure("Inner1")
            .field("A", &Type::int())
            .field("B", &Type::int())
            .build()
            .unwrap();
        let inner3 = TypeBuilder::structure("Inner3")
            .field("A", &Type::int())
            .field("B", &Type::int())
            .field("C", &Type::int())
            .build()
            .unwrap();
        let inner2 = TypeBuilder::structure("Inner2")
            .embed(&inner3)
            .field("A", &Type::int())
            .field("B", &Type::int())
            .build()
            .unwrap();
        TypeBuilder::structure("Parent")
            .embed(&inner1)
            .embed(&inner2)
            .field("A", &Type::int())
            .build()
            .unwrap()
    }

    #[test]
    fn shallowest_wins_and_ties_are_ambiguous() {
        let idx = index_of(&shadowing(), "prototype", &opts());

        let a = idx.dominant("A", &opts()).unwrap();
        assert_eq!(a.full_name, "A");
        assert_eq!(a.index, [2]);

        assert!(idx.dominant("B", &opts()).is_none());
        assert_eq!(idx.dominant("C", &opts()).unwrap().full_name, "Inner2.Inner3.C");

        let recessive_a: Vec<_> = idx
            .recessives("A", &opts())
            .iter()
            .map(|fd| fd.full_name.clone())
            .collect();
        assert_eq!(recessive_a, ["Inner1.A", "Inner2.A", "Inner2.Inner3.A"]);
        assert_eq!(idx.recessives("B", &opts()).len(), 3);
        assert_eq!(idx.recessive_labels().collect::<Vec<_>>(), ["A", "B"]);
    }

    #[test]
    fn tagged_field_wins_at_equal_depth() {
        let left = TypeBuilder::structure("Left")
            .tagged_field("Name", &Type::string(), r#"prototype:"title""#)
            .build()
            .unwrap();
        let right = TypeBuilder::structure("Right")
            .field("title", &Type::string())
            .build()
            .unwrap();
        let outer = TypeBuilder::structure("Outer")
            .embed(&left)
            .embed(&right)
            .build()
            .unwrap();
        let idx = index_of(&outer, "prototype", &opts());
        let title = idx.dominant("title", &opts()).unwrap();
        assert!(title.tagged);
        assert_eq!(title.full_name, "Left.Name");
        let shadowed = idx.recessives("title", &opts());
        assert_eq!(shadowed.len(), 1);
        assert_eq!(shadowed[0].full_name, "Right.title");
    }

    #[test]
    fn dash_tag_ignores_and_options_parse() {
        let ty = TypeBuilder::structure("Tagged")
            .tagged_field("Secret", &Type::string(), r#"prototype:"-""#)
            .tagged_field("Note", &Type::string(), r#"prototype:"note,omitempty""#)
            .build()
            .unwrap();
        let idx = index_of(&ty, "prototype", &opts());
        assert!(idx.dominant("Secret", &opts()).is_none());
        assert!(idx.recessives("Secret", &opts()).is_empty());
        let note = idx.dominant("note", &opts()).unwrap();
        assert!(note.omit_empty);

        // a different tag key sees plain names
        let idx = index_of(&ty, "json", &opts());
        assert!(idx.dominant("Secret", &opts()).is_some());
    }

    #[test]
    fn embedded_pointers_are_descended() {
        let base = TypeBuilder::structure("Base")
            .field("ID", &Type::int64())
            .build()
            .unwrap();
        let ty = TypeBuilder::structure("WithPtr")
            .embed(&Type::ptr_to(&base))
            .build()
            .unwrap();
        let idx = index_of(&ty, "prototype", &opts());
        let id = idx.dominant("id", &opts()).unwrap();
        assert_eq!(id.index, [0, 0]);
        assert_eq!(id.full_name, "Base.ID");
    }

    #[test]
    fn accessors_use_prefix_and_upper_first() {
        let ty = TypeBuilder::structure("User")
            .field("name", &Type::string())
            .method(Method::getter("GetName", |v| {
                Ok(v.field(0).cloned().unwrap_or_else(|| Value::string("")))
            }))
            .method(Method::setter("SetName", &Type::string(), |v, x| {
                v.set_field("name", x).map_err(Into::into)
            }))
            .build()
            .unwrap();
        let opts = Options::builder()
            .getter_prefix("Get")
            .setter_prefix("Set")
            .build();
        let idx = index_of(&ty, "prototype", &opts);
        let name = idx.dominant("name", &opts).unwrap();
        assert!(!name.exported);
        assert_eq!(name.getter.as_ref().map(Method::name), Some("GetName"));
        assert_eq!(name.setter.as_ref().map(Method::name), Some("SetName"));

        // different prefixes are cached separately
        let idx = index_of(&ty, "prototype", &Options::default());
        assert!(idx.dominant("name", &Options::default()).unwrap().getter.is_none());
    }

    #[test]
    fn indices_are_memoised() {
        let ty = shadowing();
        let a = index_of(&ty, "prototype", &opts());
        let b = index_of(&ty, "prototype", &opts());
        assert!(Arc::ptr_eq(&a, &b));
    }
}
