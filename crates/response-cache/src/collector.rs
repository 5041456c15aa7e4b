use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use crate::{CacheHint, CachePolicy, FieldDefinition};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// Position of a value in the response, from the root field down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResponsePath(im::Vector<PathSegment>);

impl ResponsePath {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn field(&self, name: impl Into<String>) -> Self {
        let mut child = self.clone();
        child.0.push_back(PathSegment::Field(name.into()));
        child
    }

    pub fn index(&self, index: usize) -> Self {
        let mut child = self.clone();
        child.0.push_back(PathSegment::Index(index));
        child
    }

    pub fn parent(&self) -> Option<Self> {
        let mut parent = self.clone();
        parent.0.pop_back()?;
        Some(parent)
    }

    /// Root fields have no parent in the response.
    pub fn is_root_field(&self) -> bool {
        self.0.len() == 1
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathSegment> {
        self.0.iter()
    }

    /// Enclosing field paths, closest first. List items are skipped, they never carry hints.
    fn field_ancestors(&self) -> impl Iterator<Item = ResponsePath> {
        std::iter::successors(self.parent(), ResponsePath::parent)
            .filter(|path| matches!(path.0.last(), Some(PathSegment::Field(_))))
    }
}

impl fmt::Display for ResponsePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                PathSegment::Field(name) => f.write_str(name)?,
                PathSegment::Index(index) => write!(f, "{index}")?,
            }
        }
        Ok(())
    }
}

/// Collects the cache hint of every field of a single execution, indexed by response path.
///
/// Cloning is cheap and clones share the same table, so resolvers running concurrently can each
/// hold one.
#[derive(Clone, Debug)]
pub struct HintCollector {
    default_max_age: Duration,
    hints: Arc<Mutex<HashMap<ResponsePath, CacheHint>>>,
}

impl HintCollector {
    pub fn new(default_max_age: Duration) -> Self {
        HintCollector {
            default_max_age,
            hints: Arc::default(),
        }
    }

    fn table(&self) -> MutexGuard<'_, HashMap<ResponsePath, CacheHint>> {
        self.hints.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Computes the annotation derived hint of a field about to be resolved and records it.
    /// The returned handle lets the resolver adjust it.
    pub fn will_resolve_field(&self, field: &FieldDefinition<'_>, path: &ResponsePath) -> FieldCacheHandle {
        let mut policy = CachePolicy::new();
        let mut has_scope = false;
        let mut inherit_max_age = false;

        if field.returns_composite_type {
            if let Some(type_hint) = &field.type_hint {
                policy.replace(type_hint);
                has_scope |= type_hint.scope.is_some();
                inherit_max_age = type_hint.inherit_max_age;
            }
        }

        if let Some(field_hint) = &field.field_hint {
            if field_hint.inherit_max_age && policy.max_age().is_none() {
                inherit_max_age = true;
                policy.replace(&CacheHint {
                    scope: field_hint.scope,
                    ..CacheHint::default()
                });
            } else {
                policy.replace(field_hint);
            }
            has_scope |= field_hint.scope.is_some();
        }

        let mut hint = CacheHint {
            max_age: policy.max_age(),
            scope: has_scope.then(|| policy.scope()),
            inherit_max_age,
        };

        if hint.max_age.is_none() {
            let inherited = if inherit_max_age {
                self.ancestor_max_age(path)
            } else {
                None
            };

            hint.max_age = match inherited {
                Some(max_age) => Some(max_age),
                None if field.returns_composite_type || path.is_root_field() => Some(self.default_max_age),
                None => None,
            };
        }

        if !hint.is_empty() {
            self.table().insert(path.clone(), hint);
        }

        FieldCacheHandle {
            collector: self.clone(),
            path: path.clone(),
        }
    }

    fn ancestor_max_age(&self, path: &ResponsePath) -> Option<Duration> {
        let table = self.table();
        path.field_ancestors()
            .find_map(|ancestor| table.get(&ancestor).and_then(|hint| hint.max_age))
    }

    /// The hint currently recorded for a path, if any.
    pub fn hint(&self, path: &ResponsePath) -> Option<CacheHint> {
        self.table().get(path).copied()
    }

    pub fn hints(&self) -> Vec<(ResponsePath, CacheHint)> {
        self.table()
            .iter()
            .map(|(path, hint)| (path.clone(), *hint))
            .collect()
    }

    /// Reduces every recorded hint into a fresh policy.
    pub fn overall_policy(&self) -> CachePolicy {
        let mut policy = CachePolicy::new();
        self.fold_into(&mut policy);
        policy
    }

    /// Restricts `policy` with every recorded hint.
    pub fn fold_into(&self, policy: &mut CachePolicy) {
        for hint in self.table().values() {
            policy.restrict(hint);
        }
    }
}

/// Given to the resolver of a field to override the hint computed from annotations.
#[derive(Clone, Debug)]
pub struct FieldCacheHandle {
    collector: HintCollector,
    path: ResponsePath,
}

impl FieldCacheHandle {
    pub fn path(&self) -> &ResponsePath {
        &self.path
    }

    pub fn cache_hint(&self) -> CacheHint {
        self.collector.hint(&self.path).unwrap_or_default()
    }

    /// Overwrites the fields present in `hint`, the last call wins.
    pub fn set_cache_hint(&self, hint: CacheHint) {
        self.update(|policy| policy.replace(&hint), hint.scope.is_some());
    }

    /// Only applies `hint` where it makes the field's hint stricter.
    pub fn restrict_cache_hint(&self, hint: CacheHint) {
        self.update(|policy| policy.restrict(&hint), hint.scope.is_some());
    }

    fn update(&self, f: impl FnOnce(&mut CachePolicy), sets_scope: bool) {
        let mut table = self.collector.table();
        let current = table.get(&self.path).copied().unwrap_or_default();

        let mut policy = CachePolicy::new();
        policy.replace(&current);
        f(&mut policy);

        let hint = CacheHint {
            max_age: policy.max_age(),
            scope: (current.scope.is_some() || sets_scope).then(|| policy.scope()),
            inherit_max_age: current.inherit_max_age,
        };

        if hint.is_empty() {
            table.remove(&self.path);
        } else {
            table.insert(self.path.clone(), hint);
        }
    }
}
