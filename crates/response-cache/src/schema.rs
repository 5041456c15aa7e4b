use std::{collections::HashMap, time::Duration};

use async_graphql_parser::{
    types::{BaseType, ConstDirective, TypeKind, TypeSystemDefinition},
    Positioned,
};
use async_graphql_value::ConstValue;

use crate::{CacheHint, CacheScope, Error, OperationType};

const CACHE_CONTROL_DIRECTIVE: &str = "cacheControl";

/// The `@cacheControl` annotations of a schema, along with the type information the hint
/// collector needs for each field.
#[derive(Debug, Clone)]
pub struct CacheControlRegistry {
    types: HashMap<String, TypeEntry>,
    query_type: String,
    mutation_type: String,
    subscription_type: String,
}

#[derive(Debug, Default, Clone)]
struct TypeEntry {
    composite: bool,
    hint: Option<CacheHint>,
    fields: HashMap<String, FieldEntry>,
}

#[derive(Debug, Clone)]
struct FieldEntry {
    return_type: String,
    returns_list: bool,
    hint: Option<CacheHint>,
}

/// Static metadata of a field, as seen when its resolution starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition<'a> {
    pub parent_type: &'a str,
    pub name: &'a str,
    /// Named type returned by the field, list and non-null wrappers removed.
    pub return_type: &'a str,
    pub returns_list: bool,
    /// Whether the named return type is an object, interface or union.
    pub returns_composite_type: bool,
    pub field_hint: Option<CacheHint>,
    pub type_hint: Option<CacheHint>,
}

impl Default for CacheControlRegistry {
    fn default() -> Self {
        CacheControlRegistry {
            types: HashMap::new(),
            query_type: "Query".to_string(),
            mutation_type: "Mutation".to_string(),
            subscription_type: "Subscription".to_string(),
        }
    }
}

impl CacheControlRegistry {
    pub fn from_sdl(sdl: &str) -> Result<Self, Error> {
        let document = async_graphql_parser::parse_schema(sdl).map_err(|err| Error::Schema(err.to_string()))?;
        let mut registry = CacheControlRegistry::default();

        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Schema(schema) => {
                    let schema = schema.node;
                    if let Some(query) = schema.query {
                        registry.query_type = query.node.to_string();
                    }
                    if let Some(mutation) = schema.mutation {
                        registry.mutation_type = mutation.node.to_string();
                    }
                    if let Some(subscription) = schema.subscription {
                        registry.subscription_type = subscription.node.to_string();
                    }
                }
                TypeSystemDefinition::Type(definition) => {
                    let definition = definition.node;
                    let entry = registry.types.entry(definition.name.node.to_string()).or_default();

                    if let Some(hint) = cache_hint_from_directives(&definition.directives) {
                        entry.hint = Some(hint);
                    }

                    let fields = match definition.kind {
                        TypeKind::Object(object) => {
                            entry.composite = true;
                            object.fields
                        }
                        TypeKind::Interface(interface) => {
                            entry.composite = true;
                            interface.fields
                        }
                        TypeKind::Union(_) => {
                            entry.composite = true;
                            Vec::new()
                        }
                        TypeKind::Scalar | TypeKind::Enum(_) | TypeKind::InputObject(_) => Vec::new(),
                    };

                    for field in fields {
                        let field = field.node;
                        let (return_type, returns_list) = named_type(&field.ty.node.base);
                        entry.fields.insert(
                            field.name.node.to_string(),
                            FieldEntry {
                                return_type,
                                returns_list,
                                hint: cache_hint_from_directives(&field.directives),
                            },
                        );
                    }
                }
                TypeSystemDefinition::Directive(_) => {}
            }
        }

        Ok(registry)
    }

    pub fn root_type(&self, operation_type: OperationType) -> &str {
        match operation_type {
            OperationType::Query => &self.query_type,
            OperationType::Mutation => &self.mutation_type,
            OperationType::Subscription => &self.subscription_type,
        }
    }

    pub fn type_hint(&self, type_name: &str) -> Option<CacheHint> {
        self.types.get(type_name).and_then(|ty| ty.hint)
    }

    pub fn is_composite(&self, type_name: &str) -> bool {
        self.types.get(type_name).is_some_and(|ty| ty.composite)
    }

    pub fn field<'a>(&'a self, parent_type: &'a str, name: &'a str) -> Option<FieldDefinition<'a>> {
        let field = self.types.get(parent_type)?.fields.get(name)?;
        let return_type = self.types.get(&field.return_type);

        Some(FieldDefinition {
            parent_type,
            name,
            return_type: &field.return_type,
            returns_list: field.returns_list,
            returns_composite_type: return_type.is_some_and(|ty| ty.composite),
            field_hint: field.hint,
            type_hint: return_type.and_then(|ty| ty.hint),
        })
    }
}

fn named_type(base: &BaseType) -> (String, bool) {
    match base {
        BaseType::Named(name) => (name.to_string(), false),
        BaseType::List(inner) => (named_type(&inner.base).0, true),
    }
}

/// Reads `@cacheControl(maxAge: Int, scope: PUBLIC | PRIVATE, inheritMaxAge: Boolean)`.
/// Arguments of the wrong kind are ignored rather than rejected.
fn cache_hint_from_directives(directives: &[Positioned<ConstDirective>]) -> Option<CacheHint> {
    let directive = directives
        .iter()
        .find(|directive| directive.node.name.node.as_str() == CACHE_CONTROL_DIRECTIVE)?;
    let argument = |name: &str| directive.node.get_argument(name).map(|value| &value.node);

    let max_age = match argument("maxAge") {
        Some(ConstValue::Number(number)) => number.as_u64().map(Duration::from_secs),
        _ => None,
    };
    let scope = match argument("scope") {
        Some(ConstValue::Enum(name)) => name.as_str().parse::<CacheScope>().ok(),
        _ => None,
    };
    let inherit_max_age = matches!(argument("inheritMaxAge"), Some(ConstValue::Boolean(true)));

    Some(CacheHint {
        max_age,
        scope,
        inherit_max_age,
    })
}
