//! A minimal GraphQL executor over an SDL schema. Field values come from registered resolvers or
//! from the parent object, and every field resolution reports to the hint collector the same way a
//! real engine would.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use async_graphql_parser::{
    types::{Selection, SelectionSet, TypeKind, TypeSystemDefinition},
    Positioned,
};
use async_graphql_value::ConstValue;
use response_cache::{
    CacheControlRegistry, Error, Executor, FieldCacheHandle, FieldDefinition, GraphqlError, HintCollector,
    OperationContext, PathSegment, Response, ResponsePath, SingleResult,
};
use serde_json::{Map, Value};

type Resolver = Arc<dyn Fn(ResolverContext<'_>) -> Result<Value, String> + Send + Sync>;

/// What a resolver gets to see of the field it resolves.
pub struct ResolverContext<'a> {
    pub parent: &'a Value,
    pub arguments: &'a Map<String, Value>,
    pub cache: &'a FieldCacheHandle,
    pub operation: &'a OperationContext,
}

pub struct MockExecutorBuilder {
    sdl: String,
    resolvers: HashMap<(String, String), Resolver>,
    root_value: Value,
}

impl MockExecutorBuilder {
    /// Resolves `type_name.field_name` to a constant value.
    #[must_use]
    pub fn with_resolver(self, type_name: &str, field_name: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.with_resolver_fn(type_name, field_name, move |_| Ok(value.clone()))
    }

    #[must_use]
    pub fn with_resolver_fn<F>(mut self, type_name: &str, field_name: &str, resolver: F) -> Self
    where
        F: Fn(ResolverContext<'_>) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.resolvers
            .insert((type_name.to_string(), field_name.to_string()), Arc::new(resolver));
        self
    }

    /// Parent value of the root fields.
    #[must_use]
    pub fn with_root_value(mut self, value: Value) -> Self {
        self.root_value = value;
        self
    }

    pub fn build(self) -> MockExecutor {
        MockExecutor {
            registry: CacheControlRegistry::from_sdl(&self.sdl).unwrap(),
            possible_types: possible_types(&self.sdl),
            resolvers: self.resolvers,
            root_value: self.root_value,
            calls: Default::default(),
        }
    }
}

pub struct MockExecutor {
    registry: CacheControlRegistry,
    /// Object types of each interface and union.
    possible_types: HashMap<String, HashSet<String>>,
    resolvers: HashMap<(String, String), Resolver>,
    root_value: Value,
    calls: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockExecutor {
    pub fn builder(sdl: impl Into<String>) -> MockExecutorBuilder {
        MockExecutorBuilder {
            sdl: sdl.into(),
            resolvers: HashMap::new(),
            root_value: Value::Object(Map::new()),
        }
    }

    /// How many times `type_name.field_name` was resolved.
    pub fn calls(&self, type_name: &str, field_name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&format!("{type_name}.{field_name}"))
            .copied()
            .unwrap_or_default()
    }
}

struct Execution<'a> {
    operation: &'a OperationContext,
    hints: &'a HintCollector,
    variables: Map<String, Value>,
    errors: Vec<GraphqlError>,
}

#[async_trait::async_trait]
impl Executor for MockExecutor {
    async fn execute(&self, operation: &OperationContext, hints: &HintCollector) -> Result<Response, Error> {
        let mut variables = operation.request.variables.clone();
        for definition in &operation.operation.node.variable_definitions {
            let definition = &definition.node;
            let name = definition.name.node.to_string();
            if !variables.contains_key(&name) {
                let default = match &definition.default_value {
                    Some(value) => value
                        .node
                        .clone()
                        .into_json()
                        .map_err(|err| Error::Execution(err.to_string()))?,
                    None => Value::Null,
                };
                variables.insert(name, default);
            }
        }

        let mut execution = Execution {
            operation,
            hints,
            variables,
            errors: Vec::new(),
        };

        let root_type = self.registry.root_type(operation.operation_type).to_string();
        let data = self.execute_selection_set(
            &mut execution,
            &root_type,
            &self.root_value,
            &operation.operation.node.selection_set,
            &ResponsePath::empty(),
        );

        Ok(Response::from_result(SingleResult {
            data: Some(Value::Object(data)),
            errors: execution.errors,
        }))
    }
}

impl MockExecutor {
    fn execute_selection_set(
        &self,
        execution: &mut Execution<'_>,
        type_name: &str,
        parent: &Value,
        selection_set: &Positioned<SelectionSet>,
        path: &ResponsePath,
    ) -> Map<String, Value> {
        let mut output = Map::new();
        self.collect_fields(execution, type_name, parent, selection_set, path, &mut output);
        output
    }

    fn collect_fields(
        &self,
        execution: &mut Execution<'_>,
        type_name: &str,
        parent: &Value,
        selection_set: &Positioned<SelectionSet>,
        path: &ResponsePath,
        output: &mut Map<String, Value>,
    ) {
        for selection in &selection_set.node.items {
            match &selection.node {
                Selection::Field(field) => {
                    let field = &field.node;
                    let response_key = field.response_key().node.to_string();

                    if field.name.node.as_str() == "__typename" {
                        output.insert(response_key, Value::String(type_name.to_string()));
                        continue;
                    }

                    let field_path = path.field(response_key.clone());
                    let Some(definition) = self.registry.field(type_name, field.name.node.as_str()) else {
                        execution.errors.push(
                            GraphqlError::new(format!("Unknown field '{}' on type '{type_name}'", field.name.node))
                                .with_path(json_path(&field_path)),
                        );
                        continue;
                    };

                    let arguments = field
                        .arguments
                        .iter()
                        .map(|(name, value)| (name.node.to_string(), self.argument(execution, &value.node)))
                        .collect::<Map<_, _>>();

                    let value = self.resolve_field(execution, &definition, parent, &arguments, &field_path);
                    let value = self.complete_value(
                        execution,
                        &definition,
                        definition.returns_list,
                        value,
                        &field.selection_set,
                        &field_path,
                    );
                    output.insert(response_key, value);
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.node.fragment_name.node.as_str();
                    let operation = execution.operation;
                    let Some(fragment) = operation.document.fragments.get(name) else {
                        execution
                            .errors
                            .push(GraphqlError::new(format!("Unknown fragment '{name}'")));
                        continue;
                    };
                    if self.applies(type_name, fragment.node.type_condition.node.on.node.as_str()) {
                        self.collect_fields(
                            execution,
                            type_name,
                            parent,
                            &fragment.node.selection_set,
                            path,
                            output,
                        );
                    }
                }
                Selection::InlineFragment(fragment) => {
                    let applies = match &fragment.node.type_condition {
                        Some(condition) => self.applies(type_name, condition.node.on.node.as_str()),
                        None => true,
                    };
                    if applies {
                        self.collect_fields(
                            execution,
                            type_name,
                            parent,
                            &fragment.node.selection_set,
                            path,
                            output,
                        );
                    }
                }
            }
        }
    }

    /// Whether a fragment on `condition` applies to an object of type `type_name`.
    fn applies(&self, type_name: &str, condition: &str) -> bool {
        type_name == condition
            || self
                .possible_types
                .get(condition)
                .is_some_and(|types| types.contains(type_name))
    }

    fn argument(&self, execution: &Execution<'_>, value: &async_graphql_value::Value) -> Value {
        value
            .clone()
            .into_const_with(|name| {
                let value = execution.variables.get(name.as_str()).cloned().unwrap_or_default();
                ConstValue::from_json(value)
            })
            .and_then(ConstValue::into_json)
            .unwrap_or_default()
    }

    fn resolve_field(
        &self,
        execution: &mut Execution<'_>,
        definition: &FieldDefinition<'_>,
        parent: &Value,
        arguments: &Map<String, Value>,
        path: &ResponsePath,
    ) -> Value {
        let cache = execution.hints.will_resolve_field(definition, path);

        *self
            .calls
            .lock()
            .unwrap()
            .entry(format!("{}.{}", definition.parent_type, definition.name))
            .or_default() += 1;

        let resolver = self
            .resolvers
            .get(&(definition.parent_type.to_string(), definition.name.to_string()));

        let Some(resolver) = resolver else {
            return parent.get(definition.name).cloned().unwrap_or_default();
        };

        let result = resolver(ResolverContext {
            parent,
            arguments,
            cache: &cache,
            operation: execution.operation,
        });

        match result {
            Ok(value) => value,
            Err(message) => {
                execution
                    .errors
                    .push(GraphqlError::new(message).with_path(json_path(path)));
                Value::Null
            }
        }
    }

    fn complete_value(
        &self,
        execution: &mut Execution<'_>,
        definition: &FieldDefinition<'_>,
        is_list: bool,
        value: Value,
        selection_set: &Positioned<SelectionSet>,
        path: &ResponsePath,
    ) -> Value {
        match value {
            Value::Null => Value::Null,
            Value::Array(items) if is_list => Value::Array(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| {
                        self.complete_value(execution, definition, false, item, selection_set, &path.index(index))
                    })
                    .collect(),
            ),
            value if definition.returns_composite_type => {
                let type_name = value
                    .get("__typename")
                    .and_then(Value::as_str)
                    .unwrap_or(definition.return_type)
                    .to_string();
                Value::Object(self.execute_selection_set(execution, &type_name, &value, selection_set, path))
            }
            value => value,
        }
    }
}

fn possible_types(sdl: &str) -> HashMap<String, HashSet<String>> {
    let document = async_graphql_parser::parse_schema(sdl).unwrap();
    let mut possible_types: HashMap<String, HashSet<String>> = HashMap::new();

    for definition in document.definitions {
        let TypeSystemDefinition::Type(definition) = definition else {
            continue;
        };
        let name = definition.node.name.node.to_string();
        match definition.node.kind {
            TypeKind::Object(object) => {
                for interface in object.implements {
                    possible_types
                        .entry(interface.node.to_string())
                        .or_default()
                        .insert(name.clone());
                }
            }
            TypeKind::Union(union) => {
                possible_types
                    .entry(name)
                    .or_default()
                    .extend(union.members.into_iter().map(|member| member.node.to_string()));
            }
            _ => {}
        }
    }

    possible_types
}

fn json_path(path: &ResponsePath) -> Vec<Value> {
    path.iter()
        .map(|segment| match segment {
            PathSegment::Field(name) => Value::String(name.clone()),
            PathSegment::Index(index) => Value::from(*index),
        })
        .collect()
}
