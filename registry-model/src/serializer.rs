use crate::error::ModelResult;
use crate::roles::FieldFilter;
use crate::schema::{DocumentSchema, SchemaRegistry};
use serde_json::{Map, Value};

/// Projects documents onto the fields a role may see.
///
/// The top-level lookup fails closed: a role the schema does not declare is
/// an error unless the schema opts into falling back to `default`. Embedded
/// models are filtered by their own table, using the parent's role name or
/// `default`.
#[derive(Debug, Clone, Copy)]
pub struct Serializer<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> Serializer<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn serialize(
        &self,
        schema: &str,
        document: &Map<String, Value>,
        role: &str,
    ) -> ModelResult<Map<String, Value>> {
        let schema = self.registry.get(schema)?;
        let filter = schema.roles.resolve(&schema.name, role)?;
        self.project(schema, filter, document, role)
    }

    /// Serializes under `role`, then keeps only `fields`.
    pub fn serialize_fields(
        &self,
        schema: &str,
        document: &Map<String, Value>,
        role: &str,
        fields: &[String],
    ) -> ModelResult<Map<String, Value>> {
        let mut projected = self.serialize(schema, document, role)?;
        projected.retain(|key, _| fields.iter().any(|f| f == key));
        Ok(projected)
    }

    fn project(
        &self,
        schema: &DocumentSchema,
        filter: &FieldFilter,
        document: &Map<String, Value>,
        role: &str,
    ) -> ModelResult<Map<String, Value>> {
        let mut output = Map::new();
        for (key, value) in document {
            if !filter.allows(key) {
                continue;
            }
            let value = match schema.field(key).and_then(|f| f.kind.nested_schema()) {
                Some(nested) => self.embedded(nested, value, role)?,
                None => value.clone(),
            };
            output.insert(key.clone(), value);
        }
        Ok(output)
    }

    fn embedded(&self, schema: &str, value: &Value, role: &str) -> ModelResult<Value> {
        match value {
            Value::Object(object) => {
                let schema = self.registry.get(schema)?;
                let filter = schema.roles.resolve_nested(&schema.name, role)?;
                self.project(schema, filter, object, role).map(Value::Object)
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.embedded(schema, item, role))
                .collect::<ModelResult<Vec<_>>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }
}
