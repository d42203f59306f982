use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Closed vocabulary of field kinds a SchemaRecord may declare
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    String,
    Number,
    Boolean,
    Date,
    /// Homogeneous array; the item descriptor carries its own `ref`
    Array(Box<FieldDescriptor>),
    Object,
    /// Untyped
    Mixed,
    /// Reference to a document, optionally in the `ref` collection
    ObjectId,
    Buffer,
    Map,
}

impl TypeDescriptor {
    /// Look up a stored type name. `Array` resolves to an untyped array.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "String" => Self::String,
            "Number" => Self::Number,
            "Boolean" => Self::Boolean,
            "Date" => Self::Date,
            "Array" => Self::Array(Box::new(FieldDescriptor::new(Self::Mixed))),
            "Object" => Self::Object,
            "Mixed" => Self::Mixed,
            "ObjectId" => Self::ObjectId,
            "Buffer" => Self::Buffer,
            "Map" => Self::Map,
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Number => "Number",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::Array(_) => "Array",
            Self::Object => "Object",
            Self::Mixed => "Mixed",
            Self::ObjectId => "ObjectId",
            Self::Buffer => "Buffer",
            Self::Map => "Map",
        }
    }
}

/// One compiled field: its kind plus modifiers
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub kind: TypeDescriptor,
    pub required: bool,
    pub unique: bool,
    /// `Some(Value::Null)` is an explicit null default
    pub default: Option<Value>,
    /// Target collection for ObjectId references
    pub reference: Option<String>,
    /// Modifiers outside the known set, kept verbatim
    pub extra: Map<String, Value>,
}

impl FieldDescriptor {
    pub fn new(kind: TypeDescriptor) -> Self {
        Self {
            kind,
            required: false,
            unique: false,
            default: None,
            reference: None,
            extra: Map::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_ref(mut self, target: impl Into<String>) -> Self {
        self.reference = Some(target.into());
        self
    }

    fn is_bare(&self) -> bool {
        !self.required
            && !self.unique
            && self.default.is_none()
            && self.reference.is_none()
            && self.extra.is_empty()
            && !matches!(self.kind, TypeDescriptor::Array(_))
    }

    /// Stored JSON form: a bare type name when there is nothing else to say
    pub fn to_value(&self) -> Value {
        if self.is_bare() {
            return Value::String(self.kind.name().to_string());
        }

        let mut out = Map::new();
        out.insert("type".into(), Value::String(self.kind.name().to_string()));
        if let TypeDescriptor::Array(item) = &self.kind {
            out.insert("items".into(), item.to_value());
        }
        if self.required {
            out.insert("required".into(), Value::Bool(true));
        }
        if self.unique {
            out.insert("unique".into(), Value::Bool(true));
        }
        if let Some(default) = &self.default {
            out.insert("default".into(), default.clone());
        }
        if let Some(reference) = &self.reference {
            out.insert("ref".into(), Value::String(reference.clone()));
        }
        for (key, value) in &self.extra {
            out.insert(key.clone(), value.clone());
        }
        Value::Object(out)
    }
}

/// Field name → compiled descriptor
pub type DescriptorMap = BTreeMap<String, FieldDescriptor>;

/// Stored JSON object for a whole descriptor map
pub fn descriptor_map_to_value(map: &DescriptorMap) -> Value {
    Value::Object(map.iter().map(|(name, field)| (name.clone(), field.to_value())).collect())
}

/// JSON string as persisted in a SchemaRecord's `definition`
pub fn serialize_descriptor_map(map: &DescriptorMap) -> String {
    descriptor_map_to_value(map).to_string()
}
