use crate::model::field::FieldModel;
use serde::{Deserialize, Serialize};

///
/// EntityModel
///
/// Record type as declared by the host: a path, a primary key, and fields.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct EntityModel {
    pub path: String,
    pub primary_key: String,
    pub fields: Vec<FieldModel>,
}

impl EntityModel {
    /// Build a record type with an integer primary key named `id`.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            primary_key: "id".to_string(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, field: FieldModel) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&FieldModel> {
        self.fields.iter().find(|field| field.name == name)
    }

    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }

    /// Iterate the fields declared by the host, skipping shadow fields.
    pub fn declared_fields(&self) -> impl Iterator<Item = &FieldModel> {
        self.fields.iter().filter(|field| !field.shadow)
    }
}
