//! Capability-based property lookup on content records.
//!
//! Each content type is registered once; registration turns its field
//! declarations into a `{capability -> field}` binding table so lookups are a
//! pair of map reads instead of a schema scan.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::domain::content::{
    Capability, ContentRecord, ContentRef, ContentTypeDefinition, FieldValue,
};

/// Typed view of a raw field value. `None` means the value cannot be coerced.
pub trait FromFieldValue: Sized {
    fn from_field_value(value: &FieldValue) -> Option<Self>;
}

impl FromFieldValue for String {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Text(text) => Some(text.clone()),
            FieldValue::Reference(_) | FieldValue::Empty => None,
        }
    }
}

impl FromFieldValue for ContentRef {
    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Reference(reference) => Some(*reference),
            FieldValue::Text(_) | FieldValue::Empty => None,
        }
    }
}

/// Binding table for one content type.
#[derive(Debug, Clone, Default)]
pub struct FieldBindings {
    contains_settings: bool,
    fields: HashMap<Capability, String>,
}

impl FieldBindings {
    pub fn for_type(definition: &ContentTypeDefinition) -> Self {
        let fields = Capability::ALL
            .into_iter()
            .filter_map(|capability| {
                definition
                    .field_for(capability)
                    .map(|field| (capability, field.name.clone()))
            })
            .collect();

        Self {
            contains_settings: definition.contains_settings,
            fields,
        }
    }

    pub fn field(&self, capability: Capability) -> Option<&str> {
        self.fields.get(&capability).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PropertyLocator {
    bindings: HashMap<String, FieldBindings>,
}

impl PropertyLocator {
    pub fn new(definitions: &[ContentTypeDefinition]) -> Self {
        let mut locator = Self::default();
        for definition in definitions {
            locator.register(definition);
        }
        locator
    }

    /// Register or replace the bindings of one content type.
    pub fn register(&mut self, definition: &ContentTypeDefinition) {
        let bindings = FieldBindings::for_type(definition);
        trace!(
            content_type = definition.id.as_str(),
            bound = bindings.fields.len(),
            "Registered content type bindings"
        );
        self.bindings.insert(definition.id.clone(), bindings);
    }

    /// Value of the first field tagged with `capability`, coerced to `T`.
    ///
    /// Every failure mode (unknown type, untagged, missing, null, wrong type)
    /// yields `None`.
    pub fn locate<T: FromFieldValue>(
        &self,
        record: &ContentRecord,
        capability: Capability,
    ) -> Option<T> {
        if record.fields.is_empty() {
            return None;
        }

        let content_type = record.content_type.as_deref()?;
        let Some(bindings) = self.bindings.get(content_type) else {
            debug!(content_type, "Content type has no registered bindings");
            return None;
        };

        let field = bindings.field(capability)?;
        let value = record.field(field)?;
        let typed = T::from_field_value(value);
        if typed.is_none() && *value != FieldValue::Empty {
            debug!(
                content_type,
                field,
                capability = capability.as_str(),
                "Field value could not be coerced"
            );
        }
        typed
    }

    /// True when the record's type is flagged as carrying favicon settings.
    pub fn has_settings(&self, record: &ContentRecord) -> bool {
        record
            .content_type
            .as_deref()
            .and_then(|id| self.bindings.get(id))
            .is_some_and(|bindings| bindings.contains_settings)
    }
}
