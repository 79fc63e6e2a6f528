use jane_types::{Fields, Record, Value};

use crate::RecordTransform;

/// One `target_field <- source_column` copy performed by
/// [`TransformStep::Assemble`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssembleMapping {
    pub target_field: String,
    pub source_column: String,
}

impl AssembleMapping {
    pub fn new(target_field: impl Into<String>, source_column: impl Into<String>) -> Self {
        Self {
            target_field: target_field.into(),
            source_column: source_column.into(),
        }
    }
}

/// Built-in record transforms.
#[derive(Clone, Debug, PartialEq)]
pub enum TransformStep {
    /// Replace the record with the nested record stored under `field`.
    ///
    /// A missing field, or a field that does not hold a nested record, leaves
    /// the record unchanged and logs a warning.
    Extract { field: String },
    /// Build a nested record from `mappings` and store it under `target`,
    /// keeping every other field.
    Assemble {
        target: String,
        mappings: Vec<AssembleMapping>,
    },
    /// Inline the fields of every nested record into the top level. When two
    /// levels share a field name the value visited last wins.
    Flatten,
    /// Apply steps in order, piping each output into the next step.
    Compound(Vec<TransformStep>),
}

impl TransformStep {
    pub fn extract(field: impl Into<String>) -> Self {
        TransformStep::Extract {
            field: field.into(),
        }
    }

    pub fn assemble(target: impl Into<String>, mappings: Vec<AssembleMapping>) -> Self {
        TransformStep::Assemble {
            target: target.into(),
            mappings,
        }
    }

    pub fn compound(steps: Vec<TransformStep>) -> Self {
        TransformStep::Compound(steps)
    }
}

impl RecordTransform for TransformStep {
    fn name(&self) -> &str {
        match self {
            TransformStep::Extract { .. } => "Extract",
            TransformStep::Assemble { .. } => "Assemble",
            TransformStep::Flatten => "Flatten",
            TransformStep::Compound(_) => "Compound",
        }
    }

    fn handle_record(&self, record: Record, writable: bool) -> Record {
        match self {
            TransformStep::Extract { field } => extract(record, field, writable),
            TransformStep::Assemble { target, mappings } => {
                assemble(record, target, mappings, writable)
            }
            TransformStep::Flatten => flatten(&record),
            TransformStep::Compound(steps) => {
                let mut record = record;
                let mut writable = writable;
                for step in steps {
                    record = step.handle_record(record, writable);
                    // The first step already produced a private copy.
                    writable = false;
                }
                record
            }
        }
    }
}

fn extract(record: Record, field: &str, writable: bool) -> Record {
    match record.get(field) {
        Some(Value::Record(inner)) => {
            if writable {
                inner.detached()
            } else {
                inner.clone()
            }
        }
        Some(other) => {
            tracing::warn!(
                "[EXTRACT] field '{}' holds a {} rather than a record, keeping record as-is",
                field,
                other.kind()
            );
            record
        }
        None => {
            tracing::warn!("[EXTRACT] can't extract '{}' from record", field);
            record
        }
    }
}

fn assemble(record: Record, target: &str, mappings: &[AssembleMapping], writable: bool) -> Record {
    let assembly: Record = mappings
        .iter()
        .map(|m| {
            (
                m.target_field.clone(),
                record.value_or_null(&m.source_column).clone(),
            )
        })
        .collect();

    let mut out = if writable { record.detached() } else { record };
    out.set(target, assembly);
    out
}

fn flatten(record: &Record) -> Record {
    let mut into = Fields::new();
    flatten_into(record, &mut into);
    Record::from(into)
}

fn flatten_into(record: &Record, into: &mut Fields) {
    for (key, value) in record {
        match value {
            Value::Record(nested) => flatten_into(nested, into),
            scalar => {
                into.insert(key.clone(), scalar.clone());
            }
        }
    }
}
