use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The structural kind a declared field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldShape {
    /// A JSON object (nested fields addressable by path).
    Object,
    /// A JSON array. Never a map keyed by indices.
    Sequence,
}

impl FieldShape {
    /// Returns true if `value` has this shape.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldShape::Object => value.is_object(),
            FieldShape::Sequence => value.is_array(),
        }
    }
}

impl fmt::Display for FieldShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldShape::Object => f.write_str("object"),
            FieldShape::Sequence => f.write_str("sequence"),
        }
    }
}

/// A field whose shape is fixed by the content schema.
///
/// `field_path` uses the mutation path syntax (`about.kpiCards`) with one
/// extension: `[]` after a segment means "every element of this sequence",
/// as in `skills.categories[].skills`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclaredField {
    pub field_path: &'static str,
    pub shape: FieldShape,
}

/// One step of a declared field path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep<'a> {
    Key(&'a str),
    Each,
}

impl DeclaredField {
    /// Shorthand for an object-shaped field.
    pub const fn object(field_path: &'static str) -> Self {
        Self {
            field_path,
            shape: FieldShape::Object,
        }
    }

    /// Shorthand for a sequence-shaped field.
    pub const fn sequence(field_path: &'static str) -> Self {
        Self {
            field_path,
            shape: FieldShape::Sequence,
        }
    }

    /// Splits the declared path into steps.
    pub fn steps(&self) -> Vec<PathStep<'static>> {
        let mut steps = Vec::new();
        for segment in self.field_path.split('.') {
            match segment.strip_suffix("[]") {
                Some(key) => {
                    steps.push(PathStep::Key(key));
                    steps.push(PathStep::Each);
                }
                None => steps.push(PathStep::Key(segment)),
            }
        }
        steps
    }

    /// The section this field belongs to.
    pub fn section_key(&self) -> &'static str {
        let first = self.field_path.split('.').next().unwrap_or(self.field_path);
        first.strip_suffix("[]").unwrap_or(first)
    }

    /// Returns true if a mutation at `path` can change this field: either the
    /// mutated path contains the field or the field contains the mutated path.
    pub fn overlaps<S: AsRef<str>>(&self, path: &[S]) -> bool {
        let keys: Vec<&str> = self
            .steps()
            .into_iter()
            .map_while(|step| match step {
                PathStep::Key(k) => Some(k),
                PathStep::Each => None,
            })
            .collect();
        keys.iter()
            .zip(path.iter())
            .all(|(declared, touched)| *declared == touched.as_ref())
    }

    /// Visits every concrete value in `doc` this declared field resolves to.
    /// The callback receives the concrete dot path and the value.
    pub fn for_each_match<'v>(&self, doc: &'v Value, mut f: impl FnMut(String, &'v Value)) {
        fn walk<'v>(
            steps: &[PathStep<'_>],
            value: &'v Value,
            path: String,
            f: &mut dyn FnMut(String, &'v Value),
        ) {
            let Some((step, rest)) = steps.split_first() else {
                f(path, value);
                return;
            };
            match step {
                PathStep::Key(key) => {
                    if let Some(child) = value.as_object().and_then(|m| m.get(*key)) {
                        let child_path = if path.is_empty() {
                            (*key).to_string()
                        } else {
                            format!("{path}.{key}")
                        };
                        walk(rest, child, child_path, f);
                    }
                }
                PathStep::Each => {
                    if let Some(items) = value.as_array() {
                        for (i, item) in items.iter().enumerate() {
                            walk(rest, item, format!("{path}[{i}]"), f);
                        }
                    }
                }
            }
        }
        walk(&self.steps(), doc, String::new(), &mut f);
    }
}

/// Every field with a fixed shape, in document order.
pub const DECLARED_FIELDS: &[DeclaredField] = &[
    DeclaredField::object("personalInfo"),
    DeclaredField::sequence("socialLinks"),
    DeclaredField::sequence("navigation"),
    DeclaredField::object("hero"),
    DeclaredField::object("about"),
    DeclaredField::sequence("about.kpiCards"),
    DeclaredField::sequence("about.keyTechnologies"),
    DeclaredField::sequence("about.education"),
    DeclaredField::object("skills"),
    DeclaredField::sequence("skills.categories"),
    DeclaredField::sequence("skills.categories[].skills"),
    DeclaredField::object("projects"),
    DeclaredField::sequence("projects.filterCategories"),
    DeclaredField::sequence("projects.projects"),
    DeclaredField::object("experience"),
    DeclaredField::sequence("experience.experiences"),
    DeclaredField::object("certifications"),
    DeclaredField::sequence("certifications.certifications"),
    DeclaredField::object("contact"),
    DeclaredField::sequence("contact.bulletPoints"),
];

/// Declared sequence fields only.
pub fn sequence_fields() -> impl Iterator<Item = &'static DeclaredField> {
    DECLARED_FIELDS
        .iter()
        .filter(|f| f.shape == FieldShape::Sequence)
}

/// A declared field found with the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeViolation {
    /// Concrete path of the offending value, e.g. `skills.categories[1].skills`.
    pub field: String,
    pub expected: FieldShape,
    /// JSON type name of the value found.
    pub found: &'static str,
}

impl fmt::Display for ShapeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} must be a {}, found {}",
            self.field, self.expected, self.found
        )
    }
}

/// Returns the JSON type name of a value.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "object",
    }
}

/// Checks the declared fields that overlap `touched` (a mutated path split
/// into segments). Absent fields are fine; present ones must match.
pub fn check_touched<S: AsRef<str>>(doc: &Value, touched: &[S]) -> Result<(), ShapeViolation> {
    for declared in DECLARED_FIELDS.iter().filter(|d| d.overlaps(touched)) {
        let mut violation = None;
        declared.for_each_match(doc, |field, value| {
            if violation.is_none() && !declared.shape.matches(value) {
                violation = Some(ShapeViolation {
                    field,
                    expected: declared.shape,
                    found: json_type_name(value),
                });
            }
        });
        if let Some(v) = violation {
            return Err(v);
        }
    }
    Ok(())
}

/// Checks every declared field of a whole document.
pub fn validate_document(doc: &Value) -> Vec<ShapeViolation> {
    let mut violations = Vec::new();
    for declared in DECLARED_FIELDS {
        declared.for_each_match(doc, |field, value| {
            if !declared.shape.matches(value) {
                violations.push(ShapeViolation {
                    field,
                    expected: declared.shape,
                    found: json_type_name(value),
                });
            }
        });
    }
    violations
}
