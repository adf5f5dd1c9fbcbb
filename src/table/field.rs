//! Record schemas: the statically declared list of fields a table decodes into.
//!
//! A target record type implements [`Record`] and returns a [`Schema`] of
//! [`Field`]s. Each field pairs a name and an optional spreadsheet column name
//! with accessors into the record, a [`FieldType`] and its constraints.
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use regex::Regex;

/// Semantic type of a field value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Int32,
    Int64,
    Decimal,
    Boolean,
    Date,
    Time,
    DateTime,
    Enumeration(EnumType),
}

/// An enumeration declared through [`enum_field!`](crate::enum_field).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EnumType {
    pub name: &'static str,
    /// Member names in declaration order; never empty
    pub members: &'static [&'static str],
}

impl ValueKind {
    /// Type name used in conversion messages.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Text => "String",
            Self::Int32 => "i32",
            Self::Int64 => "i64",
            Self::Decimal => "f64",
            Self::Boolean => "bool",
            Self::Date => "NaiveDate",
            Self::Time => "NaiveTime",
            Self::DateTime => "NaiveDateTime",
            Self::Enumeration(enumeration) => enumeration.name,
        }
    }

    /// The zero value: numeric zero, empty text, `false`, the Unix epoch, or the first enum member.
    pub fn zero(&self) -> Value {
        match self {
            Self::Text => Value::Text(String::new()),
            Self::Int32 | Self::Int64 => Value::Integer(0),
            Self::Decimal => Value::Decimal(0.0),
            Self::Boolean => Value::Boolean(false),
            Self::Date => Value::Date(NaiveDate::default()),
            Self::Time => Value::Time(NaiveTime::default()),
            Self::DateTime => Value::DateTime(NaiveDateTime::default()),
            Self::Enumeration(enumeration) => Value::Enum(enumeration.members.first().copied().unwrap_or_default()),
        }
    }
}

/// Destination type of a field: a value kind, optionally nullable.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FieldType {
    pub kind: ValueKind,
    pub nullable: bool,
}

impl FieldType {
    pub const fn new(kind: ValueKind) -> Self {
        Self { kind, nullable: false }
    }

    pub const fn nullable(kind: ValueKind) -> Self {
        Self { kind, nullable: true }
    }

    pub const fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// `Value::Null` for nullable types, the kind's zero value otherwise.
    pub fn zero(&self) -> Value {
        if self.nullable {
            Value::Null
        } else {
            self.kind.zero()
        }
    }
}

/// A decoded cell value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    /// Member name of an enumeration
    Enum(&'static str),
}

impl Value {
    /// True for `Null` and for empty or whitespace-only text.
    pub fn is_absent(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(value) => Some(*value as f64),
            Value::Decimal(value) => Some(*value),
            _ => None,
        }
    }
}

/// Rust types a field can hold.
pub trait FieldValue: Sized {
    fn field_type() -> FieldType;

    /// Converts a value of this type's kind back into `Self`; `None` on a kind mismatch.
    fn from_value(value: Value) -> Option<Self>;

    fn to_value(&self) -> Value;

    /// Value a field holds when its cell is blank or fails to convert.
    fn zero_value() -> Value {
        Self::field_type().zero()
    }
}

macro_rules! impl_field_value {
    ($ty:ty, $kind:ident, $variant:ident) => {
        impl FieldValue for $ty {
            fn field_type() -> FieldType {
                FieldType::new(ValueKind::$kind)
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(value) => Some(value),
                    _ => None,
                }
            }

            fn to_value(&self) -> Value {
                Value::$variant(self.clone())
            }
        }
    };
}

impl_field_value!(String, Text, Text);
impl_field_value!(i64, Int64, Integer);
impl_field_value!(f64, Decimal, Decimal);
impl_field_value!(bool, Boolean, Boolean);
impl_field_value!(NaiveDate, Date, Date);
impl_field_value!(NaiveTime, Time, Time);
impl_field_value!(NaiveDateTime, DateTime, DateTime);

impl FieldValue for i32 {
    fn field_type() -> FieldType {
        FieldType::new(ValueKind::Int32)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Integer(value) => i32::try_from(value).ok(),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Integer(i64::from(*self))
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn field_type() -> FieldType {
        FieldType {
            nullable: true,
            ..T::field_type()
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            value => T::from_value(value).map(Some),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Some(value) => value.to_value(),
            None => Value::Null,
        }
    }
}

/// Implements [`FieldValue`] for a fieldless enum so it can be decoded from
/// member names (matched case-insensitively).
///
/// The enum must implement `Default`; blank and unconvertible cells assign
/// the default member.
///
/// ```
/// #[derive(Debug, Default, PartialEq)]
/// enum Status { Draft, #[default] Active, Retired }
/// rusty_table::enum_field!(Status { Draft, Active, Retired });
/// ```
#[macro_export]
macro_rules! enum_field {
    ($name:ident { $($member:ident),+ $(,)? }) => {
        impl $crate::table::FieldValue for $name {
            fn field_type() -> $crate::table::FieldType {
                $crate::table::FieldType::new($crate::table::ValueKind::Enumeration($crate::table::EnumType {
                    name: stringify!($name),
                    members: &[$(stringify!($member)),+],
                }))
            }

            fn from_value(value: $crate::table::Value) -> Option<Self> {
                match value {
                    $crate::table::Value::Enum(member) => match member {
                        $(stringify!($member) => Some($name::$member),)+
                        _ => None,
                    },
                    _ => None,
                }
            }

            fn to_value(&self) -> $crate::table::Value {
                match self {
                    $($name::$member => $crate::table::Value::Enum(stringify!($member)),)+
                }
            }

            fn zero_value() -> $crate::table::Value {
                $crate::table::FieldValue::to_value(&<$name as ::core::default::Default>::default())
            }
        }
    };
}

/// Builds a [`Field`] whose name is the record member's name.
///
/// `field!(Item, qty)` expands to
/// `Field::new("qty", |record: &Item| &record.qty, |record: &mut Item| &mut record.qty)`.
#[macro_export]
macro_rules! field {
    ($record:ty, $member:ident) => {
        $crate::table::Field::new(
            stringify!($member),
            |record: &$record| &record.$member,
            |record: &mut $record| &mut record.$member,
        )
    };
}

/// A declarative per-field constraint, checked after a row is decoded.
#[derive(Clone, Debug)]
pub enum Constraint {
    /// The value must not be absent (`None`, or empty/whitespace text)
    Required,
    /// Text must have at least this many characters
    MinLength(usize),
    /// Text must have at most this many characters
    MaxLength(usize),
    /// Numbers must lie within `[min, max]`
    Range { min: f64, max: f64 },
    /// Non-empty text must match the whole expression
    Pattern { expression: String, regex: Regex },
}

impl Constraint {
    /// A pattern constraint anchored at both ends of the text.
    pub fn pattern(regex: &Regex) -> Self {
        let expression = regex.as_str().to_owned();
        let anchored = Regex::new(&format!("^(?:{expression})$")).unwrap_or_else(|_| regex.clone());
        Constraint::Pattern { expression, regex: anchored }
    }

    /// Checks a value, returning the violation message if it fails.
    /// Only `Required` fails on absent values.
    pub fn check(&self, field: &str, value: &Value) -> Option<String> {
        match (self, value) {
            (Constraint::Required, value) if value.is_absent() => Some(format!("The {field} field is required.")),
            (Constraint::MinLength(length), Value::Text(text)) if !text.is_empty() && text.chars().count() < *length => Some(format!(
                "The field {field} must be a string with a minimum length of {length}."
            )),
            (Constraint::MaxLength(length), Value::Text(text)) if text.chars().count() > *length => Some(format!(
                "The field {field} must be a string with a maximum length of {length}."
            )),
            (Constraint::Range { min, max }, value) => match value.as_number() {
                Some(number) if number < *min || number > *max => {
                    Some(format!("The field {field} must be between {min} and {max}."))
                }
                _ => None,
            },
            (Constraint::Pattern { expression, regex }, Value::Text(text)) if !text.is_empty() && !regex.is_match(text) => {
                Some(format!("The field {field} must match the regular expression '{expression}'."))
            }
            _ => None,
        }
    }
}

/// A record-level validation failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// Field the failure is about, if any
    pub field: Option<String>,
    pub message: String,
}

impl Violation {
    /// A failure about the record as a whole.
    pub fn record<S: Into<String>>(message: S) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    /// A failure about one field.
    pub fn field<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

/// One field of a record schema.
pub struct Field<R> {
    name: String,
    column: Option<String>,
    field_type: FieldType,
    constraints: Vec<Constraint>,
    zero: Value,
    assign: Box<dyn Fn(&mut R, Value)>,
    read: Box<dyn Fn(&R) -> Value>,
}

impl<R: 'static> Field<R> {
    /// Declares a field from a pair of accessors into the record.
    pub fn new<T: FieldValue + 'static>(name: &str, get: fn(&R) -> &T, get_mut: fn(&mut R) -> &mut T) -> Self {
        Self {
            name: name.to_owned(),
            column: None,
            field_type: T::field_type(),
            constraints: Vec::new(),
            zero: T::zero_value(),
            assign: Box::new(move |record: &mut R, value: Value| {
                if let Some(value) = T::from_value(value) {
                    *get_mut(record) = value;
                }
            }),
            read: Box::new(move |record: &R| get(record).to_value()),
        }
    }
}

impl<R> Field<R> {
    /// Overrides the spreadsheet column name, which defaults to the field name.
    pub fn column(mut self, column: &str) -> Self {
        self.column = Some(column.to_owned());
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn required(self) -> Self {
        self.constraint(Constraint::Required)
    }

    pub fn min_length(self, length: usize) -> Self {
        self.constraint(Constraint::MinLength(length))
    }

    pub fn max_length(self, length: usize) -> Self {
        self.constraint(Constraint::MaxLength(length))
    }

    pub fn range(self, min: f64, max: f64) -> Self {
        self.constraint(Constraint::Range { min, max })
    }

    pub fn pattern(self, regex: Regex) -> Self {
        self.constraint(Constraint::pattern(&regex))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared column name: the override if set, the field name otherwise.
    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Value assigned when the cell is blank or fails to convert.
    pub fn zero_value(&self) -> Value {
        self.zero.clone()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn is_required(&self) -> bool {
        self.constraints.iter().any(|constraint| matches!(constraint, Constraint::Required))
    }

    /// Stores a value of this field's type into the record.
    pub(crate) fn assign(&self, record: &mut R, value: Value) {
        (self.assign)(record, value)
    }

    /// Reads this field's current value from the record.
    pub(crate) fn read(&self, record: &R) -> Value {
        (self.read)(record)
    }
}

impl<R> std::fmt::Debug for Field<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("column", &self.column_name())
            .field("field_type", &self.field_type)
            .field("constraints", &self.constraints)
            .finish()
    }
}

/// The ordered field list of a record type.
#[derive(Debug)]
pub struct Schema<R> {
    fields: Vec<Field<R>>,
}

impl<R> Schema<R> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn field(mut self, field: Field<R>) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[Field<R>] {
        &self.fields
    }
}

impl<R> Default for Schema<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// A record type that table rows decode into.
///
/// Each row starts from `Self::default()`; every mapped column then assigns its
/// field. `validate` adds record-level rules on top of the field constraints.
pub trait Record: Default + 'static {
    fn schema() -> Schema<Self>;

    fn validate(&self) -> Vec<Violation> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    enum Color {
        #[default]
        Red,
        Green,
    }

    crate::enum_field!(Color { Red, Green });

    #[derive(Debug, Default)]
    struct Paint {
        name: String,
        code: Option<i32>,
        color: Color,
    }

    fn schema() -> Schema<Paint> {
        Schema::new()
            .field(crate::field!(Paint, name).column("Paint Name").required().max_length(5))
            .field(crate::field!(Paint, code))
            .field(crate::field!(Paint, color))
    }

    #[test]
    fn field_types_follow_rust_types() {
        let schema = schema();
        let fields = schema.fields();
        assert_eq!(fields[0].field_type(), FieldType::new(ValueKind::Text));
        assert_eq!(fields[1].field_type(), FieldType::nullable(ValueKind::Int32));
        assert_eq!(fields[2].field_type().type_name(), "Color");
        assert_eq!(fields[0].column_name(), "Paint Name");
        assert_eq!(fields[1].column_name(), "code");
        assert!(fields[0].is_required());
        assert!(!fields[1].is_required());
    }

    #[test]
    fn assign_and_read_values() {
        let schema = schema();
        let fields = schema.fields();
        let mut paint = Paint::default();
        fields[0].assign(&mut paint, Value::Text("Ochre".to_owned()));
        fields[1].assign(&mut paint, Value::Integer(42));
        fields[2].assign(&mut paint, Value::Enum("Green"));

        assert_eq!(paint.name, "Ochre");
        assert_eq!(paint.code, Some(42));
        assert_eq!(paint.color, Color::Green);
        assert_eq!(fields[1].read(&paint), Value::Integer(42));

        fields[1].assign(&mut paint, Value::Null);
        assert_eq!(paint.code, None);
        assert_eq!(fields[1].read(&paint), Value::Null);
    }

    #[test]
    fn zero_values() {
        assert_eq!(FieldType::new(ValueKind::Int64).zero(), Value::Integer(0));
        assert_eq!(FieldType::nullable(ValueKind::Int64).zero(), Value::Null);
        assert_eq!(Color::field_type().zero(), Value::Enum("Red"));
        assert_eq!(String::field_type().zero(), Value::Text(String::new()));
    }

    #[test]
    fn enum_zero_value_is_the_default_member() {
        #[derive(Debug, Default, PartialEq)]
        enum Priority {
            Low,
            #[default]
            Normal,
            High,
        }
        crate::enum_field!(Priority { Low, Normal, High });

        assert_eq!(Priority::zero_value(), Value::Enum("Normal"));
        assert_eq!(<Option<Priority>>::zero_value(), Value::Null);
        assert_eq!(i64::zero_value(), Value::Integer(0));
    }

    #[test]
    fn constraint_messages() {
        let text = |value: &str| Value::Text(value.to_owned());
        assert_eq!(
            Constraint::Required.check("Name", &text("  ")).as_deref(),
            Some("The Name field is required.")
        );
        assert_eq!(Constraint::Required.check("Qty", &Value::Integer(0)), None);
        assert_eq!(
            Constraint::Required.check("Qty", &Value::Null).as_deref(),
            Some("The Qty field is required.")
        );
        assert_eq!(
            Constraint::MaxLength(3).check("Code", &text("ABCD")).as_deref(),
            Some("The field Code must be a string with a maximum length of 3.")
        );
        assert_eq!(Constraint::MinLength(3).check("Code", &text("")), None);
        assert_eq!(
            Constraint::Range { min: 1.0, max: 10.0 }.check("Qty", &Value::Integer(11)).as_deref(),
            Some("The field Qty must be between 1 and 10.")
        );
        assert_eq!(Constraint::Range { min: 1.0, max: 10.0 }.check("Qty", &Value::Null), None);
    }

    #[test]
    fn pattern_must_match_whole_text() {
        let constraint = Constraint::pattern(&Regex::new("[A-Z]{3}").unwrap());
        assert_eq!(constraint.check("Currency", &Value::Text("GBP".to_owned())), None);
        assert_eq!(constraint.check("Currency", &Value::Text(String::new())), None);
        assert_eq!(
            constraint.check("Currency", &Value::Text("GBPX".to_owned())).as_deref(),
            Some("The field Currency must match the regular expression '[A-Z]{3}'.")
        );
    }

    #[test]
    fn pattern_alternation_matches_any_branch_in_full() {
        let constraint = Constraint::pattern(&Regex::new("a|ab").unwrap());
        assert_eq!(constraint.check("Code", &Value::Text("ab".to_owned())), None);
        assert_eq!(constraint.check("Code", &Value::Text("a".to_owned())), None);
        assert_eq!(
            constraint.check("Code", &Value::Text("abc".to_owned())).as_deref(),
            Some("The field Code must match the regular expression 'a|ab'.")
        );
    }
}
