use crate::table::field::Record;
use crate::table::field::Schema;
use crate::table::result::Diagnostic;

/// Caller supplied row check: receives the decoded record and its 1-based row
/// number, returns one message per problem found.
pub type RowValidator<'a, R> = &'a dyn Fn(&R, usize) -> Vec<String>;

/// Runs field constraints, the record's own rules and the optional caller check
/// against one decoded row, in that order.
pub(crate) fn validate<R: Record>(
    schema: &Schema<R>,
    record: &R,
    row: usize,
    validator: Option<RowValidator<'_, R>>,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for field in schema.fields() {
        let constraints = field.constraints();
        if constraints.is_empty() {
            continue;
        }
        let value = field.read(record);
        for constraint in constraints {
            if let Some(message) = constraint.check(field.name(), &value) {
                diagnostics.push(Diagnostic::row(row, message).with_field(field.name()));
            }
        }
    }
    for violation in record.validate() {
        let diagnostic = Diagnostic::row(row, violation.message);
        diagnostics.push(match violation.field {
            Some(field) => diagnostic.with_field(&field),
            None => diagnostic,
        });
    }
    if let Some(validator) = validator {
        diagnostics.extend(
            validator(record, row)
                .into_iter()
                .map(|message| Diagnostic::row(row, message)),
        );
    }
    diagnostics
}
