//! CEL-based resource filter compilation and evaluation.
//!
//! A filter sees two root variables: `resource` (the JSON attribute map of
//! the candidate being considered) and `request` (with `request.body`, the
//! parsed webhook payload). It must evaluate to a boolean; anything else is
//! an [`NotifierError::ExpressionError`](crate::error::NotifierError::ExpressionError).

use cel_interpreter::extractors::This;
use cel_interpreter::{Context, Program, Value as CelValue};
use cel_parser::ast::Expression as CelAst;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::error::NotifierError;

/// Register the list/string helpers the baseline CEL grammar lacks:
/// `split`, and the `first()`/`last()` accessors used on the lists it
/// produces. Both registered once per evaluation context rather than
/// globally, since `cel_interpreter::Context` owns its function table.
fn with_builtin_extensions(ctx: &mut Context) {
    ctx.add_function("split", |This(s): This<Arc<String>>, sep: Arc<String>| -> CelValue {
        CelValue::List(
            s.split(sep.as_str())
                .map(|part| CelValue::String(part.to_string().into()))
                .collect::<Vec<_>>()
                .into(),
        )
    });

    ctx.add_function("first", |This(list): This<Arc<Vec<CelValue>>>| -> CelValue {
        list.first().cloned().unwrap_or(CelValue::Null)
    });

    ctx.add_function("last", |This(list): This<Arc<Vec<CelValue>>>| -> CelValue {
        list.last().cloned().unwrap_or(CelValue::Null)
    });
}

/// A filter expression, parsed once and evaluated per candidate resource.
pub struct CompiledFilter {
    program: Program,
}

impl CompiledFilter {
    /// Parse and structurally validate `expr`, without evaluating it.
    pub fn compile(expr: &str) -> Result<Self, NotifierError> {
        validate(expr)?;
        let program = Program::compile(expr)
            .map_err(|e| NotifierError::ExpressionError(format!("failed to compile filter: {e}")))?;
        Ok(Self { program })
    }

    /// Evaluate the filter against one candidate resource and the inbound
    /// request body, returning whether the resource should be notified.
    pub fn evaluate(&self, resource: &JsonValue, request_body: &JsonValue) -> Result<bool, NotifierError> {
        let mut ctx = Context::default();
        with_builtin_extensions(&mut ctx);
        ctx.add_variable_from_value("resource", json_to_cel(resource));
        ctx.add_variable_from_value(
            "request",
            json_to_cel(&serde_json::json!({ "body": request_body })),
        );

        match self.program.execute(&ctx) {
            Ok(CelValue::Bool(b)) => Ok(b),
            Ok(other) => Err(NotifierError::ExpressionError(format!(
                "filter must evaluate to a boolean, got {other:?}"
            ))),
            Err(e) => Err(NotifierError::ExpressionError(format!(
                "filter evaluation failed: {e}"
            ))),
        }
    }
}

/// Check that `expr` parses, references only `resource`/`request`, and is
/// structurally capable of producing a boolean.
///
/// Full type-checking would require concrete values for every field a
/// candidate resource or request body might carry, which we don't have at
/// validation time. Instead this performs three narrower checks that catch
/// the cases the acceptance tests care about: syntax errors, references to
/// undeclared root identifiers (a typo'd `requrest.body...`), and literal
/// expressions that are not themselves boolean (`'test'`). Expressions that
/// reference `resource`/`request` and are built from comparison, logical, or
/// unary-not operators are accepted without evaluating them; a filter that
/// is syntactically boolean-shaped but produces a non-bool result at
/// evaluation time is still caught, just later, at [`CompiledFilter::evaluate`].
pub fn validate(expr: &str) -> Result<(), NotifierError> {
    let ast = cel_parser::parse(expr)
        .map_err(|e| NotifierError::ExpressionError(format!("invalid filter syntax: {e}")))?;

    check_identifiers(&ast)?;

    if !references_root_variable(&ast) {
        return evaluate_literal_as_bool(expr);
    }

    if !is_boolean_shaped(&ast) {
        return Err(NotifierError::ExpressionError(format!(
            "filter '{expr}' is not structurally boolean"
        )));
    }

    Ok(())
}

fn evaluate_literal_as_bool(expr: &str) -> Result<(), NotifierError> {
    let program = Program::compile(expr)
        .map_err(|e| NotifierError::ExpressionError(format!("failed to compile filter: {e}")))?;
    let ctx = Context::default();
    match program.execute(&ctx) {
        Ok(CelValue::Bool(_)) => Ok(()),
        Ok(other) => Err(NotifierError::ExpressionError(format!(
            "filter must evaluate to a boolean, got {other:?}"
        ))),
        Err(e) => Err(NotifierError::ExpressionError(format!(
            "filter evaluation failed: {e}"
        ))),
    }
}

fn check_identifiers(ast: &CelAst) -> Result<(), NotifierError> {
    let mut bad = None;
    walk_identifiers(ast, &mut |name| {
        if bad.is_none() && name != "resource" && name != "request" {
            bad = Some(name.to_string());
        }
    });
    match bad {
        Some(name) => Err(NotifierError::ExpressionError(format!(
            "undeclared reference '{name}'"
        ))),
        None => Ok(()),
    }
}

fn references_root_variable(ast: &CelAst) -> bool {
    let mut found = false;
    walk_identifiers(ast, &mut |name| {
        found |= name == "resource" || name == "request";
    });
    found
}

/// Whether the AST's root node is one that can only ever produce a boolean:
/// a comparison, a logical `&&`/`||`, a unary `!`, or a bare bool literal.
/// Field selects, function calls, and ternaries are rejected here even
/// though some can yield booleans at runtime — they are caught instead at
/// evaluation time, since this is a structural check, not a type-checker.
fn is_boolean_shaped(ast: &CelAst) -> bool {
    use cel_parser::ast::{Expression, RelationOp};
    match ast {
        Expression::Relation(_, op, _) => matches!(
            op,
            RelationOp::Equals
                | RelationOp::NotEquals
                | RelationOp::LessThan
                | RelationOp::LessThanEq
                | RelationOp::GreaterThan
                | RelationOp::GreaterThanEq
                | RelationOp::In
        ),
        Expression::And(_, _) | Expression::Or(_, _) => true,
        Expression::Unary(op, _) => matches!(op, cel_parser::ast::UnaryOp::Not),
        Expression::Atom(cel_parser::ast::Atom::Bool(_)) => true,
        Expression::Ternary(_, lhs, rhs) => is_boolean_shaped(lhs) && is_boolean_shaped(rhs),
        _ => false,
    }
}

fn walk_identifiers(ast: &CelAst, visit: &mut impl FnMut(&str)) {
    use cel_parser::ast::Expression;
    match ast {
        Expression::Ident(name) => visit(name),
        Expression::Relation(lhs, _, rhs) | Expression::And(lhs, rhs) | Expression::Or(lhs, rhs) => {
            walk_identifiers(lhs, visit);
            walk_identifiers(rhs, visit);
        }
        Expression::Unary(_, inner) => walk_identifiers(inner, visit),
        Expression::Member(base, _) => walk_identifiers(base, visit),
        Expression::FunctionCall(func, target, args) => {
            walk_identifiers(func, visit);
            if let Some(target) = target {
                walk_identifiers(target, visit);
            }
            for arg in args {
                walk_identifiers(arg, visit);
            }
        }
        Expression::Ternary(cond, lhs, rhs) => {
            walk_identifiers(cond, visit);
            walk_identifiers(lhs, visit);
            walk_identifiers(rhs, visit);
        }
        Expression::List(items) => {
            for item in items {
                walk_identifiers(item, visit);
            }
        }
        _ => {}
    }
}

fn json_to_cel(value: &JsonValue) -> CelValue {
    match value {
        JsonValue::Null => CelValue::Null,
        JsonValue::Bool(b) => CelValue::Bool(*b),
        JsonValue::Number(n) => n
            .as_i64()
            .map(CelValue::Int)
            .or_else(|| n.as_f64().map(CelValue::Float))
            .unwrap_or(CelValue::Null),
        JsonValue::String(s) => CelValue::String(s.clone().into()),
        JsonValue::Array(items) => CelValue::List(items.iter().map(json_to_cel).collect::<Vec<_>>().into()),
        JsonValue::Object(map) => CelValue::Map(
            map.iter()
                .map(|(k, v)| (k.clone().into(), json_to_cel(v)))
                .collect::<std::collections::HashMap<_, _>>()
                .into(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_bool_literals() {
        assert!(validate("true").is_ok());
        assert!(validate("false").is_ok());
    }

    #[test]
    fn accepts_comparison_against_request_body() {
        assert!(validate("request.body.value == 'test'").is_ok());
    }

    #[test]
    fn rejects_non_boolean_literal() {
        assert!(validate("'test'").is_err());
    }

    #[test]
    fn rejects_undeclared_identifier() {
        assert!(validate("requrest.body.value == 'test'").is_err());
    }

    #[test]
    fn evaluates_against_resource_labels() {
        let filter = CompiledFilter::compile("resource.metadata.labels.env == 'prod'").unwrap();
        let resource = serde_json::json!({ "metadata": { "labels": { "env": "prod" } } });
        let body = serde_json::json!({});
        assert!(filter.evaluate(&resource, &body).unwrap());
    }

    #[test]
    fn split_first_last_extract_the_image_name_from_a_tagged_reference() {
        let filter = CompiledFilter::compile(
            "request.body.tag.split('/').last().split(':').first() == resource.metadata.annotations['update-image']",
        )
        .unwrap();
        let body = serde_json::json!({ "tag": "registry.example.com/library/hello-world:1.1" });

        let matching = serde_json::json!({ "metadata": { "annotations": { "update-image": "hello-world" } } });
        assert!(filter.evaluate(&matching, &body).unwrap());

        let non_matching = serde_json::json!({ "metadata": { "annotations": { "update-image": "other-image" } } });
        assert!(!filter.evaluate(&non_matching, &body).unwrap());
    }

    #[test]
    fn first_and_last_agree_on_a_single_element_split() {
        let filter = CompiledFilter::compile("'hello-world'.split(',').first() == 'hello-world'.split(',').last()")
            .unwrap();
        let body = serde_json::json!({});
        let resource = serde_json::json!({});
        assert!(filter.evaluate(&resource, &body).unwrap());
    }
}
