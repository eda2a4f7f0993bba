//! Conditional rendering: `<c:If>`.
//!
//! The subject is the resolved `the` binding. Each of `is`, `isTrue`,
//! `isSet` and `matches` that is present adds a test; all present tests must
//! pass, and with no test at all the subject's truthiness decides. `not`
//! inverts the outcome. Children render when the outcome is true, the `else`
//! slot otherwise.
//!
//! With `<p:case is="a|b">` parameters the component switches instead: the
//! first case whose `is` matches the subject renders, or `else` when none
//! does. `not` has no effect in that form.

use core::fmt;

use tracing::trace;

use crate::context::Context;
use crate::define_component::{ComponentDefSpec, Props};
use crate::render::{databind, render_children, render_slot};
use crate::schema::{PropSpec, PropType, Schema};
use crate::tree::{ComponentKind, NodeId};
use crate::types::TemplateError;
use crate::value::Value;

fn matches_any(subject: &Value, alternatives: &str) -> bool {
    let subject = subject.to_text();
    alternatives.split('|').any(|alt| alt == subject)
}

/// Evaluate the non-switch form.
fn condition(ctx: &mut Context, props: &Props) -> Result<bool, TemplateError> {
    let subject = props.get("the");
    let mut tested = false;
    let mut pass = true;

    if props.is_supplied("is") {
        tested = true;
        pass &= matches_any(&subject, &props.text("is"));
    }
    if props.bool("isTrue") {
        tested = true;
        pass &= subject.is_truthy();
    }
    if props.bool("isSet") {
        tested = true;
        pass &= subject.is_set();
    }
    if props.is_supplied("matches") {
        tested = true;
        let re = ctx.regex(&props.text("matches"))?;
        pass &= re.is_match(&subject.to_text());
    }
    if !tested {
        pass = subject.is_truthy();
    }
    Ok(pass ^ props.bool("not"))
}

fn render(
    ctx: &mut Context,
    id: NodeId,
    props: &Props,
    out: &mut dyn fmt::Write,
) -> Result<(), TemplateError> {
    let cases = props.params("case");
    if !cases.is_empty() {
        let subject = props.get("the");
        for case in cases {
            let case_props = databind(ctx, case)?;
            if matches_any(&subject, &case_props.text("is")) {
                trace!(node = id.index(), "case matched");
                return render_children(ctx, case, out);
            }
        }
        return render_slot(ctx, props, "else", out);
    }

    if condition(ctx, props)? {
        render_children(ctx, id, out)
    } else {
        render_slot(ctx, props, "else", out)
    }
}

/// Registers `<c:If>`.
pub fn define_if(ctx: &mut Context) {
    ctx.define_component(ComponentDefSpec {
        kind: ComponentKind::If,
        names: &["If"],
        schema: Schema::new(vec![
            PropSpec::new("the", PropType::Binding),
            PropSpec::new("is", PropType::Text),
            PropSpec::new("isTrue", PropType::Bool).with_default(false),
            PropSpec::new("isSet", PropType::Bool).with_default(false),
            PropSpec::new("matches", PropType::Text),
            PropSpec::new("not", PropType::Bool).with_default(false),
            PropSpec::new("case", PropType::Params),
            PropSpec::new("else", PropType::Content),
        ])
        .with_children(),
        scope_vars: &[],
        parsed: None,
        pre_render: None,
        render,
        post_render: None,
    });
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;

    use super::*;
    use crate::namespace::KeyMap;

    fn props(ctx: &Context, pairs: &[(&str, Value)]) -> Props {
        let schema = Rc::clone(&ctx.component(ComponentKind::If).unwrap().schema);
        let mut values = KeyMap::default();
        for (k, v) in pairs {
            values.insert((*k).to_owned(), v.clone());
        }
        Props::new(values, schema)
    }

    fn check(pairs: &[(&str, Value)]) -> bool {
        let mut ctx = Context::default();
        let props = props(&ctx, pairs);
        condition(&mut ctx, &props).unwrap()
    }

    #[test]
    fn test_truth_table() {
        assert!(check(&[("the", Value::from("x"))]));
        assert!(!check(&[("the", Value::from(""))]));
        assert!(check(&[("the", Value::from("")), ("not", Value::Bool(true))]));
        assert!(check(&[("the", Value::from("b")), ("is", Value::from("a|b"))]));
        assert!(!check(&[("the", Value::from("c")), ("is", Value::from("a|b"))]));
        assert!(!check(&[
            ("the", Value::from("b")),
            ("is", Value::from("a|b")),
            ("not", Value::Bool(true)),
        ]));
        assert!(check(&[("the", Value::from("0")), ("isSet", Value::Bool(true))]));
        assert!(!check(&[("the", Value::Null), ("isSet", Value::Bool(true))]));
        assert!(!check(&[
            ("the", Value::from("abc")),
            ("isSet", Value::Bool(true)),
            ("matches", Value::from("^x")),
        ]));
        assert!(check(&[("the", Value::from("abc")), ("matches", Value::from("^a.c$"))]));
        assert!(!check(&[("the", Value::Number(0.0)), ("isTrue", Value::Bool(true))]));
    }
}
