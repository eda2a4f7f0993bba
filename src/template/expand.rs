use core::{iter, mem};

use tracing::{debug, trace};

use crate::binding::{Binding, DATA_ROOT, Expr, Operand, PipeCall, Segment};
use crate::context::Context;
use crate::namespace::{KeyMap, KeySet};
use crate::schema::PropType;
use crate::template::TemplateDef;
use crate::tree::{ComponentKind, NodeId};
use crate::types::{ErrorKind, TemplateError};
use crate::value::Value;

/// What the instance tag supplied for one parameter.
enum Supplied {
    Value(Value),
    Binding(Binding),
}

/// Result of substituting one expression.
enum Substituted {
    /// Not a parameter reference; left for render-time evaluation.
    Keep(Expr),
    /// Rewritten to an expression evaluated in the caller's data.
    Expr(Expr),
    /// Reduced to a constant.
    Value(Value),
}

/// Result of rewriting a whole binding.
enum Rewritten {
    Binding(Binding),
    Value(Value),
}

/// A loop variable bound inside the body, with the name it is published
/// under in this expansion.
struct ScopeVar {
    name: String,
    bound: String,
}

struct Expansion<'a> {
    def: &'a TemplateDef,
    supplied: KeyMap<String, Supplied>,
    /// Data names the caller's own expressions start from. Body loop
    /// variables with these names are renamed so they cannot capture them.
    captured: KeySet<String>,
}

/// Expand the template instance `instance` in place.
///
/// The canonical body is cloned, every reference to a template parameter in
/// the clone is substituted with the supplied constant, the default, or the
/// caller's own binding, and the clone takes the instance's place in the tree.
/// The template's assets are hoisted onto the context.
pub fn expand(ctx: &mut Context, instance: NodeId) -> Result<(), TemplateError> {
    let node = ctx.tree.get(instance)?;
    let def = ctx.template(&node.tag).ok_or_else(|| {
        TemplateError::with_token(
            ErrorKind::UndefinedTemplate {
                name: node.tag.clone(),
            },
            node,
        )
    })?;

    let mut supplied = KeyMap::default();
    for (name, value) in &node.props {
        supplied.insert(name.clone(), Supplied::Value(value.clone()));
    }
    for (name, binding) in &node.bindings {
        supplied.insert(name.clone(), Supplied::Binding(binding.clone()));
    }
    for param in &def.params {
        let given = match supplied.get(&param.name) {
            Some(Supplied::Value(value)) => *value != Value::Null,
            Some(Supplied::Binding(_)) => true,
            None => false,
        };
        if param.required && !given {
            return Err(TemplateError::with_token(
                ErrorKind::MissingTemplateParam {
                    template: def.name.clone(),
                    param: param.name.clone(),
                },
                node,
            ));
        }
    }
    let loc = node.loc.clone();

    let mut captured = KeySet::default();
    for given in supplied.values() {
        match given {
            Supplied::Binding(binding) => {
                for expr in binding.exprs() {
                    collect_heads(expr, &mut captured);
                }
            }
            Supplied::Value(Value::Content(content)) => {
                for id in iter::once(*content).chain(ctx.tree.descendants(*content)?) {
                    for expr in ctx.tree.get(id)?.bindings.values().flat_map(|b| b.exprs()) {
                        collect_heads(expr, &mut captured);
                    }
                }
            }
            Supplied::Value(_) => {}
        }
    }

    debug!(template = %def.name, "expanding template instance");
    let root = ctx.tree.deep_clone(def.body)?;
    let expansion = Expansion {
        def: &def,
        supplied,
        captured,
    };
    expansion
        .walk(ctx, root, &mut Vec::new())
        .map_err(|e| e.or_at(&loc))?;

    for asset in &def.assets {
        ctx.add_asset(asset.clone());
    }
    ctx.tree.replace(instance, root)
}

fn collect_heads(expr: &Expr, out: &mut KeySet<String>) {
    match &expr.operand {
        Operand::Path(path) => {
            let path = match path.split_first() {
                Some((head, rest)) if head == DATA_ROOT => rest,
                _ => path.as_slice(),
            };
            if let Some(head) = path.first() {
                out.insert(head.clone());
            }
        }
        Operand::Interpolated(segments) => {
            for segment in segments {
                if let Segment::Ref(inner) = segment {
                    collect_heads(inner, out);
                }
            }
        }
        Operand::Literal(_) => {}
    }
}

impl Expansion<'_> {
    fn walk(&self, ctx: &mut Context, id: NodeId, scope: &mut Vec<ScopeVar>) -> Result<(), TemplateError> {
        let node = ctx.tree.get(id)?;
        let kind = node.kind;
        let loc = node.loc.clone();
        // Content substituted below comes from the caller and is already
        // expanded; only what the body itself owns is walked.
        let owned: Vec<NodeId> = node
            .children
            .iter()
            .copied()
            .chain(node.content_ids())
            .collect();

        let mut bindings: Vec<(String, Binding)> =
            mem::take(&mut ctx.tree.get_mut(id)?.bindings).into_iter().collect();
        bindings.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        for (key, binding) in bindings {
            let rewritten = self.rewrite(binding, scope).map_err(|e| e.or_at(&loc))?;
            match rewritten {
                Rewritten::Binding(binding) => {
                    ctx.tree.get_mut(id)?.bindings.insert(key, binding);
                }
                Rewritten::Value(Value::Content(param))
                    if kind == ComponentKind::Literal && key == "text" =>
                {
                    trace!(template = %self.def.name, "splicing content parameter");
                    let copy = ctx.tree.deep_clone(param)?;
                    ctx.tree.replace(id, copy)?;
                    return Ok(());
                }
                Rewritten::Value(value) => self.assign(ctx, id, &key, value)?,
            }
        }

        let mut pushed = 0;
        let scope_vars = ctx.component(kind).map_or(&[][..], |spec| spec.scope_vars);
        for var in scope_vars {
            let node = ctx.tree.get(id)?;
            let name = match node.props.get(*var) {
                Some(value) if value.is_set() => Some(value.to_text()),
                _ => node
                    .schema
                    .prop(var)
                    .and_then(|spec| spec.default.as_ref())
                    .map(Value::to_text),
            };
            let Some(name) = name else {
                continue;
            };
            let bound = if self.captured.contains(&name) {
                let fresh = ctx.auto_id(&format!("{name}$"));
                trace!(template = %self.def.name, from = %name, to = %fresh, "renaming loop variable");
                ctx.tree
                    .get_mut(id)?
                    .props
                    .insert((*var).to_owned(), Value::Text(fresh.clone()));
                fresh
            } else {
                name.clone()
            };
            scope.push(ScopeVar { name, bound });
            pushed += 1;
        }

        let result = owned
            .into_iter()
            .try_for_each(|child| self.walk(ctx, child, scope));
        scope.truncate(scope.len() - pushed);
        result
    }

    fn assign(&self, ctx: &mut Context, id: NodeId, key: &str, value: Value) -> Result<(), TemplateError> {
        let node = ctx.tree.get(id)?;
        let ty = node.schema.prop(key).map(|spec| spec.ty);
        if ty == Some(PropType::Binding) {
            ctx.tree
                .get_mut(id)?
                .bindings
                .insert(key.to_owned(), Binding::Simple(Expr::literal(value)));
            return Ok(());
        }
        let value = ctx.tree.clone_value(&value, id)?;
        let node = ctx.tree.get(id)?;
        let value = node
            .schema
            .coerce(&node.tag, key, value)
            .map_err(|e| e.or_at(node))?;
        ctx.tree.get_mut(id)?.props.insert(key.to_owned(), value);
        Ok(())
    }

    fn rewrite(&self, binding: Binding, scope: &[ScopeVar]) -> Result<Rewritten, TemplateError> {
        match binding {
            Binding::Simple(expr) => Ok(match self.substitute(expr, scope)? {
                Substituted::Keep(expr) => Rewritten::Binding(Binding::Simple(expr)),
                Substituted::Expr(Expr {
                    operand: Operand::Interpolated(segments),
                    pipes,
                }) if pipes.is_empty() => Rewritten::Binding(Binding::Composite(segments)),
                Substituted::Expr(expr) => Rewritten::Binding(Binding::Simple(expr)),
                Substituted::Value(value) => Rewritten::Value(value),
            }),
            Binding::Composite(segments) => Ok(match fold(self.rewrite_segments(segments, scope)?) {
                Folded::Refs(segments) => Rewritten::Binding(Binding::Composite(segments)),
                Folded::Text(text) => Rewritten::Value(Value::Text(text)),
            }),
        }
    }

    fn rewrite_segments(&self, segments: Vec<Segment>, scope: &[ScopeVar]) -> Result<Vec<Segment>, TemplateError> {
        let mut out: Vec<Segment> = Vec::with_capacity(segments.len());
        for segment in segments {
            let expr = match segment {
                Segment::Literal(text) => {
                    push_literal(&mut out, &text);
                    continue;
                }
                Segment::Ref(expr) => expr,
            };
            let head = expr.head().map(str::to_owned);
            match self.substitute(expr, scope)? {
                Substituted::Keep(expr) => out.push(Segment::Ref(expr)),
                Substituted::Expr(Expr {
                    operand: Operand::Interpolated(inner),
                    pipes,
                }) if pipes.is_empty() => {
                    for seg in inner {
                        match seg {
                            Segment::Literal(text) => push_literal(&mut out, &text),
                            reference @ Segment::Ref(_) => out.push(reference),
                        }
                    }
                }
                Substituted::Expr(expr) => out.push(Segment::Ref(expr)),
                Substituted::Value(Value::Content(_)) => {
                    return Err(TemplateError::new(ErrorKind::TypeMismatch {
                        component: self.def.name.clone(),
                        property: head.unwrap_or_default(),
                        expected: "text, not content, inside a composite value",
                    }));
                }
                Substituted::Value(value) => push_literal(&mut out, &value.to_text()),
            }
        }
        Ok(out)
    }

    fn substitute(&self, expr: Expr, scope: &[ScopeVar]) -> Result<Substituted, TemplateError> {
        let pipes = expr.pipes;
        let path = match expr.operand {
            Operand::Path(path) => path,
            Operand::Interpolated(segments) => {
                let operand = match fold(self.rewrite_segments(segments, scope)?) {
                    Folded::Refs(segments) => Operand::Interpolated(segments),
                    Folded::Text(text) => Operand::Literal(Value::Text(text)),
                };
                return Ok(match operand {
                    Operand::Literal(value) if pipes.is_empty() => Substituted::Value(value),
                    operand => Substituted::Expr(Expr { operand, pipes }),
                });
            }
            operand @ Operand::Literal(_) => return Ok(Substituted::Keep(Expr { operand, pipes })),
        };
        let Some((head, rest)) = path.split_first() else {
            return Ok(Substituted::Keep(Expr {
                operand: Operand::Path(path),
                pipes,
            }));
        };
        if head == DATA_ROOT {
            return Ok(Substituted::Keep(Expr {
                operand: Operand::Path(path),
                pipes,
            }));
        }
        if let Some(var) = scope.iter().rev().find(|var| var.name == *head) {
            let path = iter::once(var.bound.clone()).chain(rest.iter().cloned()).collect();
            return Ok(Substituted::Keep(Expr {
                operand: Operand::Path(path),
                pipes,
            }));
        }
        let Some(param) = self.def.param(head) else {
            if rest.is_empty() {
                return Err(TemplateError::new(ErrorKind::UnknownTemplateParam {
                    template: self.def.name.clone(),
                    param: head.clone(),
                    expected: self.def.expected_params(),
                }));
            }
            return Ok(Substituted::Keep(Expr {
                operand: Operand::Path(path),
                pipes,
            }));
        };

        let constant = match self.supplied.get(head) {
            Some(Supplied::Binding(binding)) => {
                return transfer(binding, rest, &pipes).map(Substituted::Expr);
            }
            Some(Supplied::Value(value)) if *value != Value::Null => value.clone(),
            _ => param.default.clone().unwrap_or(Value::Null),
        };
        let value = if rest.is_empty() {
            constant
        } else {
            constant.lookup(rest)
        };
        if pipes.is_empty() {
            Ok(Substituted::Value(value))
        } else {
            Ok(Substituted::Expr(Expr {
                operand: Operand::Literal(value),
                pipes,
            }))
        }
    }
}

/// Rewritten composite segments.
enum Folded {
    /// At least one reference is left for render time.
    Refs(Vec<Segment>),
    /// Every reference was a constant.
    Text(String),
}

fn fold(segments: Vec<Segment>) -> Folded {
    if segments.iter().any(|s| matches!(s, Segment::Ref(_))) {
        return Folded::Refs(segments);
    }
    let text = segments
        .into_iter()
        .map(|s| match s {
            Segment::Literal(text) => text,
            Segment::Ref(_) => String::new(),
        })
        .collect();
    Folded::Text(text)
}

fn push_literal(out: &mut Vec<Segment>, text: &str) {
    if let Some(Segment::Literal(last)) = out.last_mut() {
        last.push_str(text);
    } else if !text.is_empty() {
        out.push(Segment::Literal(text.to_owned()));
    }
}

/// Point a template reference at the caller's expression: `{param.rest|p2}`
/// with the caller writing `param="{src.path|p1}"` becomes
/// `{src.path.rest|p1|p2}`.
fn transfer(binding: &Binding, rest: &[String], outer: &[PipeCall]) -> Result<Expr, TemplateError> {
    let (operand, mut pipes) = match binding {
        Binding::Simple(inner) => {
            if !rest.is_empty() && !inner.pipes.is_empty() {
                return Err(TemplateError::new(ErrorKind::InvalidBinding {
                    expr: inner.to_string(),
                    reason: "cannot select a field of a piped parameter value",
                }));
            }
            let operand = match &inner.operand {
                Operand::Path(path) => Operand::Path(path.iter().chain(rest).cloned().collect()),
                Operand::Literal(value) => Operand::Literal(value.lookup(rest)),
                Operand::Interpolated(_) if !rest.is_empty() => Operand::Literal(Value::Null),
                Operand::Interpolated(segments) => Operand::Interpolated(segments.clone()),
            };
            (operand, inner.pipes.clone())
        }
        Binding::Composite(_) if !rest.is_empty() => (Operand::Literal(Value::Null), Vec::new()),
        Binding::Composite(segments) => (Operand::Interpolated(segments.clone()), Vec::new()),
    };
    pipes.extend_from_slice(outer);
    Ok(Expr { operand, pipes })
}
