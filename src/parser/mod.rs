use alloc::rc::Rc;
use alloc::sync::Arc;

use tracing::{trace, warn};

use crate::binding::{Binding, Segment, unescape_braces};
use crate::context::Context;
use crate::lexer::Lexer;
use crate::schema::{PropType, coerce};
use crate::template;
use crate::tree::{ComponentKind, Node, NodeId};
use crate::types::{
    Attribute, ErrorKind, SourceLocation, Tag, TagForm, TagNamespace, TemplateError, TokenKind,
};
use crate::utils::{camelize, condense_whitespace};
use crate::value::Value;

/// An element the parser is currently inside of.
enum Frame {
    /// A component or parameter node collecting children.
    Node {
        id: NodeId,
        /// `ns:name` the closing tag must repeat.
        tag: String,
        /// Opened by the parser for loose content rather than by a tag; closes
        /// together with its owner.
        implicit: bool,
    },
    /// A `<p:name>` tag whose text becomes a scalar property value.
    Scalar {
        owner: NodeId,
        prop: String,
        tag: String,
        text: String,
        loc: SourceLocation,
    },
}

/// Markup parser producing a component subtree.
///
/// The parser reads tokens from the [`Lexer`] and keeps a stack of open
/// elements. Text and component tags go into the innermost open node, or
/// into an implicitly opened default parameter when that node does not take
/// children directly. Parameter tags become properties of the innermost
/// component. Closing a tag runs the component's parsed hook, which is where
/// template definitions register and template instances expand.
///
/// All errors are fatal and carry the span of the offending markup.
pub struct Parser<'a> {
    /// Context receiving the nodes
    pub ctx: &'a mut Context,
    lexer: Lexer,
    root: NodeId,
    stack: Vec<Frame>,
}

/// Parse `source` into a new document root, or into `parent` when given.
/// Returns the node the content was attached to.
pub fn parse_into(
    ctx: &mut Context,
    source: Arc<str>,
    parent: Option<NodeId>,
) -> Result<NodeId, TemplateError> {
    let root = match parent {
        Some(parent) => parent,
        None => {
            let schema = Rc::clone(&ctx.component(ComponentKind::Fragment)?.schema);
            ctx.tree
                .alloc(Node::new("#document", ComponentKind::Fragment, schema))
        }
    };
    Parser::new(ctx, source, root).parse()?;
    Ok(root)
}

fn at<K: Into<ErrorKind>>(kind: K, loc: &SourceLocation) -> TemplateError {
    TemplateError::with_token(kind, loc)
}

impl<'a> Parser<'a> {
    /// A parser appending to `root`.
    pub fn new(ctx: &'a mut Context, source: Arc<str>, root: NodeId) -> Self {
        Self {
            ctx,
            lexer: Lexer::new(source),
            root,
            stack: Vec::new(),
        }
    }

    /// Consume the whole input.
    pub fn parse(&mut self) -> Result<(), TemplateError> {
        loop {
            let token = self.lexer.lex()?;
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Text(text) => self.text(text, &token.loc)?,
                TokenKind::Tag(tag) => match tag.form {
                    TagForm::Close => self.close(&tag, &token.loc)?,
                    TagForm::Open | TagForm::SelfClosing => match tag.namespace {
                        TagNamespace::Parameter => self.open_param(tag, &token.loc)?,
                        TagNamespace::Component | TagNamespace::Instance => {
                            self.open_component(tag, &token.loc)?;
                        }
                    },
                },
            }
        }

        self.close_implicit()?;
        match self.stack.pop() {
            None => Ok(()),
            Some(Frame::Scalar { tag, loc, .. }) => Err(at(ErrorKind::UnclosedTag { tag }, &loc)),
            Some(Frame::Node { id, tag, .. }) => Err(TemplateError::with_token(
                ErrorKind::UnclosedTag { tag },
                self.ctx.tree.get(id)?,
            )),
        }
    }

    /// The innermost open node.
    fn current(&self) -> Option<NodeId> {
        match self.stack.last() {
            None => Some(self.root),
            Some(Frame::Node { id, .. }) => Some(*id),
            Some(Frame::Scalar { .. }) => None,
        }
    }

    fn text(&mut self, text: String, loc: &SourceLocation) -> Result<(), TemplateError> {
        if let Some(Frame::Scalar { text: buffer, .. }) = self.stack.last_mut() {
            buffer.push_str(&text);
            return Ok(());
        }

        let container = if text.trim().is_empty() {
            match self.current() {
                Some(id) if self.ctx.tree.get(id)?.schema.allows_children => id,
                _ => return Ok(()),
            }
        } else {
            self.content_target(loc)?
        };
        let text = if self.ctx.settings.condense_whitespace {
            condense_whitespace(&text)
        } else {
            text
        };

        let segments = match Binding::parse(&text).map_err(|e| e.or_at(loc))? {
            None => vec![Segment::Literal(unescape_braces(&text).into_owned())],
            Some(Binding::Simple(expr)) => vec![Segment::Ref(expr)],
            Some(Binding::Composite(segments)) => segments,
        };
        let schema = Rc::clone(&self.ctx.component(ComponentKind::Literal)?.schema);
        for segment in segments {
            let mut node = Node::new("#text", ComponentKind::Literal, Rc::clone(&schema))
                .with_loc(Some(loc.clone()));
            match segment {
                Segment::Literal(text) => {
                    node.props.insert("text".to_owned(), Value::Markup(text));
                }
                Segment::Ref(expr) => {
                    node.bindings
                        .insert("text".to_owned(), Binding::Simple(expr));
                }
            }
            let id = self.ctx.tree.alloc(node);
            self.ctx.tree.append_child(container, id)?;
        }
        Ok(())
    }

    /// Where non-blank content goes: the innermost node if it takes children,
    /// else its default parameter, opened implicitly on first use.
    fn content_target(&mut self, loc: &SourceLocation) -> Result<NodeId, TemplateError> {
        let Some(id) = self.current() else {
            let Some(Frame::Scalar { prop, .. }) = self.stack.last() else {
                return Err(at("Parser stack is inconsistent", loc));
            };
            return Err(at(
                ErrorKind::TagInScalarParameter {
                    param: prop.clone(),
                },
                loc,
            ));
        };

        let node = self.ctx.tree.get(id)?;
        if node.schema.allows_children {
            return Ok(id);
        }
        if let Some(param) = node.schema.default_param.clone()
            && !node.props.contains_key(&param)
            && !node.bindings.contains_key(&param)
        {
            trace!(owner = %node.tag, param = %param, "opening default parameter");
            let pid = self.param_node(id, &param, loc)?;
            self.stack.push(Frame::Node {
                id: pid,
                tag: format!("{}:{param}", TagNamespace::Parameter),
                implicit: true,
            });
            return Ok(pid);
        }
        Err(at(
            ErrorKind::ContentNotAllowed {
                tag: node.tag.clone(),
            },
            loc,
        ))
    }

    /// Create a parameter container and store it in `prop` of `owner`.
    fn param_node(&mut self, owner: NodeId, prop: &str, loc: &SourceLocation) -> Result<NodeId, TemplateError> {
        let schema = Rc::clone(&self.ctx.component(ComponentKind::Param)?.schema);
        let pid = self.ctx.tree.alloc(
            Node::new(prop, ComponentKind::Param, schema).with_loc(Some(loc.clone())),
        );
        let node = self.ctx.tree.get_mut(owner)?;
        let list = node.schema.prop(prop).map(|spec| spec.ty) == Some(PropType::Params);
        node.bindings.remove(prop);
        let replaced = if list {
            match node.props.get_mut(prop) {
                Some(Value::List(items)) => {
                    items.push(Value::Content(pid));
                    None
                }
                _ => node
                    .props
                    .insert(prop.to_owned(), Value::List(vec![Value::Content(pid)])),
            }
        } else {
            node.props.insert(prop.to_owned(), Value::Content(pid))
        };
        if let Some(Value::Content(old)) = replaced {
            self.ctx.tree.remove(old)?;
        }
        self.ctx.tree.adopt(owner, pid)?;
        Ok(pid)
    }

    fn close_implicit(&mut self) -> Result<(), TemplateError> {
        while let Some(Frame::Node { implicit: true, .. }) = self.stack.last() {
            if let Some(Frame::Node { id, .. }) = self.stack.pop() {
                self.finish(id)?;
            }
        }
        Ok(())
    }

    fn open_param(&mut self, tag: Tag, loc: &SourceLocation) -> Result<(), TemplateError> {
        self.close_implicit()?;
        let qualified = tag.qualified_name();
        let owner = match self.stack.last() {
            None => {
                return Err(at(ErrorKind::ParameterOutsideComponent { param: tag.name }, loc));
            }
            Some(Frame::Scalar { prop, .. }) => {
                return Err(at(
                    ErrorKind::TagInScalarParameter {
                        param: prop.clone(),
                    },
                    loc,
                ));
            }
            Some(Frame::Node { id, .. }) => *id,
        };

        let prop = camelize(&tag.name);
        let node = self.ctx.tree.get(owner)?;
        let ty = match node.schema.lookup(&node.tag, &prop) {
            Ok(spec) => spec.map(|spec| spec.ty),
            Err(_) => {
                return Err(at(
                    ErrorKind::UndeclaredParameter {
                        component: node.tag.clone(),
                        param: tag.name,
                    },
                    loc,
                ));
            }
        };
        let self_closing = tag.form == TagForm::SelfClosing;

        if ty.is_none_or(PropType::is_structured) {
            let pid = self.param_node(owner, &prop, loc)?;
            self.apply_attributes(pid, &tag.attributes)?;
            if self_closing {
                self.finish(pid)?;
            } else {
                self.stack.push(Frame::Node {
                    id: pid,
                    tag: qualified,
                    implicit: false,
                });
            }
            return Ok(());
        }

        if !tag.attributes.is_empty() {
            return Err(at(
                ErrorKind::PropertiesNotSupported {
                    component: qualified,
                },
                loc,
            ));
        }
        if self_closing {
            self.set_attribute(owner, &prop, "", loc)
        } else {
            self.stack.push(Frame::Scalar {
                owner,
                prop,
                tag: qualified,
                text: String::new(),
                loc: loc.clone(),
            });
            Ok(())
        }
    }

    fn open_component(&mut self, tag: Tag, loc: &SourceLocation) -> Result<(), TemplateError> {
        let container = self.content_target(loc)?;
        let qualified = tag.qualified_name();

        let registered = match tag.namespace {
            TagNamespace::Component => self.ctx.resolve_tag(&tag.name),
            _ => None,
        };
        let (kind, schema) = if let Some(kind) = registered {
            (kind, Rc::clone(&self.ctx.component(kind)?.schema))
        } else {
            let def = match self.ctx.template(&tag.name) {
                Some(def) => def,
                None if self.ctx.settings.strict && tag.namespace == TagNamespace::Component => {
                    return Err(at(ErrorKind::UnknownTag { tag: qualified }, loc));
                }
                None => {
                    if tag.namespace == TagNamespace::Component {
                        warn!(tag = %qualified, "unregistered component tag, looking for a template file");
                    }
                    template::discover(self.ctx, &tag.name).map_err(|e| e.or_at(loc))?
                }
            };
            (ComponentKind::Instance, Rc::clone(&def.instance_schema))
        };

        let id = self
            .ctx
            .tree
            .alloc(Node::new(tag.name.clone(), kind, schema).with_loc(Some(loc.clone())));
        self.ctx.tree.append_child(container, id)?;
        self.apply_attributes(id, &tag.attributes)?;

        if tag.form == TagForm::SelfClosing {
            self.finish(id)
        } else {
            self.stack.push(Frame::Node {
                id,
                tag: qualified,
                implicit: false,
            });
            Ok(())
        }
    }

    fn close(&mut self, tag: &Tag, loc: &SourceLocation) -> Result<(), TemplateError> {
        let found = tag.qualified_name();
        if matches!(self.stack.last(), Some(Frame::Node { implicit: true, .. })) {
            self.close_implicit()?;
        }
        let mismatch = |expected: String| {
            at(
                ErrorKind::MismatchedCloseTag {
                    expected,
                    found: found.clone(),
                },
                loc,
            )
        };

        match self.stack.pop() {
            None => Err(at(ErrorKind::UnexpectedCloseTag { found: found.clone() }, loc)),
            Some(Frame::Node { id, tag, .. }) => {
                if tag != found {
                    return Err(mismatch(tag));
                }
                self.finish(id)
            }
            Some(Frame::Scalar {
                owner,
                prop,
                tag,
                text,
                loc: open_loc,
            }) => {
                if tag != found {
                    return Err(mismatch(tag));
                }
                self.set_attribute(owner, &prop, text.trim(), &open_loc)
            }
        }
    }

    /// Run the parsed hook of a node whose closing tag has been read.
    fn finish(&mut self, id: NodeId) -> Result<(), TemplateError> {
        let node = self.ctx.tree.get(id)?;
        let loc = node.loc.clone();
        let parsed = self.ctx.component(node.kind)?.parsed;
        if let Some(parsed) = parsed {
            parsed(self.ctx, id).map_err(|e| e.or_at(&loc))?;
        }
        Ok(())
    }

    fn apply_attributes(&mut self, id: NodeId, attributes: &[Attribute]) -> Result<(), TemplateError> {
        let mut styles: Vec<String> = Vec::new();
        let mut styles_loc: Option<SourceLocation> = None;
        for attr in attributes {
            if let Some(property) = attr.name.strip_prefix("style:") {
                styles.push(format!("{property}:{}", attr.value));
                styles_loc = SourceLocation::range(styles_loc, Some(attr.loc.clone()));
                continue;
            }
            self.set_attribute(id, &camelize(&attr.name), &attr.value, &attr.loc)?;
        }
        if let Some(loc) = styles_loc {
            let node = self.ctx.tree.get(id)?;
            let mut joined = match node.props.get("styles") {
                Some(Value::Text(existing)) if !existing.is_empty() => format!("{existing};"),
                _ => String::new(),
            };
            joined.push_str(&styles.join(";"));
            self.set_attribute(id, "styles", &joined, &loc)?;
        }
        Ok(())
    }

    /// Set one property from its raw markup value: a pending binding when it
    /// holds a binding span, otherwise a schema-checked constant.
    fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        raw: &str,
        loc: &SourceLocation,
    ) -> Result<(), TemplateError> {
        let node = self.ctx.tree.get(id)?;
        let spec = match node.schema.lookup(&node.tag, name) {
            Ok(spec) => spec.cloned(),
            Err(_) if node.kind == ComponentKind::Instance => {
                let expected = self
                    .ctx
                    .template(&node.tag)
                    .map(|def| def.expected_params())
                    .unwrap_or_default();
                return Err(at(
                    ErrorKind::UnknownTemplateParam {
                        template: node.tag.clone(),
                        param: name.to_owned(),
                        expected,
                    },
                    loc,
                ));
            }
            Err(err) => return Err(err.or_at(loc)),
        };

        if let Some(binding) = Binding::parse(raw).map_err(|e| e.or_at(loc))? {
            let node = self.ctx.tree.get_mut(id)?;
            if let Some(Value::Content(old)) = node.props.remove(name) {
                self.ctx.tree.remove(old)?;
            }
            self.ctx
                .tree
                .get_mut(id)?
                .bindings
                .insert(name.to_owned(), binding);
            return Ok(());
        }

        let raw = unescape_braces(raw);
        let value = match &spec {
            Some(spec) if spec.ty == PropType::Binding => {
                return Err(at(
                    ErrorKind::BindingRequired {
                        component: node.tag.clone(),
                        property: name.to_owned(),
                    },
                    loc,
                ));
            }
            Some(spec) if spec.ty == PropType::Content => Value::Markup(raw.into_owned()),
            _ => Value::Text(raw.into_owned()),
        };
        let value = match &spec {
            Some(spec) => coerce(&node.tag, spec, value).map_err(|e| e.or_at(loc))?,
            None => value,
        };
        let node = self.ctx.tree.get_mut(id)?;
        node.bindings.remove(name);
        if let Some(Value::Content(old)) = node.props.insert(name.to_owned(), value) {
            self.ctx.tree.remove(old)?;
        }
        Ok(())
    }
}

/// Take the text of every literal child of `id`, concatenated.
#[must_use]
pub fn literal_text(ctx: &Context, id: NodeId) -> String {
    let Ok(node) = ctx.tree.get(id) else {
        return String::new();
    };
    node.children
        .iter()
        .filter_map(|child| ctx.tree.get(*child).ok())
        .filter_map(|child| child.props.get("text"))
        .map(Value::to_text)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorCategory;

    fn parse(ctx: &mut Context, source: &str) -> Result<NodeId, TemplateError> {
        parse_into(ctx, Arc::from(source), None)
    }

    fn kinds(ctx: &Context, id: NodeId) -> Vec<ComponentKind> {
        ctx.tree
            .children(id)
            .unwrap()
            .iter()
            .map(|c| ctx.tree.get(*c).unwrap().kind)
            .collect()
    }

    #[test]
    fn test_text_is_split_around_bindings() {
        let mut ctx = Context::default();
        let root = parse(&mut ctx, "<h1>{page.title}</h1>").unwrap();
        let children = ctx.tree.children(root).unwrap();
        assert_eq!(children.len(), 3);
        let middle = ctx.tree.get(children[1]).unwrap();
        assert!(middle.bindings.contains_key("text"));
        assert_eq!(
            ctx.tree.get(children[0]).unwrap().props.get("text"),
            Some(&Value::Markup("<h1>".to_owned()))
        );
    }

    #[test]
    fn test_default_param_opens_implicitly() {
        let mut ctx = Context::default();
        let root = parse(&mut ctx, "<c:For each=\"{rows}\"><p:header>H</p:header>row</c:For>").unwrap();
        let for_id = ctx.tree.children(root).unwrap()[0];
        let node = ctx.tree.get(for_id).unwrap();
        let Some(Value::Content(body)) = node.props.get("body") else {
            panic!("expected implicit body parameter");
        };
        assert_eq!(literal_text(&ctx, *body), "row");
        assert!(node.bindings.contains_key("each"));
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_scalar_parameter_tags() {
        let mut ctx = Context::default();
        let root = parse(&mut ctx, "<c:For><p:count> 3 </p:count><p:as>row</p:as></c:For>").unwrap();
        let node = ctx.tree.get(ctx.tree.children(root).unwrap()[0]).unwrap();
        assert_eq!(node.props.get("count"), Some(&Value::Number(3.0)));
        assert_eq!(node.props.get("as"), Some(&Value::from("row")));

        let err = parse(&mut ctx, "<c:For><p:count><c:If/></p:count></c:For>").unwrap_err();
        assert!(matches!(err.kind.as_ref(), ErrorKind::TagInScalarParameter { .. }));
    }

    #[test]
    fn test_style_attributes_fold_into_styles() {
        let mut ctx = Context::default();
        ctx.define_component(crate::define_component::ComponentDefSpec {
            kind: ComponentKind::Custom("Box"),
            names: &["Box"],
            schema: crate::schema::Schema::new(vec![crate::schema::PropSpec::new(
                "styles",
                PropType::Text,
            )]),
            scope_vars: &[],
            parsed: None,
            pre_render: None,
            render: |_, _, _, _| Ok(()),
            post_render: None,
        });
        let root = parse(&mut ctx, "<c:Box style:color=\"red\" style:margin=\"0\"/>").unwrap();
        let node = ctx.tree.get(ctx.tree.children(root).unwrap()[0]).unwrap();
        assert_eq!(node.props.get("styles"), Some(&Value::from("color:red;margin:0")));
    }

    #[test]
    fn test_structural_errors() {
        let mut ctx = Context::default();
        let cases: &[(&str, fn(&ErrorKind) -> bool)] = &[
            ("<c:If the=\"{x}\">", |k| matches!(k, ErrorKind::UnclosedTag { .. })),
            ("</c:If>", |k| matches!(k, ErrorKind::UnexpectedCloseTag { .. })),
            ("<c:If the=\"{x}\"></c:For>", |k| matches!(k, ErrorKind::MismatchedCloseTag { .. })),
            ("<c:Assets>text</c:Assets>", |k| matches!(k, ErrorKind::ContentNotAllowed { .. })),
            ("<p:body>x</p:body>", |k| matches!(k, ErrorKind::ParameterOutsideComponent { .. })),
            ("<c:If the=\"{x}\"><p:colour/></c:If>", |k| {
                matches!(k, ErrorKind::UndeclaredParameter { .. })
            }),
            ("<c:If the=\"x\"/>", |k| matches!(k, ErrorKind::BindingRequired { .. })),
            ("<c:For count=\"many\"/>", |k| matches!(k, ErrorKind::InvalidNumber { .. })),
        ];
        for (source, check) in cases {
            let err = parse(&mut ctx, source).unwrap_err();
            assert!(check(&err.kind), "{source}: {err}");
            assert!(err.position.is_some(), "{source}: error has no position");
        }
    }

    #[test]
    fn test_strict_mode_rejects_unknown_tags() {
        let mut ctx = Context::new(crate::Settings::builder().strict(true).build());
        let err = parse(&mut ctx, "<c:Nope/>").unwrap_err();
        assert!(matches!(err.kind.as_ref(), ErrorKind::UnknownTag { tag } if tag == "c:Nope"));
        assert_eq!(err.category(), ErrorCategory::Parse);

        let mut ctx = Context::default();
        let err = parse(&mut ctx, "<c:Nope/>").unwrap_err();
        assert!(matches!(err.kind.as_ref(), ErrorKind::TemplateFileNotFound { .. }));
    }
}
