#[macro_use]
mod setup;

use std::fs;
use std::path::PathBuf;

use serde_json::json;
use setup::{condensed_settings, default_settings, it, kind, strict_settings};
use tagtree::{
    ComponentDefSpec, ComponentKind, Context, DataSource, ErrorCategory, ErrorKind, MemoryLoader,
    PropSpec, PropType, Schema, Settings, Value, parse, render_to_string, render_tree_to_string,
    utils::escape,
};

#[test]
fn literal_markup() {
    it("renders literal text unchanged", || {
        expect!("<div class=\"x\">Hello &amp; goodbye</div>\n  <br/>")
            .to_render_as("<div class=\"x\">Hello &amp; goodbye</div>\n  <br/>", &default_settings())
    });

    it("keeps braces that do not open a binding", || {
        expect!("body { color: red }").to_render_as("body { color: red }", &default_settings())
    });

    it("writes a doubled brace as a literal one", || {
        expect!("<style>p{{color:red}</style><script>if(a){{return 1}</script>")
            .to_render_as("<style>p{color:red}</style><script>if(a){return 1}</script>", &default_settings())
    });

    it("condenses whitespace when configured", || {
        expect!("a   b\n\n c").to_render_as("a b c", &condensed_settings())
    });
}

#[test]
fn bindings() {
    it("escapes binding output unless piped through raw", || {
        let mut ctx = Context::default();
        ctx.set_data("user", json!({"name": "<Ada>"}));
        let html = render_to_string(&mut ctx, "<b>{user.name}</b>|{user.name|raw}")?;
        assert_eq!(html, "<b>&lt;Ada&gt;</b>|<Ada>");
        Ok(())
    });

    it("chains built-in pipes with arguments", || {
        let mut ctx = Context::default();
        ctx.set_data("page", json!({"tags": ["a", "b"], "price": 2.5}));
        let html = render_to_string(
            &mut ctx,
            "{page.tags|join:' / '|upper} {page.price|fixed:2} {page.missing|default:none}",
        )?;
        assert_eq!(html, "A / B 2.50 none");
        Ok(())
    });

    it("resolves missing data sources to nothing", || {
        expect!("[{nothing.here}]").to_render_as("[]", &default_settings())
    });

    it("uses registered pipes before built-ins", || {
        let mut ctx = Context::default();
        ctx.pipes
            .register("upper", |v, _| Ok(Value::Text(format!("~{v}~"))));
        ctx.set_data("word", "hi");
        assert_eq!(render_to_string(&mut ctx, "{word|upper}")?, "~hi~");
        Ok(())
    });
}

#[test]
fn unknown_pipe_fails_at_render_time() {
    let mut ctx = Context::default();
    ctx.set_data("name", "x");
    let root = parse(&mut ctx, "<b>{name|shout}</b>").expect("unknown pipes are not checked while parsing");

    let err = render_tree_to_string(&mut ctx, root).unwrap_err();
    assert_let!(ErrorKind::PipeNotFound { name } = kind(&err));
    assert_eq!(name, "shout");
    assert_eq!(err.category(), ErrorCategory::Resolution);
    assert!(err.position.is_some());
}

struct Shouter;

impl tagtree::PipeFallback for Shouter {
    fn call(&self, method: &str, value: &Value, _: &[String]) -> Option<Result<Value, tagtree::TemplateError>> {
        (method == "shout_pipe").then(|| Ok(Value::Text(format!("{value}!"))))
    }
}

#[test]
fn pipe_fallback_object() {
    let mut ctx = Context::default();
    ctx.pipes.set_fallback(Shouter);
    ctx.set_data("name", "hey");
    assert_eq!(render_to_string(&mut ctx, "{name|shout}").unwrap(), "hey!");
    let err = render_to_string(&mut ctx, "{name|whisper}").unwrap_err();
    assert!(matches!(kind(&err), ErrorKind::PipeNotFound { .. }));
}

#[test]
fn property_validation() {
    let settings = default_settings();

    let err = expect!("<c:Assets type=\"scripts\"/>").not_to_parse(&settings);
    assert_let!(ErrorKind::ValueNotInEnum { property, value, .. } = kind(&err));
    assert_eq!(property, "type");
    assert_eq!(value, "scripts");
    assert_eq!(err.category(), ErrorCategory::Schema);

    let err = expect!("<c:For each=\"{rows}\" count=\"many\">x</c:For>").not_to_parse(&settings);
    assert_let!(ErrorKind::InvalidNumber { component, property, .. } = kind(&err));
    assert_eq!(component, "For");
    assert_eq!(property, "count");
    assert_eq!(err.category(), ErrorCategory::Schema);

    let err = expect!("<c:If the=\"{x}\" colour=\"red\">y</c:If>").not_to_parse(&settings);
    assert_let!(ErrorKind::UndeclaredProperty { property, .. } = kind(&err));
    assert_eq!(property, "colour");
    assert_eq!(err.category(), ErrorCategory::Schema);
}

#[test]
fn structural_errors() {
    let settings = default_settings();
    let err = expect!("<c:If the=\"{x}\">open").not_to_parse(&settings);
    assert!(matches!(kind(&err), ErrorKind::UnclosedTag { .. }));
    assert_eq!(err.category(), ErrorCategory::Parse);

    let err = expect!("<c:If the=\"{x}\">a</c:For>").not_to_parse(&settings);
    assert_let!(ErrorKind::MismatchedCloseTag { expected, found } = kind(&err));
    assert_eq!(expected, "c:If");
    assert_eq!(found, "c:For");

    let err = expect!("<c:Assets>text</c:Assets>").not_to_parse(&settings);
    assert!(matches!(kind(&err), ErrorKind::ContentNotAllowed { .. }));
}

#[test]
fn unknown_tags() {
    let err = expect!("<c:Nope/>").not_to_parse(&strict_settings());
    assert_let!(ErrorKind::UnknownTag { tag } = kind(&err));
    assert_eq!(tag, "c:Nope");

    let err = expect!("<c:Nope/>").not_to_parse(&default_settings());
    assert!(matches!(kind(&err), ErrorKind::TemplateFileNotFound { .. }));
    assert_eq!(err.category(), ErrorCategory::Resolution);
}

#[test]
fn template_defaults() {
    it("renders the declared default of an omitted parameter", || {
        expect!(
            "<c:Template name=\"Button\"><p:param name=\"label\" default=\"OK\"/><button>{label}</button></c:Template><c:Button/>"
        )
        .to_render_as("<button>OK</button>", &default_settings())
    });

    it("accepts explicit template-instance tags and the Macro alias", || {
        expect!(
            "<c:Macro name=\"Button\"><p:param name=\"label\" default=\"OK\"/><button>{label}</button></c:Macro><t:Button label=\"Go\"/>"
        )
        .to_render_as("<button>Go</button>", &default_settings())
    });

    it("uses content written inside a parameter declaration as its default", || {
        expect!(
            "<c:Template name=\"Box\"><p:param name=\"inner\" type=\"content\"><i>empty</i></p:param><div>{inner}</div></c:Template><c:Box/>"
        )
        .to_render_as("<div><i>empty</i></div>", &default_settings())
    });

    it("wraps loose instance content into the default parameter", || {
        expect!(
            "<c:Template name=\"Panel\" default=\"body\"><div class=\"panel\">{body}</div></c:Template><c:Panel><b>hi</b></c:Panel>"
        )
        .to_render_as("<div class=\"panel\"><b>hi</b></div>", &default_settings())
    });

    it("keeps the first definition of a template name", || {
        expect!(
            "<c:Template name=\"T\">first</c:Template><c:Template name=\"T\">second</c:Template><c:T/>"
        )
        .to_render_as("first", &default_settings())
    });
}

#[test]
fn template_parameter_errors() {
    let settings = default_settings();

    let err = expect!("<c:Template name=\"T\"><p:param name=\"x\" required/>{x}</c:Template><c:T/>")
        .not_to_parse(&settings);
    assert_let!(ErrorKind::MissingTemplateParam { template, param } = kind(&err));
    assert_eq!(template, "T");
    assert_eq!(param, "x");
    assert_eq!(err.category(), ErrorCategory::Schema);

    let err = expect!("<c:Template name=\"T\"><p:param name=\"x\"/>{x}</c:Template><c:T y=\"1\"/>")
        .not_to_parse(&settings);
    assert_let!(ErrorKind::UnknownTemplateParam { param, expected, .. } = kind(&err));
    assert_eq!(param, "y");
    assert_eq!(expected, "x");

    let err = expect!("<c:Template name=\"T\"><p:param name=\"a\"/>{b}</c:Template><c:T a=\"1\"/>")
        .not_to_parse(&settings);
    assert_let!(ErrorKind::UnknownTemplateParam { param, .. } = kind(&err));
    assert_eq!(param, "b");

    let err = expect!("<c:Template name=\"T\"><p:param name=\"a\"/><p:param name=\"a\"/></c:Template>")
        .not_to_parse(&settings);
    assert!(matches!(kind(&err), ErrorKind::DuplicateTemplateParam { .. }));
}

#[test]
fn template_bodies_do_not_depend_on_parse_time_data() {
    let bare = "<c:Template name=\"T\">{user}</c:Template><c:T/>";
    for with_data in [false, true] {
        let mut ctx = Context::default();
        if with_data {
            ctx.set_data("user", "Ada");
        }
        let err = parse(&mut ctx, bare).unwrap_err();
        assert_let!(ErrorKind::UnknownTemplateParam { template, param, .. } = kind(&err));
        assert_eq!(template, "T");
        assert_eq!(param, "user", "with data set: {with_data}");
    }

    let mut ctx = Context::default();
    let root = parse(
        &mut ctx,
        "<c:Template name=\"Greeting\"><p:param name=\"who\"/>{who} of {$.site}</c:Template><c:Greeting who=\"Ada\"/>",
    )
    .unwrap();
    ctx.set_data("site", "Earth");
    assert_eq!(render_tree_to_string(&mut ctx, root).unwrap(), "Ada of Earth");
}

#[test]
fn binding_transfer_resolves_against_current_data() {
    let mut ctx = Context::default();
    ctx.set_data("outer", json!({"title": "First"}));
    let root = parse(
        &mut ctx,
        "<c:Template name=\"Heading\"><p:param name=\"title\"/><h1>{title}</h1></c:Template><c:Heading title=\"{outer.title}\"/>",
    )
    .unwrap();

    assert_eq!(render_tree_to_string(&mut ctx, root).unwrap(), "<h1>First</h1>");
    ctx.set_data("outer", json!({"title": "Second"}));
    assert_eq!(render_tree_to_string(&mut ctx, root).unwrap(), "<h1>Second</h1>");
}

#[test]
fn binding_transfer_through_pipes_and_composites() {
    it("pipes a composite caller value", || {
        let mut ctx = Context::default();
        ctx.set_data("user", json!({"name": "ada"}));
        let html = render_to_string(
            &mut ctx,
            "<c:Template name=\"Title\"><p:param name=\"label\"/><h1>{label|upper}</h1></c:Template><c:Title label=\"Hello {user.name}\"/>",
        )?;
        assert_eq!(html, "<h1>HELLO ADA</h1>");
        Ok(())
    });

    it("selects fields below a transferred parameter", || {
        let mut ctx = Context::default();
        ctx.set_data("site", json!({"owner": {"name": "Grace", "mail": "g@x"}}));
        let html = render_to_string(
            &mut ctx,
            "<c:Template name=\"Contact\"><p:param name=\"who\" type=\"data\"/>{who.name} &lt;{who.mail}&gt;</c:Template><c:Contact who=\"{site.owner}\"/>",
        )?;
        assert_eq!(html, "Grace &lt;g@x&gt;");
        Ok(())
    });

    it("leaves loop variables inside a template body alone", || {
        let mut ctx = Context::default();
        ctx.set_data("people", json!([{"name": "A"}, {"name": "B"}]));
        let html = render_to_string(
            &mut ctx,
            "<c:Template name=\"List\"><p:param name=\"rows\" type=\"data\"/><ul><c:For each=\"{rows}\"><li>{item.name}</li></c:For></ul></c:Template><c:List rows=\"{people}\"/>",
        )?;
        assert_eq!(html, "<ul><li>A</li><li>B</li></ul>");
        Ok(())
    });
}

#[test]
fn transferred_bindings_keep_the_caller_loop_record() {
    it("renames a body loop variable that shadows the caller's", || {
        let mut ctx = Context::default();
        ctx.set_data("people", json!([{"name": "Outer1"}, {"name": "Outer2"}]));
        ctx.set_data("letters", json!(["x"]));
        let html = render_to_string(
            &mut ctx,
            "<c:Template name=\"Card\"><p:param name=\"title\"/><p:param name=\"list\" type=\"data\"/><c:For each=\"{list}\">[{title}:{item}]</c:For></c:Template><c:For each=\"{people}\"><c:Card title=\"{item.name}\" list=\"{letters}\"/></c:For>",
        )?;
        assert_eq!(html, "[Outer1:x][Outer2:x]");
        Ok(())
    });

    it("keeps caller content bound to the caller's record", || {
        let mut ctx = Context::default();
        ctx.set_data("people", json!([{"name": "Outer1"}, {"name": "Outer2"}]));
        ctx.set_data("letters", json!(["x", "y"]));
        let html = render_to_string(
            &mut ctx,
            "<c:Template name=\"Wrap\" default=\"body\"><p:param name=\"list\" type=\"data\"/><c:For each=\"{list}\">({body})</c:For></c:Template><c:For each=\"{people}\"><c:Wrap list=\"{letters}\">{item.name}</c:Wrap></c:For>",
        )?;
        assert_eq!(html, "(Outer1)(Outer1)(Outer2)(Outer2)");
        Ok(())
    });
}

const NESTED: &str = "<c:Template name=\"Inner\"><p:param name=\"x\"/><b>{x}</b></c:Template>\
<c:Template name=\"Shout\"><p:param name=\"x\"/><i>{x|upper}</i></c:Template>\
<c:Template name=\"Outer\"><p:param name=\"y\"/><c:Inner x=\"<{y}>\"/>|<c:Inner x=\"{y}\"/>|<c:Shout x=\"<{y}>\"/></c:Template>";

#[test]
fn nested_templates_pass_parameters_down() {
    it("folds constant parameters through two levels", || {
        let mut ctx = Context::default();
        let html = render_to_string(&mut ctx, &format!("{NESTED}<c:Outer y=\"Hello\"/>"))?;
        assert_eq!(html, "<b>&lt;Hello&gt;</b>|<b>Hello</b>|<i>&lt;HELLO&gt;</i>");
        Ok(())
    });

    it("transfers a caller binding through two levels", || {
        let mut ctx = Context::default();
        let root = parse(&mut ctx, &format!("{NESTED}<c:Outer y=\"{{page.greeting}}\"/>"))?;
        ctx.set_data("page", json!({"greeting": "Hi"}));
        assert_eq!(
            render_tree_to_string(&mut ctx, root)?,
            "<b>&lt;Hi&gt;</b>|<b>Hi</b>|<i>&lt;HI&gt;</i>"
        );
        ctx.set_data("page", json!({"greeting": "Yo"}));
        assert_eq!(
            render_tree_to_string(&mut ctx, root)?,
            "<b>&lt;Yo&gt;</b>|<b>Yo</b>|<i>&lt;YO&gt;</i>"
        );
        Ok(())
    });
}

#[test]
fn composite_attributes_mix_parameters_and_data() {
    it("keeps data references next to substituted parameters", || {
        let mut ctx = Context::default();
        define_badge(&mut ctx);
        let root = parse(
            &mut ctx,
            "<c:Template name=\"Link\"><p:param name=\"id\"/><c:Badge label=\"/u/{id}?s={page.sort}\"/></c:Template><c:Link id=\"7\"/>",
        )?;
        ctx.set_data("page", json!({"sort": "name"}));
        assert_eq!(
            render_tree_to_string(&mut ctx, root)?,
            "<span class=\"badge badge-info\">/u/7?s=name</span>"
        );
        ctx.set_data("page", json!({"sort": "date"}));
        assert_eq!(
            render_tree_to_string(&mut ctx, root)?,
            "<span class=\"badge badge-info\">/u/7?s=date</span>"
        );
        Ok(())
    });

    it("reduces to a constant when every reference is a parameter", || {
        let mut ctx = Context::default();
        define_badge(&mut ctx);
        let html = render_to_string(
            &mut ctx,
            "<c:Template name=\"Link\"><p:param name=\"id\"/><p:param name=\"sort\" default=\"asc\"/><c:Badge label=\"/u/{id}?s={sort}\"/></c:Template><c:Link id=\"7\"/>",
        )?;
        assert_eq!(html, "<span class=\"badge badge-info\">/u/7?s=asc</span>");
        Ok(())
    });

    it("rejects content spliced into text", || {
        let mut ctx = Context::default();
        define_badge(&mut ctx);
        let err = parse(
            &mut ctx,
            "<c:Template name=\"T\" default=\"body\"><c:Badge label=\"[{body}]\"/></c:Template><c:T><b>hi</b></c:T>",
        )
        .unwrap_err();
        assert_let!(ErrorKind::TypeMismatch { component, property, .. } = kind(&err));
        assert_eq!(component, "T");
        assert_eq!(property, "body");
        assert_eq!(err.category(), ErrorCategory::Schema);
        Ok(())
    });
}

#[test]
fn iteration_with_count_limit() {
    let mut ctx = Context::default();
    ctx.set_data("rows", json!(["a", "b", "c", "d", "e"]));
    let html = render_to_string(
        &mut ctx,
        "<c:For each=\"{rows}\" count=\"2\"><p:header>[</p:header><p:footer>]</p:footer><p:glue>,</p:glue><i>{item}</i></c:For>",
    )
    .unwrap();
    assert_eq!(html, "[<i>a</i>,<i>b</i>]");
}

#[test]
fn iteration_without_data() {
    it("renders only the noData slot of an empty For", || {
        let mut ctx = Context::default();
        ctx.set_data("rows", json!([]));
        let html = render_to_string(
            &mut ctx,
            "<c:For each=\"{rows}\"><p:header>H</p:header><p:footer>F</p:footer><p:glue>G</p:glue><p:noData>none</p:noData>{item}</c:For>",
        )?;
        assert_eq!(html, "none");
        Ok(())
    });

    it("treats a missing data source as empty", || {
        expect!("<c:Repeat of=\"{missing}\" noData=\"-\"><p:header>H</p:header>x</c:Repeat>")
            .to_render_as("-", &default_settings())
    });
}

#[test]
fn repeat_and_scopes() {
    it("repeats a fixed number of times with a zero-based index", || {
        expect!("<c:Repeat times=\"3\" index=\"i\">{i}:{item};</c:Repeat>")
            .to_render_as("0:1;1:2;2:3;", &default_settings())
    });

    it("restores shadowed data after the loop", || {
        let mut ctx = Context::default();
        ctx.set_data("row", "outer");
        ctx.set_data("rows", json!(["x", "y"]));
        let html = render_to_string(&mut ctx, "<c:For each=\"{rows}\" as=\"row\">{row}</c:For>{row}")?;
        assert_eq!(html, "xyouter");
        Ok(())
    });

    it("shares a data source cursor unless asked to rewind", || {
        let mut ctx = Context::default();
        let nums = DataSource::from_vec(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]);
        ctx.set_data("nums", nums);
        let html = render_to_string(
            &mut ctx,
            "<c:For each=\"{nums}\" glue=\",\">{item}</c:For>|<c:For each=\"{nums}\" noData=\"empty\">{item}</c:For>|<c:For each=\"{nums}\" rewind=\"true\" glue=\",\">{item}</c:For>",
        )?;
        assert_eq!(html, "1,2,3|empty|1,2,3");
        Ok(())
    });
}

#[test]
fn conditionals() {
    let source = "<c:If the=\"{user.admin}\">yes<p:else>no</p:else></c:If>";
    let mut ctx = Context::default();
    let root = parse(&mut ctx, source).unwrap();
    ctx.set_data("user", json!({"admin": true}));
    assert_eq!(render_tree_to_string(&mut ctx, root).unwrap(), "yes");
    ctx.set_data("user", json!({"admin": false}));
    assert_eq!(render_tree_to_string(&mut ctx, root).unwrap(), "no");

    let source = "<c:If the=\"{role}\"><p:case is=\"a|b\">AB</p:case><p:case is=\"c\">C</p:case><p:else>other</p:else></c:If>";
    let root = parse(&mut ctx, source).unwrap();
    for (role, expected) in [("b", "AB"), ("c", "C"), ("z", "other")] {
        ctx.set_data("role", role);
        assert_eq!(render_tree_to_string(&mut ctx, root).unwrap(), expected, "role {role}");
    }

    let root = parse(&mut ctx, "<c:If the=\"{role}\" matches=\"^ad\" not>plain</c:If>").unwrap();
    ctx.set_data("role", "admin");
    assert_eq!(render_tree_to_string(&mut ctx, root).unwrap(), "");
    ctx.set_data("role", "guest");
    assert_eq!(render_tree_to_string(&mut ctx, root).unwrap(), "plain");
}

#[test]
fn apply_overrides_matching_descendants() {
    let mut ctx = Context::default();
    ctx.set_data("rows", json!(["a", "b"]));
    let html = render_to_string(
        &mut ctx,
        "<c:Apply where=\"For\"><p:set count=\"1\" unrelated=\"x\"/><c:For each=\"{rows}\">{item}</c:For>-<c:For each=\"{rows}\">{item}</c:For></c:Apply>",
    )
    .unwrap();
    assert_eq!(html, "a-a");
}

#[test]
fn assets_are_hoisted_once() {
    let mut ctx = Context::default();
    let html = render_to_string(
        &mut ctx,
        "<c:Template name=\"Widget\"><p:script name=\"widget\">init();</p:script><p:style src=\"/w.css\"/><span>w</span></c:Template><c:Assets/><c:Widget/><c:Widget/><c:Assets type=\"script\"/>",
    )
    .unwrap();
    assert_eq!(
        html,
        "<script>init();</script>\n<link rel=\"stylesheet\" href=\"/w.css\">\n<span>w</span><span>w</span><script>init();</script>\n"
    );
    assert_eq!(ctx.assets().len(), 2);
    assert_eq!(ctx.assets()[1].name, "style1");
}

const CARD: &str = "<c:Template name=\"Card\"><p:param name=\"title\"/><div>{title}</div></c:Template>";

#[test]
fn template_discovery_from_memory() {
    let settings = Settings::builder()
        .template_dirs(vec![PathBuf::from("missing"), PathBuf::from("tpl")])
        .build();
    let mut ctx = Context::new(settings).with_loader(MemoryLoader::default().with_file("tpl/Card.tpl", CARD));
    assert_eq!(render_to_string(&mut ctx, "<c:Card title=\"Hi\"/><t:Card title=\"Yo\"/>").unwrap(), "<div>Hi</div><div>Yo</div>");
    assert!(ctx.template("Card").is_some());

    let err = render_to_string(&mut ctx, "<c:Nope/>").unwrap_err();
    assert_let!(ErrorKind::TemplateFileNotFound { name, searched } = kind(&err));
    assert_eq!(name, "Nope");
    assert!(searched.contains("tpl/Nope.tpl"), "{searched}");
}

#[test]
fn template_discovery_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Card.tpl"), CARD).unwrap();
    fs::write(dir.path().join("Loop.tpl"), "<c:Template name=\"Loop\"><c:Loop/></c:Template>").unwrap();
    fs::write(dir.path().join("Empty.tpl"), "nothing here").unwrap();

    let settings = Settings::builder().template_dirs(vec![dir.path().to_path_buf()]).build();
    let mut ctx = Context::new(settings);
    assert_eq!(render_to_string(&mut ctx, "<c:Card title=\"disk\"/>").unwrap(), "<div>disk</div>");

    let err = render_to_string(&mut ctx, "<c:Loop/>").unwrap_err();
    assert_let!(ErrorKind::TemplateDepthExceeded { name, .. } = kind(&err));
    assert_eq!(name, "Loop");

    let err = render_to_string(&mut ctx, "<c:Empty/>").unwrap_err();
    assert!(matches!(kind(&err), ErrorKind::TemplateNotDefinedInFile { .. }));
}

fn render_badge(
    _: &mut Context,
    _: tagtree::NodeId,
    props: &tagtree::Props,
    out: &mut dyn std::fmt::Write,
) -> Result<(), tagtree::TemplateError> {
    write!(out, "<span class=\"badge badge-{}\">{}</span>", props.text("tone"), escape(&props.text("label")))?;
    Ok(())
}

fn define_badge(ctx: &mut Context) {
    ctx.define_component(ComponentDefSpec {
        kind: ComponentKind::Custom("Badge"),
        names: &["Badge"],
        schema: Schema::new(vec![
            PropSpec::new("label", PropType::Text),
            PropSpec::new("tone", PropType::Text)
                .with_default("info")
                .with_values(&["info", "warn"]),
        ]),
        scope_vars: &[],
        parsed: None,
        pre_render: None,
        render: render_badge,
        post_render: None,
    });
}

#[test]
fn custom_components() {
    let mut ctx = Context::default();
    define_badge(&mut ctx);
    ctx.set_data("count", 3.0);
    let html = render_to_string(&mut ctx, "<c:Badge label=\"{count} new\"/><c:Badge tone=\"warn\"><p:label>a&b</p:label></c:Badge>").unwrap();
    assert_eq!(
        html,
        "<span class=\"badge badge-info\">3 new</span><span class=\"badge badge-warn\">a&amp;b</span>"
    );

    let err = render_to_string(&mut ctx, "<c:Badge tone=\"loud\"/>").unwrap_err();
    assert!(matches!(kind(&err), ErrorKind::ValueNotInEnum { .. }));
}
