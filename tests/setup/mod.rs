#![allow(dead_code)]

use std::panic::{UnwindSafe, catch_unwind};

use tagtree::{Context, ErrorKind, Settings, TemplateError, parse, render_to_string};

pub struct TestExpr {
    pub source: String,
    pub file: &'static str,
    pub line: u32,
    pub code: &'static str,
}

impl TestExpr {
    fn context(settings: &Settings) -> Context {
        Context::new(settings.clone())
    }

    pub fn to_parse(self, settings: &Settings) -> Result<(), TemplateError> {
        let mut ctx = Self::context(settings);
        parse(&mut ctx, &self.source).map(|_| ())
    }

    /// Parsing must fail; the error is handed back for inspection.
    pub fn not_to_parse(self, settings: &Settings) -> TemplateError {
        let mut ctx = Self::context(settings);
        match parse(&mut ctx, &self.source) {
            Ok(_) => panic!(
                "{}:{}: expected `{}` not to parse: {:?}",
                self.file, self.line, self.code, self.source
            ),
            Err(e) => e,
        }
    }

    pub fn to_render(self, settings: &Settings) -> Result<String, TemplateError> {
        let mut ctx = Self::context(settings);
        render_to_string(&mut ctx, &self.source)
    }

    pub fn to_render_as(self, expected: &str, settings: &Settings) -> Result<(), TemplateError> {
        let (file, line) = (self.file, self.line);
        let html = self.to_render(settings)?;
        assert_eq!(html, expected, "{file}:{line}: rendered output differs");
        Ok(())
    }

    /// Parsing or rendering must fail.
    pub fn not_to_render(self, settings: &Settings) -> TemplateError {
        let mut ctx = Self::context(settings);
        match render_to_string(&mut ctx, &self.source) {
            Ok(html) => panic!(
                "{}:{}: expected `{}` not to render, got {html:?}",
                self.file, self.line, self.code
            ),
            Err(e) => e,
        }
    }
}

pub fn expect_impl(source: &str, file: &'static str, line: u32, code: &'static str) -> TestExpr {
    TestExpr {
        source: source.to_string(),
        file,
        line,
        code,
    }
}

#[macro_export]
macro_rules! expect {
    ($e:expr) => {
        $crate::setup::expect_impl($e, file!(), line!(), stringify!($e))
    };
}

pub fn it<F>(desc: &str, test_fn: F)
where
    F: FnOnce() -> Result<(), TemplateError> + UnwindSafe,
{
    match catch_unwind(test_fn) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            panic!(
                "Test '{}' failed with Result::Err: {}\n(position {:?}, category {})",
                desc,
                e,
                e.position,
                e.category()
            );
        }
        Err(panic_payload) => {
            let msg = if let Some(s) = panic_payload.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "<non-string panic payload>".to_string()
            };
            panic!("Test '{}' panicked: {}", desc, msg);
        }
    }
}

pub fn default_settings() -> Settings {
    Settings::default()
}

pub fn strict_settings() -> Settings {
    Settings::builder().strict(true).build()
}

pub fn condensed_settings() -> Settings {
    Settings::builder().condense_whitespace(true).build()
}

pub fn kind(err: &TemplateError) -> &ErrorKind {
    err.kind.as_ref()
}

#[macro_export]
macro_rules! assert_let {
    ($pat:pat = $expr:expr, $($arg:tt)+) => {
        let $pat = $expr else {
            panic!($($arg)+);
        };
    };
    ($pat:pat = $expr:expr) => {
        let $pat = $expr else {
            panic!(
                "assert_let failed: pattern `{}` did not match {} at {}:{} \n{:#?}",
                stringify!($pat), stringify!($expr),
                file!(), line!(),
                $expr
            );
        };
    };
}
