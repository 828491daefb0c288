//! HTML rendering with minijinja.
//!
//! Templates are compiled into the binary from `templates/` and autoescaped
//! by extension.

use minijinja::{Environment, Value};
use serde::Serialize;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("code_form.html", include_str!("../templates/code_form.html")),
    ("home.html", include_str!("../templates/home.html")),
    ("suggest.html", include_str!("../templates/suggest.html")),
    ("explain.html", include_str!("../templates/explain.html")),
    ("share.html", include_str!("../templates/share.html")),
    ("past.html", include_str!("../templates/past.html")),
    ("register.html", include_str!("../templates/register.html")),
    ("welcome.html", include_str!("../templates/welcome.html")),
];

pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        env.add_filter("linebreaks", linebreaks);
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }
}

/// Escape `value` and turn its newlines into `<br>` tags.
fn linebreaks(value: String) -> Value {
    let escaped = html_escape::encode_text(&value).replace("\r\n", "\n");
    Value::from_safe_string(escaped.replace('\n', "<br>"))
}
