//! HTML pages rendered with handlebars. Templates are compiled into the binary.

use axum::response::Html;
use handlebars::{handlebars_helper, Handlebars, TemplateError};
use serde::Serialize;

use crate::error::AppResult;

const TEMPLATES: &[(&str, &str)] = &[
    ("index", include_str!("../templates/index.hbs")),
    ("result", include_str!("../templates/result.hbs")),
    ("review", include_str!("../templates/review.hbs")),
    ("history", include_str!("../templates/history.hbs")),
];

const PARTIALS: &[(&str, &str)] = &[
    ("header", include_str!("../templates/partials/header.hbs")),
    ("footer", include_str!("../templates/partials/footer.hbs")),
    ("flashes", include_str!("../templates/partials/flashes.hbs")),
];

handlebars_helper!(fixed: |v: f64| format!("{:.3}", v));
handlebars_helper!(percent: |v: f64| format!("{:.0}%", v * 100.0));

pub struct Views {
    registry: Handlebars<'static>,
}

impl Views {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry.register_helper("fixed", Box::new(fixed));
        registry.register_helper("percent", Box::new(percent));

        for (name, source) in PARTIALS {
            registry.register_partial(name, *source)?;
        }
        for (name, source) in TEMPLATES {
            registry.register_template_string(name, *source)?;
        }

        Ok(Self { registry })
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> AppResult<Html<String>> {
        Ok(Html(self.registry.render(name, data)?))
    }
}
