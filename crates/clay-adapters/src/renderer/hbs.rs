//! Handlebars renderer.
//!
//! Rendering is permissive: missing fields render as empty, nothing is
//! HTML-escaped (outputs are source files, not markup). Partials and
//! compiled templates each get their own copy of the registry so the shared
//! base is never mutated.

use std::sync::Arc;

use handlebars::{Handlebars, handlebars_helper};
use serde_json::Value;
use tracing::{debug, instrument};

use clay_core::{
    application::{
        ApplicationError,
        ports::{CompiledTemplate, TemplateRenderer},
    },
    domain::Partial,
    error::{ClayError, ClayResult},
};

use super::case;

const COMPILED: &str = "__clay_compiled";

handlebars_helper!(pascal_case: |s: str| case::to_pascal_case(s));
handlebars_helper!(camel_case: |s: str| case::to_camel_case(s));
handlebars_helper!(snake_case: |s: str| case::to_snake_case(s));
handlebars_helper!(kebab_case: |s: str| case::to_kebab_case(s));
handlebars_helper!(upper_case: |s: str| s.to_uppercase());
handlebars_helper!(lower_case: |s: str| s.to_lowercase());
handlebars_helper!(json: |v: Json| v.to_string());

/// [`TemplateRenderer`] backed by the `handlebars` crate.
#[derive(Clone)]
pub struct HandlebarsRenderer {
    registry: Arc<Handlebars<'static>>,
}

impl HandlebarsRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry.register_escape_fn(handlebars::no_escape);

        registry.register_helper("pascalCase", Box::new(pascal_case));
        registry.register_helper("camelCase", Box::new(camel_case));
        registry.register_helper("snakeCase", Box::new(snake_case));
        registry.register_helper("kebabCase", Box::new(kebab_case));
        registry.register_helper("upperCase", Box::new(upper_case));
        registry.register_helper("lowerCase", Box::new(lower_case));
        registry.register_helper("json", Box::new(json));

        Self {
            registry: Arc::new(registry),
        }
    }
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for HandlebarsRenderer {
    fn render(&self, template: &str, context: &Value) -> ClayResult<String> {
        self.registry
            .render_template(template, context)
            .map_err(|e| failed("inline", e))
    }

    fn compile(&self, template: &str) -> ClayResult<CompiledTemplate> {
        let mut registry = (*self.registry).clone();
        registry
            .register_template_string(COMPILED, template)
            .map_err(|e| failed("inline", e))?;
        let registry = Arc::new(registry);

        Ok(Arc::new(move |context: &Value| {
            registry
                .render(COMPILED, context)
                .map_err(|e| failed("inline", e))
        }))
    }

    #[instrument(skip_all, fields(partials = partials.len()))]
    fn with_partials(&self, partials: &[Partial]) -> ClayResult<Arc<dyn TemplateRenderer>> {
        let mut registry = (*self.registry).clone();
        for partial in partials {
            registry
                .register_partial(&partial.name, &partial.source)
                .map_err(|e| failed(&partial.name, e))?;
            debug!(partial = %partial.name, "registered partial");
        }
        Ok(Arc::new(Self {
            registry: Arc::new(registry),
        }))
    }
}

fn failed(template: &str, error: impl std::fmt::Display) -> ClayError {
    ApplicationError::RenderingFailed {
        template: template.to_string(),
        reason: error.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn renders_without_escaping_and_tolerates_missing_fields() {
        let renderer = HandlebarsRenderer::new();
        let out = renderer
            .render("<{{name}}>{{missing}}", &json!({ "name": "a&b" }))
            .unwrap();
        assert_eq!(out, "<a&b>");
    }

    #[test]
    fn compiled_templates_render_many_contexts() {
        let renderer = HandlebarsRenderer::new();
        let template = renderer.compile("{{pascalCase name}}.ts").unwrap();
        assert_eq!(template(&json!({ "name": "order_line" })).unwrap(), "OrderLine.ts");
        assert_eq!(template(&json!({ "name": "customer" })).unwrap(), "Customer.ts");
    }

    #[test]
    fn case_and_json_helpers_are_registered() {
        let renderer = HandlebarsRenderer::new();
        let out = renderer
            .render(
                "{{camelCase a}} {{snakeCase a}} {{kebabCase a}} {{upperCase b}} {{json c}}",
                &json!({ "a": "OrderLine", "b": "x", "c": { "k": [1] } }),
            )
            .unwrap();
        assert_eq!(out, "orderLine order_line order-line X {\"k\":[1]}");
    }

    #[test]
    fn parent_context_is_reachable() {
        let renderer = HandlebarsRenderer::new();
        let out = renderer
            .render(
                "{{clay_parent.name}}.{{name}}",
                &json!({ "name": "id", "clay_parent": { "name": "order" } }),
            )
            .unwrap();
        assert_eq!(out, "order.id");
    }

    #[test]
    fn partials_are_scoped_to_the_derived_renderer() {
        let base = HandlebarsRenderer::new();
        let with = base
            .with_partials(&[Partial {
                name: "header".into(),
                source: "// {{name}}".into(),
            }])
            .unwrap();
        assert_eq!(with.render("{{> header}}", &json!({ "name": "x" })).unwrap(), "// x");
        assert!(base.render("{{> header}}", &json!({})).is_err());
    }

    #[test]
    fn syntax_errors_fail_at_compile_time() {
        let renderer = HandlebarsRenderer::new();
        assert!(renderer.compile("{{#if x}}unclosed").is_err());
    }
}
