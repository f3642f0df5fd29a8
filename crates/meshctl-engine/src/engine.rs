//! Install manifest renderer based on MiniJinja

use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;
use meshctl_core::{Config, InstallValues};
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use walkdir::WalkDir;

use crate::error::{RenderError, Result, TemplateError};
use crate::filters;

/// Path prefix used in the `# Source:` comment ahead of every manifest
pub const SOURCE_PREFIX: &str = "meshctl/templates";

/// The control-plane template set, in emission order
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("namespace.yaml", include_str!("../templates/namespace.yaml.j2")),
    ("config.yaml", include_str!("../templates/config.yaml.j2")),
    ("identity.yaml", include_str!("../templates/identity.yaml.j2")),
    ("controller.yaml", include_str!("../templates/controller.yaml.j2")),
    ("proxy-injector.yaml", include_str!("../templates/proxy-injector.yaml.j2")),
    ("viz.yaml", include_str!("../templates/viz.yaml.j2")),
];

#[derive(Debug, Clone)]
struct TemplateSource {
    name: String,
    source: String,
}

impl TemplateSource {
    /// Helpers (`_name`) are loadable by other templates but never emitted
    fn is_helper(&self) -> bool {
        self.name
            .rsplit('/')
            .next()
            .is_some_and(|file| file.starts_with('_'))
    }

    fn output_name(&self) -> &str {
        self.name
            .strip_suffix(".j2")
            .or_else(|| self.name.strip_suffix(".jinja2"))
            .unwrap_or(&self.name)
    }
}

/// Template engine builder
#[derive(Debug, Default)]
pub struct EngineBuilder {
    templates: Vec<TemplateSource>,
    skip_builtin: bool,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an empty template set instead of the built-in one
    pub fn without_builtin_templates(mut self) -> Self {
        self.skip_builtin = true;
        self
    }

    /// Add a template, replacing any template of the same name in place
    pub fn template(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        let template = TemplateSource {
            name: name.into(),
            source: source.into(),
        };
        match self.templates.iter_mut().find(|t| t.name == template.name) {
            Some(existing) => *existing = template,
            None => self.templates.push(template),
        }
        self
    }

    pub fn build(self) -> Engine {
        let mut templates: Vec<TemplateSource> = if self.skip_builtin {
            Vec::new()
        } else {
            BUILTIN_TEMPLATES
                .iter()
                .map(|(name, source)| TemplateSource {
                    name: (*name).to_string(),
                    source: (*source).to_string(),
                })
                .collect()
        };

        for template in self.templates {
            match templates.iter_mut().find(|t| t.name == template.name) {
                Some(existing) => *existing = template,
                None => templates.push(template),
            }
        }

        Engine { templates }
    }
}

/// Renders install values into Kubernetes manifests
///
/// Rendering is a pure function of its inputs: the same values and
/// configuration always produce byte-identical output.
#[derive(Debug, Clone)]
pub struct Engine {
    templates: Vec<TemplateSource>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine with the built-in control-plane templates
    pub fn new() -> Self {
        EngineBuilder::new().build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Load a custom template set from a directory
    ///
    /// Every file below `dir` is a template, named by its relative path and
    /// emitted in sorted order.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let load_err = |source: std::io::Error| RenderError::Load {
            path: dir.to_path_buf(),
            source,
        };

        let mut templates = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| load_err(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let rel_path = entry.path().strip_prefix(dir).unwrap_or(entry.path());
            let name = rel_path
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let source = std::fs::read_to_string(entry.path()).map_err(load_err)?;

            templates.push(TemplateSource { name, source });
        }
        templates.sort_by(|a, b| a.name.cmp(&b.name));

        tracing::debug!(path = %dir.display(), templates = templates.len(), "loaded template directory");
        Ok(Self { templates })
    }

    /// Names of the templates that produce output, in emission order
    pub fn manifest_names(&self) -> impl Iterator<Item = &str> {
        self.templates
            .iter()
            .filter(|t| !t.is_helper())
            .map(TemplateSource::output_name)
    }

    fn create_environment(&self) -> std::result::Result<Environment<'_>, TemplateError> {
        let mut env = Environment::new();
        env.set_debug(true);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_formatter(filters::format_value);

        env.add_filter("toyaml", filters::toyaml);
        env.add_filter("tojson", filters::tojson);
        env.add_filter("quote", filters::quote);
        env.add_filter("nindent", filters::nindent);
        env.add_filter("indent", filters::indent);
        env.add_filter("required", filters::required);

        for template in &self.templates {
            env.add_template(&template.name, &template.source)
                .map_err(|e| TemplateError::from_minijinja(e, &template.name, &template.source, None))?;
        }

        Ok(env)
    }

    /// Render every template, keyed by manifest name in emission order
    ///
    /// Templates that render to nothing but whitespace are left out.
    pub fn render_manifests(
        &self,
        values: &InstallValues,
        config: &Config,
    ) -> Result<IndexMap<String, String>> {
        if let Some(field) = values.first_missing_field() {
            return Err(RenderError::MissingValue { field });
        }

        let namespace = config.global().namespace();
        if values.namespace != namespace {
            return Err(RenderError::NamespaceMismatch {
                values: values.namespace.clone(),
                config: namespace.to_string(),
            });
        }

        let env = self.create_environment()?;
        let ctx = minijinja::context! {
            values => values,
            config => config,
        };

        let mut manifests = IndexMap::new();
        for template in self.templates.iter().filter(|t| !t.is_helper()) {
            let rendered = env
                .get_template(&template.name)
                .and_then(|tmpl| tmpl.render(&ctx))
                .map_err(|e| {
                    let context = serde_json::json!({ "values": values, "config": config });
                    TemplateError::from_minijinja(e, &template.name, &template.source, Some(&context))
                })?;

            if rendered.trim().is_empty() {
                tracing::debug!(template = %template.name, "template rendered empty, skipping");
                continue;
            }
            manifests.insert(
                template.output_name().to_string(),
                rendered.trim_end().to_string(),
            );
        }

        tracing::debug!(%namespace, manifests = manifests.len(), "rendered install manifests");
        Ok(manifests)
    }

    /// Render the full multi-document manifest stream
    pub fn render_to_string(&self, values: &InstallValues, config: &Config) -> Result<String> {
        let manifests = self.render_manifests(values, config)?;

        let mut out = String::new();
        for (name, body) in &manifests {
            out.push_str("---\n# Source: ");
            out.push_str(SOURCE_PREFIX);
            out.push('/');
            out.push_str(name);
            out.push('\n');
            out.push_str(body);
            out.push('\n');
        }
        Ok(out)
    }

    /// Render into `out`, which is only written once rendering has succeeded
    pub fn render(&self, values: &InstallValues, config: &Config, out: &mut impl Write) -> Result<()> {
        let text = self.render_to_string(values, config)?;
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}
