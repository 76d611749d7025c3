//! Outbound prompt construction and inbound reply parsing.

use minijinja::{Environment, context};

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::model::{
    CodeBundle, ContextRequest, ContextResponse, FileSelection, ResponseKind,
};

const FILE_SELECTION_TEMPLATE: &str = "I want to build a feature called {{ feature }}.
Feature Description:
{{ description }}

Here is the summary of the code:
{{ summary }}

Give me a list of files needed in order to build this feature.";

const IMPLEMENTATION_TEMPLATE: &str = "The following code structure with functions is provided:

{{ summary }}

Please implement any missing functions or suggest improvements as needed.";

/// What the user wants done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Task<'a> {
    pub feature: &'a str,
    pub description: &'a str,
}

/// Renders prompts from built-in templates and decodes strict JSON replies.
pub struct ContextAssembler {
    env: Environment<'static>,
}

impl ContextAssembler {
    pub fn new() -> EngineResult<Self> {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        for (kind, source) in [
            (ResponseKind::FileSelection, FILE_SELECTION_TEMPLATE),
            (ResponseKind::CodeBundle, IMPLEMENTATION_TEMPLATE),
        ] {
            env.add_template(template_name(kind), source)
                .map_err(|err| template_error(kind, err))?;
        }
        Ok(Self { env })
    }

    /// Compose the prompt asking for a reply of shape `kind`.
    pub fn build_request(
        &self,
        kind: ResponseKind,
        task: &Task<'_>,
        summary: &str,
    ) -> EngineResult<ContextRequest> {
        let prompt = self
            .env
            .get_template(template_name(kind))
            .and_then(|template| {
                template.render(context! {
                    feature => task.feature,
                    description => task.description,
                    summary => summary,
                })
            })
            .map_err(|err| template_error(kind, err))?;

        Ok(ContextRequest {
            kind,
            task_description: task.description.to_owned(),
            rendered_summary: summary.to_owned(),
            prompt,
        })
    }
}

fn template_name(kind: ResponseKind) -> &'static str {
    match kind {
        ResponseKind::FileSelection => "file_selection",
        ResponseKind::CodeBundle => "implementation",
    }
}

fn template_error(kind: ResponseKind, err: minijinja::Error) -> EngineError {
    EngineError::Template {
        name: template_name(kind).to_owned(),
        message: err.to_string(),
    }
}

/// Decode `raw` as exactly the `kind` variant; unknown or missing fields fail.
pub fn parse_response(raw: &[u8], kind: ResponseKind) -> EngineResult<ContextResponse> {
    let decoded = match kind {
        ResponseKind::FileSelection => {
            serde_json::from_slice::<FileSelection>(raw).map(ContextResponse::FileSelection)
        }
        ResponseKind::CodeBundle => {
            serde_json::from_slice::<CodeBundle>(raw).map(ContextResponse::CodeBundle)
        }
    };
    decoded.map_err(|err| EngineError::ResponseSchema(err.to_string()))
}

/// JSON schema of the reply variant, with additional properties forbidden.
pub fn response_schema(kind: ResponseKind) -> EngineResult<serde_json::Value> {
    let schema = match kind {
        ResponseKind::FileSelection => schemars::schema_for!(FileSelection),
        ResponseKind::CodeBundle => schemars::schema_for!(CodeBundle),
    };
    serde_json::to_value(&schema).map_err(|err| EngineError::ResponseSchema(err.to_string()))
}
