use std::{fmt, pin::Pin, str::FromStr};

use color_eyre::{
    Result,
    eyre::{ensure, eyre},
};
use serde::Serialize;
use serde_json::Value;

pub mod replicate;
pub use replicate::ReplicateImageModel;

const GHIBSKY_VERSION: &str = "a9f94946fa0377091ac0bcfe61b0d62ad9a85224e4b421b677d4747914b908c0";

/// A hosted model, written as `owner/name` or `owner/name:version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRef {
    pub owner: String,
    pub name: String,
    pub version: Option<String>,
}

impl FromStr for ModelRef {
    type Err = color_eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        let (path, version) = match s.split_once(':') {
            Some((path, version)) => {
                ensure!(!version.is_empty(), "Empty version in model reference: {s}");
                (path, Some(version.to_string()))
            }
            None => (s, None),
        };
        let (owner, name) = path
            .split_once('/')
            .ok_or_else(|| eyre!("Model reference must look like owner/name[:version]: {s}"))?;
        ensure!(!owner.is_empty(), "Missing owner in model reference: {s}");
        ensure!(
            !name.is_empty() && !name.contains('/'),
            "Invalid model name in model reference: {s}"
        );

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
            version,
        })
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)?;
        if let Some(version) = &self.version {
            write!(f, ":{version}")?;
        }
        Ok(())
    }
}

/// Input of the ghibsky flux model. Everything but the prompt is fixed.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenerationInput {
    /// sampling mode, `dev` or `schnell`
    pub model: &'static str,
    pub prompt: String,
    pub lora_scale: u32,
    pub num_outputs: u32,
    pub aspect_ratio: &'static str,
    pub output_format: &'static str,
    pub guidance_scale: f64,
    pub output_quality: u32,
    pub num_inference_steps: u32,
}

impl GenerationInput {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            model: "dev",
            prompt: prompt.into(),
            lora_scale: 1,
            num_outputs: 1,
            aspect_ratio: "9:16",
            output_format: "jpg",
            guidance_scale: 3.5,
            output_quality: 100,
            num_inference_steps: 28,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: ModelRef,
    pub input: GenerationInput,
}

impl GenerationRequest {
    pub fn ghibsky(prompt: impl Into<String>) -> Self {
        Self {
            model: ModelRef {
                owner: "aleksa-codes".into(),
                name: "flux-ghibsky-illustration".into(),
                version: Some(GHIBSKY_VERSION.into()),
            },
            input: GenerationInput::new(prompt),
        }
    }
}

/// Returns the first entry of a provider output if it is a list starting with a string.
pub fn first_output_url(output: &Value) -> Option<&str> {
    output.as_array()?.first()?.as_str()
}

pub trait ImageModel {
    /// Runs one generation and resolves to the raw provider output.
    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use expect_test::expect;
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_versioned_model() -> Result<()> {
        let reference = "aleksa-codes/flux-ghibsky-illustration:a9f94946fa0377091ac0bcfe61b0d62ad9a85224e4b421b677d4747914b908c0";
        let model: ModelRef = reference.parse()?;
        assert_eq!(model.owner, "aleksa-codes");
        assert_eq!(model.name, "flux-ghibsky-illustration");
        assert_eq!(
            model.version.as_deref(),
            Some("a9f94946fa0377091ac0bcfe61b0d62ad9a85224e4b421b677d4747914b908c0")
        );
        assert_eq!(model, GenerationRequest::ghibsky("x").model);
        assert_eq!(model.to_string(), reference);
        Ok(())
    }

    #[test]
    fn parse_unversioned_model() -> Result<()> {
        let model: ModelRef = "black-forest-labs/flux-schnell".parse()?;
        assert_eq!(model.version, None);
        assert_eq!(model.to_string(), "black-forest-labs/flux-schnell");
        Ok(())
    }

    #[test]
    fn reject_malformed_models() {
        for bad in ["flux", "/flux", "owner/", "owner/name:", "a/b/c"] {
            assert!(bad.parse::<ModelRef>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn input_serialization() {
        let input = GenerationInput::new("A lighthouse in the clouds");
        let expect = expect![[r#"{"model":"dev","prompt":"A lighthouse in the clouds","lora_scale":1,"num_outputs":1,"aspect_ratio":"9:16","output_format":"jpg","guidance_scale":3.5,"output_quality":100,"num_inference_steps":28}"#]];
        expect.assert_eq(&serde_json::to_string(&input).unwrap());
    }

    #[test]
    fn first_output() {
        let output = json!(["https://host/path/img123.png", "https://host/other.png"]);
        assert_eq!(
            first_output_url(&output),
            Some("https://host/path/img123.png")
        );
        assert_eq!(first_output_url(&json!([])), None);
        assert_eq!(first_output_url(&json!("https://host/a.png")), None);
        assert_eq!(first_output_url(&json!([42])), None);
        assert_eq!(first_output_url(&Value::Null), None);
    }
}
