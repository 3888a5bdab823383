pub const DEFAULT_PROMPT: &str = "Default prompt text";

/// Generate an image on Replicate and save it to ~/Desktop/replicate
#[derive(Debug, clap::Parser)]
#[command(name = "replicate", version)]
pub struct Cli {
    /// Description of the image, takes precedence over the positional words.
    /// A bare `--prompt` counts as no prompt.
    #[arg(short, long, num_args = 0..=1, default_missing_value = "")]
    pub prompt: Option<String>,

    /// The first word is used as the prompt when --prompt is missing
    pub words: Vec<String>,
}

impl Cli {
    pub fn prompt(&self) -> &str {
        self.prompt
            .as_deref()
            .filter(|p| !p.is_empty())
            .or_else(|| self.words.first().map(String::as_str).filter(|p| !p.is_empty()))
            .unwrap_or(DEFAULT_PROMPT)
    }
}
