use std::{
    env,
    path::{Path, PathBuf},
};

use color_eyre::{Result, eyre::eyre};
use engine::RunConfig;

pub mod cli;

pub const TOKEN_VAR: &str = "REPLICATE_API_TOKEN";
pub const ENV_FILE_NAME: &str = ".env.cli";

#[derive(Clone)]
pub struct Config {
    pub api_token: Option<String>,
    pub target_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_parts(env::var(TOKEN_VAR).ok(), dirs::home_dir())
    }

    pub fn from_parts(api_token: Option<String>, home_dir: Option<PathBuf>) -> Result<Self> {
        let home_dir = home_dir.ok_or(eyre!("Couldn't find home dir"))?;
        Ok(Self {
            api_token: api_token.filter(|t| !t.trim().is_empty()),
            target_dir: target_dir(&home_dir),
        })
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            target_dir: self.target_dir.clone(),
        }
    }
}

pub fn target_dir(home_dir: &Path) -> PathBuf {
    home_dir.join("Desktop").join("replicate")
}

/// `.env.cli` next to the executable, then in the working directory
pub fn env_file_candidates() -> Vec<PathBuf> {
    let exe_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    exe_dir
        .into_iter()
        .chain(env::current_dir().ok())
        .map(|dir| dir.join(ENV_FILE_NAME))
        .collect()
}

pub fn first_existing(candidates: &[PathBuf]) -> Option<&Path> {
    candidates.iter().map(PathBuf::as_path).find(|p| p.is_file())
}

/// Loads the first env file found. Variables that are already set are kept.
pub fn load_env_file() -> Result<Option<PathBuf>> {
    let candidates = env_file_candidates();
    let Some(path) = first_existing(&candidates) else {
        return Ok(None);
    };
    dotenvy::from_path(path)?;
    Ok(Some(path.to_path_buf()))
}

/// Info level unless `RUST_LOG` says otherwise, so the timing lines are always shown.
pub fn init_logger() {
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn artifacts_go_to_desktop() -> Result<()> {
        let cfg = Config::from_parts(Some("r8_abc".into()), Some("/home/ada".into()))?;
        assert_eq!(cfg.target_dir, PathBuf::from("/home/ada/Desktop/replicate"));
        assert_eq!(cfg.run_config().target_dir, cfg.target_dir);
        assert_eq!(cfg.api_token.as_deref(), Some("r8_abc"));
        Ok(())
    }

    #[test]
    fn blank_token_counts_as_missing() -> Result<()> {
        let cfg = Config::from_parts(Some("  ".into()), Some("/home/ada".into()))?;
        assert_eq!(cfg.api_token, None);
        Ok(())
    }

    #[test]
    fn missing_home_dir() {
        assert!(Config::from_parts(None, None).is_err());
    }

    #[test]
    fn env_file_lookup_order() -> Result<()> {
        let first = tempdir()?;
        let second = tempdir()?;
        let candidates = vec![
            first.path().join(ENV_FILE_NAME),
            second.path().join(ENV_FILE_NAME),
        ];
        assert_eq!(first_existing(&candidates), None);

        std::fs::write(&candidates[1], "REPLICATE_API_TOKEN=r8_second\n")?;
        assert_eq!(first_existing(&candidates), Some(candidates[1].as_path()));

        std::fs::write(&candidates[0], "REPLICATE_API_TOKEN=r8_first\n")?;
        assert_eq!(first_existing(&candidates), Some(candidates[0].as_path()));
        Ok(())
    }

    #[test]
    fn candidates_use_env_file_name() {
        let candidates = env_file_candidates();
        assert!(!candidates.is_empty());
        assert!(candidates.iter().all(|p| p.ends_with(ENV_FILE_NAME)));
    }
}
