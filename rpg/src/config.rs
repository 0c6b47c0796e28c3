//! Command line and environment configuration.

use std::path::PathBuf;

use clap::Parser;
use rpg_core::MasterConfig;

/// Default `RUST_LOG` filter when none is set.
pub const DEFAULT_LOG_FILTER: &str = "rpg=info,rpg_core=info,gemini=info";

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "rpg",
    about = "A party role-playing game narrated by an AI game master",
    version
)]
pub struct Args {
    /// Player name; every user has their own saved game
    #[arg(long)]
    pub user: String,

    /// Directory for saved games [env: RPG_SAVE_DIR, default: saves]
    #[arg(long)]
    pub save_dir: Option<PathBuf>,

    /// Text model for the game master [env: RPG_MODEL]
    #[arg(long)]
    pub model: Option<String>,

    /// Language the story is told in [env: RPG_LANGUAGE, default: Hebrew]
    #[arg(long)]
    pub language: Option<String>,

    /// Line-oriented text mode instead of the TUI
    #[arg(long)]
    pub headless: bool,

    /// Do not generate character portraits
    #[arg(long)]
    pub no_portraits: bool,

    /// Where to write logs (the terminal belongs to the game)
    #[arg(long, default_value = "rpg.log")]
    pub log_file: PathBuf,
}

/// Resolved settings: flags first, then environment, then defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub user: String,
    pub save_dir: PathBuf,
    pub model: Option<String>,
    pub image_model: Option<String>,
    pub language: Option<String>,
    pub headless: bool,
    pub portraits: bool,
    pub log_file: PathBuf,
}

impl Settings {
    pub fn from_args(args: Args) -> Self {
        Self::resolve(args, |key| std::env::var(key).ok())
    }

    fn resolve(args: Args, env: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        Self {
            user: args.user.trim().to_string(),
            save_dir: args
                .save_dir
                .or_else(|| non_empty("RPG_SAVE_DIR").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("saves")),
            model: args.model.or_else(|| non_empty("RPG_MODEL")),
            image_model: non_empty("RPG_IMAGE_MODEL"),
            language: args.language.or_else(|| non_empty("RPG_LANGUAGE")),
            headless: args.headless,
            portraits: !args.no_portraits,
            log_file: args.log_file,
        }
    }

    pub fn master_config(&self) -> MasterConfig {
        let mut config = MasterConfig::default().with_portraits(self.portraits);
        if let Some(ref model) = self.model {
            config = config.with_model(model);
        }
        if let Some(ref model) = self.image_model {
            config = config.with_image_model(model);
        }
        if let Some(ref language) = self.language {
            config = config.with_language(language);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "rpg", "--user", "noa", "--language", "English", "--headless",
        ])
        .unwrap();
        assert_eq!(args.user, "noa");
        assert_eq!(args.language.as_deref(), Some("English"));
        assert!(args.headless);
        assert_eq!(args.log_file, PathBuf::from("rpg.log"));
    }

    #[test]
    fn test_user_is_required() {
        assert!(Args::try_parse_from(["rpg"]).is_err());
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["rpg", "--user", " noa "]).unwrap();
        let settings = Settings::resolve(args, env_of(&[]));

        assert_eq!(settings.user, "noa");
        assert_eq!(settings.save_dir, PathBuf::from("saves"));
        assert_eq!(settings.model, None);
        assert!(settings.portraits);
        assert_eq!(settings.master_config().language, "Hebrew");
    }

    #[test]
    fn test_flags_override_environment() {
        let env = env_of(&[
            ("RPG_MODEL", "env-model"),
            ("RPG_LANGUAGE", "French"),
            ("RPG_SAVE_DIR", "/tmp/env-saves"),
            ("RPG_IMAGE_MODEL", "env-image"),
        ]);
        let args = Args::try_parse_from(["rpg", "--user", "noa", "--model", "flag-model"]).unwrap();
        let settings = Settings::resolve(args, env);

        assert_eq!(settings.model.as_deref(), Some("flag-model"));
        assert_eq!(settings.language.as_deref(), Some("French"));
        assert_eq!(settings.save_dir, PathBuf::from("/tmp/env-saves"));

        let config = settings.master_config();
        assert_eq!(config.model.as_deref(), Some("flag-model"));
        assert_eq!(config.image_model, "env-image");
        assert_eq!(config.language, "French");
    }

    #[test]
    fn test_blank_environment_is_ignored() {
        let args = Args::try_parse_from(["rpg", "--user", "noa"]).unwrap();
        let settings = Settings::resolve(args, env_of(&[("RPG_LANGUAGE", "  ")]));
        assert_eq!(settings.language, None);
    }

    #[test]
    fn test_no_portraits() {
        let args = Args::try_parse_from(["rpg", "--user", "noa", "--no-portraits"]).unwrap();
        let settings = Settings::resolve(args, env_of(&[]));
        assert!(!settings.master_config().portraits);
    }
}
