//! Application-level configuration loading: seed data and per-request limits.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_BACK_CONFIG_PATH";

const DEFAULT_PAGE_LENGTH: u64 = 10;
const DEFAULT_SAMPLE_SIZE: usize = 10;
const DEFAULT_MAX_QUIZZES_PER_DAY: u64 = 50;
const DEFAULT_PLAY_SESSION_TTL_SECS: u64 = 3600;

/// User created at startup when no account with the same username exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub username: String,
    pub is_admin: bool,
    /// Fixed API token; a random one is generated when absent.
    pub token: Option<String>,
}

/// Quiz inserted at startup into an empty store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedQuiz {
    pub question: String,
    pub answer: String,
    /// Username of the seeded author, if any.
    pub author: Option<String>,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    users: Vec<SeedUser>,
    quizzes: Vec<SeedQuiz>,
    page_length: u64,
    sample_size: usize,
    max_quizzes_per_day: u64,
    play_session_ttl: Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        users = app_config.users.len(),
                        quizzes = app_config.quizzes.len(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    pub fn seed_users(&self) -> &[SeedUser] {
        &self.users
    }

    pub fn seed_quizzes(&self) -> &[SeedQuiz] {
        &self.quizzes
    }

    /// Page length used when the request does not provide a valid one.
    pub fn page_length(&self) -> u64 {
        self.page_length
    }

    /// Number of quizzes returned by a random sample.
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Quizzes an author may create in any 24 hour window.
    pub fn max_quizzes_per_day(&self) -> u64 {
        self.max_quizzes_per_day
    }

    /// Idle time after which a play session is forgotten.
    pub fn play_session_ttl(&self) -> Duration {
        self.play_session_ttl
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            users: default_users(),
            quizzes: default_quizzes(),
            page_length: DEFAULT_PAGE_LENGTH,
            sample_size: DEFAULT_SAMPLE_SIZE,
            max_quizzes_per_day: DEFAULT_MAX_QUIZZES_PER_DAY,
            play_session_ttl: Duration::from_secs(DEFAULT_PLAY_SESSION_TTL_SECS),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    users: Option<Vec<RawUser>>,
    #[serde(default)]
    quizzes: Option<Vec<RawQuiz>>,
    page_length: Option<u64>,
    sample_size: Option<usize>,
    max_quizzes_per_day: Option<u64>,
    play_session_ttl_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            users: value
                .users
                .map(|users| users.into_iter().map(Into::into).collect())
                .unwrap_or(defaults.users),
            quizzes: value
                .quizzes
                .map(|quizzes| quizzes.into_iter().map(Into::into).collect())
                .unwrap_or(defaults.quizzes),
            page_length: value
                .page_length
                .filter(|length| *length > 0)
                .unwrap_or(defaults.page_length),
            sample_size: value.sample_size.unwrap_or(defaults.sample_size),
            max_quizzes_per_day: value
                .max_quizzes_per_day
                .unwrap_or(defaults.max_quizzes_per_day),
            play_session_ttl: value
                .play_session_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.play_session_ttl),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUser {
    username: String,
    #[serde(default)]
    is_admin: bool,
    token: Option<String>,
}

impl From<RawUser> for SeedUser {
    fn from(value: RawUser) -> Self {
        Self {
            username: value.username,
            is_admin: value.is_admin,
            token: value.token.filter(|token| !token.trim().is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawQuiz {
    question: String,
    answer: String,
    author: Option<String>,
}

impl From<RawQuiz> for SeedQuiz {
    fn from(value: RawQuiz) -> Self {
        Self {
            question: value.question,
            answer: value.answer,
            author: value.author,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in accounts shipped with the binary.
fn default_users() -> Vec<SeedUser> {
    vec![
        SeedUser {
            username: "admin".into(),
            is_admin: true,
            token: None,
        },
        SeedUser {
            username: "pepe".into(),
            is_admin: false,
            token: None,
        },
    ]
}

/// Built-in quizzes shipped with the binary.
fn default_quizzes() -> Vec<SeedQuiz> {
    [
        ("Capital of Italy", "Rome", "admin"),
        ("Capital of Portugal", "Lisbon", "admin"),
        ("Capital of Spain", "Madrid", "pepe"),
        ("Capital of France", "Paris", "pepe"),
    ]
    .into_iter()
    .map(|(question, answer, author)| SeedQuiz {
        question: question.into(),
        answer: answer.into(),
        author: Some(author.into()),
    })
    .collect()
}
