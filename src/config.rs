use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

/// Application-level constants
pub const APP_NAME: &str = "AI Doctor API";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Base directory used by hosted Spaces deployments.
const SPACE_BASE_DIR: &str = "/home/user/app";

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_API_PREFIX: &str = "/api/v1";

/// Data file names expected inside the data directory.
pub const TRAINING_FILE: &str = "training.csv";
pub const DESCRIPTION_FILE: &str = "Description.csv";
pub const PRECAUTIONS_FILE: &str = "Precautions_df.csv";
pub const MEDICATIONS_FILE: &str = "Medications.csv";
pub const DIETS_FILE: &str = "Diets.csv";
pub const WORKOUTS_FILE: &str = "workout_df.csv";
pub const SEVERITY_FILE: &str = "Symptom_Severity.csv";

pub const DATA_FILES: [&str; 7] = [
    TRAINING_FILE,
    DESCRIPTION_FILE,
    PRECAUTIONS_FILE,
    MEDICATIONS_FILE,
    DIETS_FILE,
    WORKOUTS_FILE,
    SEVERITY_FILE,
];

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "aidoctor=info,tower_http=info"
}

/// Runtime settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_dir: PathBuf,
    pub data_dir: PathBuf,
    pub model_path: PathBuf,
    pub static_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub api_prefix: String,
    /// `["*"]` allows any origin.
    pub cors_origins: Vec<String>,
    /// Abort startup instead of serving in degraded mode.
    pub strict_startup: bool,
}

impl Settings {
    /// Build settings rooted at `base_dir` with every other value defaulted.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            data_dir: base_dir.join("Data.csv"),
            model_path: base_dir.join("Models").join("svc.json"),
            static_dir: base_dir.join("static"),
            base_dir,
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            cors_origins: vec!["*".to_string()],
            strict_startup: true,
        }
    }

    /// Resolve settings from process environment variables.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Resolve settings through an arbitrary variable lookup.
    ///
    /// Factored out from `from_env` so tests do not mutate the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_dir = resolve_base_dir(&lookup);
        let mut settings = Self::with_base_dir(base_dir);

        if let Some(dir) = non_empty(lookup("AIDOCTOR_DATA_DIR")) {
            settings.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = non_empty(lookup("AIDOCTOR_MODEL_PATH")) {
            settings.model_path = PathBuf::from(path);
        }
        if let Some(dir) = non_empty(lookup("AIDOCTOR_STATIC_DIR")) {
            settings.static_dir = PathBuf::from(dir);
        }

        let host = match non_empty(lookup("HOST")) {
            Some(raw) => raw
                .parse::<IpAddr>()
                .map_err(|e| format!("invalid HOST '{raw}': {e}"))?,
            None => settings.bind_addr.ip(),
        };
        let port = match non_empty(lookup("PORT")) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| format!("invalid PORT '{raw}': {e}"))?,
            None => DEFAULT_PORT,
        };
        settings.bind_addr = SocketAddr::new(host, port);

        if let Some(prefix) = non_empty(lookup("AIDOCTOR_API_PREFIX")) {
            settings.api_prefix = normalize_prefix(&prefix);
        }

        if let Some(raw) = non_empty(lookup("AIDOCTOR_CORS_ORIGINS")) {
            let origins: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
            if !origins.is_empty() {
                settings.cors_origins = origins;
            }
        }

        if let Some(raw) = non_empty(lookup("AIDOCTOR_STRICT_STARTUP")) {
            settings.strict_startup = parse_bool(&raw)
                .ok_or_else(|| format!("invalid AIDOCTOR_STRICT_STARTUP '{raw}'"))?;
        }

        Ok(settings)
    }

    /// Full path of a data file inside the data directory.
    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// Every file the service needs at startup, model artifact first.
    pub fn required_files(&self) -> Vec<PathBuf> {
        let mut files = vec![self.model_path.clone()];
        files.extend(DATA_FILES.iter().map(|name| self.data_file(name)));
        files
    }

    /// Required files that do not exist on disk.
    pub fn missing_files(&self) -> Vec<PathBuf> {
        self.required_files()
            .into_iter()
            .filter(|p| !p.exists())
            .collect()
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

fn resolve_base_dir<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = non_empty(lookup("AIDOCTOR_BASE_DIR")) {
        return PathBuf::from(dir);
    }
    if is_hosted_space(lookup) {
        return PathBuf::from(SPACE_BASE_DIR);
    }
    env::current_dir().unwrap_or_else(|_| Path::new(".").to_path_buf())
}

fn is_hosted_space<F>(lookup: &F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup("SPACE_ID")).is_some()
        || non_empty(lookup("IS_HF_SPACE"))
            .and_then(|v| parse_bool(&v))
            .unwrap_or(false)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "true" | "TRUE" | "True" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "False" | "no" | "NO" => Some(false),
        _ => None,
    }
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_are_rooted_at_base_dir() {
        let settings = Settings::from_lookup(lookup_from(&[("AIDOCTOR_BASE_DIR", "/srv/doc")])).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("/srv/doc/Data.csv"));
        assert_eq!(settings.model_path, PathBuf::from("/srv/doc/Models/svc.json"));
        assert_eq!(settings.static_dir, PathBuf::from("/srv/doc/static"));
        assert_eq!(settings.bind_addr.port(), 8000);
        assert_eq!(settings.api_prefix, "/api/v1");
        assert!(settings.allows_any_origin());
        assert!(settings.strict_startup);
    }

    #[test]
    fn hosted_space_uses_space_base_dir() {
        let settings = Settings::from_lookup(lookup_from(&[("SPACE_ID", "someone/doctor")])).unwrap();
        assert_eq!(settings.base_dir, PathBuf::from("/home/user/app"));

        let settings = Settings::from_lookup(lookup_from(&[("IS_HF_SPACE", "true")])).unwrap();
        assert_eq!(settings.base_dir, PathBuf::from("/home/user/app"));
    }

    #[test]
    fn explicit_base_dir_beats_space_detection() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("SPACE_ID", "someone/doctor"),
            ("AIDOCTOR_BASE_DIR", "/opt/doctor"),
        ]))
        .unwrap();
        assert_eq!(settings.base_dir, PathBuf::from("/opt/doctor"));
    }

    #[test]
    fn overrides_are_applied() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("AIDOCTOR_BASE_DIR", "/opt/doctor"),
            ("AIDOCTOR_DATA_DIR", "/data"),
            ("AIDOCTOR_MODEL_PATH", "/models/svc.onnx"),
            ("HOST", "127.0.0.1"),
            ("PORT", "9100"),
            ("AIDOCTOR_API_PREFIX", "v2/"),
            ("AIDOCTOR_CORS_ORIGINS", "http://a.test, http://b.test"),
            ("AIDOCTOR_STRICT_STARTUP", "no"),
        ]))
        .unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("/data"));
        assert_eq!(settings.model_path, PathBuf::from("/models/svc.onnx"));
        assert_eq!(settings.bind_addr.to_string(), "127.0.0.1:9100");
        assert_eq!(settings.api_prefix, "/v2");
        assert_eq!(settings.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert!(!settings.allows_any_origin());
        assert!(!settings.strict_startup);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = Settings::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.contains("PORT"));
    }

    #[test]
    fn missing_files_lists_absent_paths() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::with_base_dir(dir.path());
        assert_eq!(settings.missing_files().len(), DATA_FILES.len() + 1);

        std::fs::create_dir_all(&settings.data_dir).unwrap();
        std::fs::write(settings.data_file(TRAINING_FILE), "a,prognosis\n").unwrap();
        let missing = settings.missing_files();
        assert_eq!(missing.len(), DATA_FILES.len());
        assert!(!missing.contains(&settings.data_file(TRAINING_FILE)));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "1.0.0");
    }
}
