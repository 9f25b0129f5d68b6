//! Reads and writes `~/.manus/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use manus_hal::BackendKind;
use manus_perception::TrackingMode;
use manus_types::{HandSide, ManusError};
use serde::{Deserialize, Serialize};

/// Glove backend named in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    #[default]
    Sim,
    Bridge,
    Native,
}

impl From<BackendChoice> for BackendKind {
    fn from(choice: BackendChoice) -> Self {
        match choice {
            BackendChoice::Sim => BackendKind::Sim,
            BackendChoice::Bridge => BackendKind::Bridge,
            BackendChoice::Native => BackendKind::Native,
        }
    }
}

impl std::str::FromStr for BackendChoice {
    type Err = ManusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<BackendKind>()? {
            BackendKind::Sim => BackendChoice::Sim,
            BackendKind::Bridge => BackendChoice::Bridge,
            BackendKind::Native => BackendChoice::Native,
        })
    }
}

/// Persisted runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendChoice,

    /// Reference clip time reached by a fully closed finger.
    #[serde(default = "default_time_scale")]
    pub time_scale: f32,

    /// Apply palm positions as well as orientations.
    #[serde(default)]
    pub positional_tracking: bool,

    /// Upper bound for one transport query (`0` = no wait).
    #[serde(default)]
    pub poll_timeout_ms: u32,

    /// Hand whose pointing gesture drives the aim line.
    #[serde(default = "default_interaction_hand")]
    pub interaction_hand: HandSide,

    #[serde(default = "default_frame_rate")]
    pub frame_rate_hz: u32,

    /// Stop after this many frames; `0` runs until Ctrl-C.
    #[serde(default)]
    pub max_frames: u64,

    /// Frames each pose of the simulated gesture tour is held for.
    #[serde(default = "default_sim_frames_per_pose")]
    pub sim_frames_per_pose: usize,

    /// JSON hand model; the built-in hand is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand_model: Option<PathBuf>,

    /// JSON reference pose clip; the built-in curl is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose_clip: Option<PathBuf>,
}

fn default_time_scale() -> f32 {
    manus_perception::retarget::DEFAULT_TIME_SCALE
}
fn default_interaction_hand() -> HandSide {
    HandSide::Right
}
fn default_frame_rate() -> u32 {
    60
}
fn default_sim_frames_per_pose() -> usize {
    90
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendChoice::default(),
            time_scale: default_time_scale(),
            positional_tracking: false,
            poll_timeout_ms: 0,
            interaction_hand: default_interaction_hand(),
            frame_rate_hz: default_frame_rate(),
            max_frames: 0,
            sim_frames_per_pose: default_sim_frames_per_pose(),
            hand_model: None,
            pose_clip: None,
        }
    }
}

impl Config {
    pub fn tracking(&self) -> TrackingMode {
        TrackingMode::from_flag(self.positional_tracking)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ManusError> {
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(ManusError::Config(format!(
                "time_scale must be positive, got {}",
                self.time_scale
            )));
        }
        if self.frame_rate_hz == 0 {
            return Err(ManusError::Config("frame_rate_hz must be at least 1".into()));
        }
        Ok(())
    }
}

/// Return the path to `~/.manus/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".manus").join("config.toml")
}

/// Effective configuration: the config file (defaults when it does not
/// exist) with `MANUS_*` overrides applied.  The flag tells whether a file
/// was found.
pub fn load() -> Result<(Config, bool), ManusError> {
    let stored = load_from(&config_path())?;
    let found = stored.is_some();
    let mut cfg = stored.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    cfg.validate()?;
    Ok((cfg, found))
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, ManusError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        ManusError::Config(format!("failed to read {}: {e}", path.display()))
    })?;
    let cfg: Config = toml::from_str(&raw)
        .map_err(|e| ManusError::Config(format!("failed to parse config: {e}")))?;
    cfg.validate()?;
    Ok(Some(cfg))
}

/// Apply `MANUS_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `MANUS_BACKEND` | `backend` |
/// | `MANUS_TIME_SCALE` | `time_scale` |
/// | `MANUS_POSITIONAL_TRACKING` | `positional_tracking` |
/// | `MANUS_POLL_TIMEOUT_MS` | `poll_timeout_ms` |
/// | `MANUS_INTERACTION_HAND` | `interaction_hand` |
/// | `MANUS_FRAME_RATE` | `frame_rate_hz` |
/// | `MANUS_MAX_FRAMES` | `max_frames` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("MANUS_BACKEND")
        && let Ok(backend) = v.parse()
    {
        cfg.backend = backend;
    }
    if let Ok(v) = std::env::var("MANUS_TIME_SCALE")
        && let Ok(scale) = v.trim().parse()
    {
        cfg.time_scale = scale;
    }
    if let Ok(v) = std::env::var("MANUS_POSITIONAL_TRACKING")
        && let Some(flag) = parse_flag(&v)
    {
        cfg.positional_tracking = flag;
    }
    if let Ok(v) = std::env::var("MANUS_POLL_TIMEOUT_MS")
        && let Ok(ms) = v.trim().parse()
    {
        cfg.poll_timeout_ms = ms;
    }
    if let Ok(v) = std::env::var("MANUS_INTERACTION_HAND") {
        match v.trim().to_ascii_lowercase().as_str() {
            "left" => cfg.interaction_hand = HandSide::Left,
            "right" => cfg.interaction_hand = HandSide::Right,
            _ => {}
        }
    }
    if let Ok(v) = std::env::var("MANUS_FRAME_RATE")
        && let Ok(hz) = v.trim().parse()
    {
        cfg.frame_rate_hz = hz;
    }
    if let Ok(v) = std::env::var("MANUS_MAX_FRAMES")
        && let Ok(n) = v.trim().parse()
    {
        cfg.max_frames = n;
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Save the config to disk, creating `~/.manus/` if necessary.
pub fn save(cfg: &Config) -> Result<(), ManusError> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), ManusError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| ManusError::Config(format!("failed to create config directory: {e}")))?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| ManusError::Config(format!("failed to serialize config: {e}")))?;
    fs::write(path, raw)
        .map_err(|e| ManusError::Config(format!("failed to write {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");
        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.backend, BackendChoice::Sim);
        assert_eq!(loaded.time_scale, 10.0);
        assert!(!loaded.positional_tracking);
        assert_eq!(loaded.interaction_hand, HandSide::Right);
        assert_eq!(loaded.frame_rate_hz, 60);
        assert!(loaded.hand_model.is_none());
    }

    #[test]
    fn partial_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "backend = \"bridge\"\ninteraction_hand = \"left\"\npose_clip = \"clips/fist.json\"\n",
        )
        .unwrap();

        let cfg = load_from(&path).unwrap().unwrap();
        assert_eq!(cfg.backend, BackendChoice::Bridge);
        assert_eq!(BackendKind::from(cfg.backend), BackendKind::Bridge);
        assert_eq!(cfg.interaction_hand, HandSide::Left);
        assert_eq!(cfg.pose_clip, Some(PathBuf::from("clips/fist.json")));
        assert_eq!(cfg.time_scale, 10.0);
        assert_eq!(cfg.tracking(), TrackingMode::RotationOnly);
    }

    #[test]
    fn invalid_file_is_config_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "backend = \"bluetooth\"\n").unwrap();
        assert!(matches!(load_from(&path), Err(ManusError::Config(_))));
    }

    #[test]
    fn zero_frame_rate_is_rejected() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "frame_rate_hz = 0\n").unwrap();
        assert!(matches!(load_from(&path), Err(ManusError::Config(_))));
    }

    #[test]
    fn config_path_points_to_manus_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".manus"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn flag_parsing() {
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    // Env overrides share process state, so they are exercised in one test.
    #[test]
    fn apply_env_overrides_changes_fields() {
        // SAFETY: no other test in this crate reads these variables.
        unsafe {
            std::env::set_var("MANUS_BACKEND", "Native");
            std::env::set_var("MANUS_TIME_SCALE", "4.5");
            std::env::set_var("MANUS_POSITIONAL_TRACKING", "yes");
            std::env::set_var("MANUS_INTERACTION_HAND", "left");
            std::env::set_var("MANUS_FRAME_RATE", "not-a-number");
            std::env::set_var("MANUS_MAX_FRAMES", "300");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        unsafe {
            for var in [
                "MANUS_BACKEND",
                "MANUS_TIME_SCALE",
                "MANUS_POSITIONAL_TRACKING",
                "MANUS_INTERACTION_HAND",
                "MANUS_FRAME_RATE",
                "MANUS_MAX_FRAMES",
            ] {
                std::env::remove_var(var);
            }
        }

        assert_eq!(cfg.backend, BackendChoice::Native);
        assert_eq!(cfg.time_scale, 4.5);
        assert_eq!(cfg.tracking(), TrackingMode::Positional);
        assert_eq!(cfg.interaction_hand, HandSide::Left);
        assert_eq!(cfg.frame_rate_hz, 60);
        assert_eq!(cfg.max_frames, 300);
    }
}
