use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use dmview_scroll::{ControllerConfig, LayoutMetrics, WindowConfig};
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8008";
pub const SETTINGS_DIRECTORY_NAME: &str = "dmview";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const ENV_PREFIX: &str = "DMVIEW_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sent verbatim as the `Cookie` header, e.g. `Authorization=...`.
    #[serde(default)]
    pub cookie: String,
    #[serde(default = "default_max_window")]
    pub max_window: usize,
    #[serde(default = "default_edge_threshold_px")]
    pub edge_threshold_px: f64,
    /// Messages per full server page; a shorter page ends that direction.
    #[serde(default = "default_short_page")]
    pub short_page: Option<usize>,
    #[serde(default = "default_group_gap_seconds")]
    pub group_gap_seconds: i64,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,
    #[serde(default = "default_content_width")]
    pub content_width: f64,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            cookie: String::new(),
            max_window: default_max_window(),
            edge_threshold_px: default_edge_threshold_px(),
            short_page: default_short_page(),
            group_gap_seconds: default_group_gap_seconds(),
            viewport_height: default_viewport_height(),
            content_width: default_content_width(),
        }
    }
}

impl ViewerSettings {
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();

        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if self.base_url.is_empty() {
            self.base_url = defaults.base_url;
        }
        self.cookie = self.cookie.trim().to_string();
        self.max_window = self.max_window.max(1);
        self.short_page = self.short_page.filter(|size| *size > 0);
        self.group_gap_seconds = self.group_gap_seconds.max(0);

        // Pixel values come from hand-edited files and env vars; keep them usable.
        if !self.edge_threshold_px.is_finite() || self.edge_threshold_px < 0.0 {
            self.edge_threshold_px = defaults.edge_threshold_px;
        }
        if !self.viewport_height.is_finite() || self.viewport_height <= 0.0 {
            self.viewport_height = defaults.viewport_height;
        }
        if !self.content_width.is_finite() || self.content_width <= 0.0 {
            self.content_width = defaults.content_width;
        }

        self
    }

    pub fn cookie(&self) -> Option<&str> {
        if self.cookie.is_empty() {
            None
        } else {
            Some(&self.cookie)
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            window: WindowConfig {
                max_window: self.max_window,
                short_page: self.short_page,
            },
            edge_threshold: self.edge_threshold_px,
            group_gap_millis: self.group_gap_seconds.saturating_mul(1_000),
        }
    }

    pub fn layout_metrics(&self) -> LayoutMetrics {
        LayoutMetrics {
            content_width: self.content_width,
            viewport_height: self.viewport_height,
        }
    }
}

pub struct SettingsStore {
    settings: Arc<ArcSwap<ViewerSettings>>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".dmview"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = Self::load_from_disk(&config_path);
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> Arc<ViewerSettings> {
        self.settings.load_full()
    }

    pub fn update(&self, settings: ViewerSettings) -> Result<(), SettingsError> {
        let normalized_settings = settings.normalized();
        self.persist(&normalized_settings)?;
        self.settings.store(Arc::new(normalized_settings));
        Ok(())
    }

    fn load_from_disk(path: &Path) -> ViewerSettings {
        if !path.exists() {
            tracing::debug!("settings file not found at {:?}, using defaults", path);
        }

        // Missing files contribute nothing; the environment always has the last word.
        let figment = Figment::from(Serialized::defaults(ViewerSettings::default()))
            .merge(Json::file(path))
            .merge(Env::prefixed(ENV_PREFIX));

        match figment.extract::<ViewerSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!(
                    "failed to parse settings from {:?}: {}. using defaults",
                    path,
                    error
                );
                ViewerSettings::default()
            }
        }
    }

    fn persist(&self, settings: &ViewerSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).context(CreateDirSnafu {
                stage: "create-settings-directory",
                path: parent.to_path_buf(),
            })?;
        }

        let content = serde_json::to_string_pretty(settings).context(SerializeConfigSnafu {
            stage: "serialize-settings-json",
        })?;

        let temp_path = self.config_path.with_extension("json.tmp");
        std::fs::write(&temp_path, content).context(WriteFileSnafu {
            stage: "write-temporary-settings-file",
            path: temp_path.clone(),
        })?;

        std::fs::rename(&temp_path, &self.config_path).context(RenameTempFileSnafu {
            stage: "rename-temporary-settings-file",
            from: temp_path,
            to: self.config_path.clone(),
        })?;

        tracing::info!("saved settings to {:?}", self.config_path);
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("failed to create settings directory at {path:?} on `{stage}`: {source}"))]
    CreateDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to serialize settings on `{stage}`: {source}"))]
    SerializeConfig {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to write settings file at {path:?} on `{stage}`: {source}"))]
    WriteFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display(
        "failed to replace settings file from {from:?} to {to:?} on `{stage}`: {source}"
    ))]
    RenameTempFile {
        stage: &'static str,
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_max_window() -> usize {
    dmview_scroll::DEFAULT_MAX_WINDOW
}

fn default_edge_threshold_px() -> f64 {
    dmview_scroll::DEFAULT_EDGE_THRESHOLD
}

fn default_short_page() -> Option<usize> {
    Some(40)
}

fn default_group_gap_seconds() -> i64 {
    dmview_scroll::DEFAULT_GROUP_GAP_MILLIS / 1_000
}

fn default_viewport_height() -> f64 {
    600.0
}

fn default_content_width() -> f64 {
    680.0
}
