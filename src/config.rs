use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 通用配置
    #[serde(default)]
    pub general: GeneralConfig,

    /// 树遍历配置
    #[serde(default)]
    pub tree: TreeConfig,

    /// 图输出配置
    #[serde(default)]
    pub graph: GraphConfig,

    /// 输入模拟配置
    #[serde(default)]
    pub input: InputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// `tree` / 快照抓取的最大深度
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// 节点标签中附带的属性
    #[serde(default = "default_label_attributes")]
    pub label_attributes: Vec<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            label_attributes: default_label_attributes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// 指针移动动画时长（毫秒）
    #[serde(default = "default_move_duration_ms")]
    pub move_duration_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            move_duration_ms: default_move_duration_ms(),
        }
    }
}

impl InputConfig {
    pub fn move_duration(&self) -> Duration {
        Duration::from_millis(self.move_duration_ms)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_depth() -> usize {
    10
}

fn default_label_attributes() -> Vec<String> {
    ["AXTitle", "AXValue", "AXIdentifier"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_move_duration_ms() -> u64 {
    200
}

impl AppConfig {
    /// 从文件加载配置
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse config TOML")?;
        Ok(config)
    }

    /// 从默认位置加载，如果不存在则使用默认配置
    pub fn load_or_default() -> Self {
        let candidates = [
            PathBuf::from("config/axquery.toml"),
            PathBuf::from("axquery.toml"),
            dirs_config_path(),
        ];

        for path in &candidates {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        tracing::info!("Using default configuration");
        Self::default()
    }
}

fn dirs_config_path() -> PathBuf {
    dirs_home().join(".config/axquery/config.toml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
