//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `FOI__*` 覆盖（双下划线表示嵌套，如 `FOI__SERVER__BASE_URL=http://host:5000`）。

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub player: PlayerSection,
    #[serde(default)]
    pub timeouts: TimeoutsSection,
    #[serde(default)]
    pub display: DisplaySection,
    #[serde(default)]
    pub quiz: QuizSection,
    #[serde(default)]
    pub host: HostSection,
}

/// [server] 段：FOI REST 服务地址
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

/// [player] 段：当前玩家与其老师（create 请求的 owner）
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSection {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_teacher")]
    pub teacher: String,
}

impl Default for PlayerSection {
    fn default() -> Self {
        Self {
            username: default_username(),
            teacher: default_teacher(),
        }
    }
}

fn default_username() -> String {
    "UnknownUser".to_string()
}

fn default_teacher() -> String {
    "teacher".to_string()
}

/// [timeouts] 段：单次网络请求超时（秒）
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutsSection {
    #[serde(default = "default_request_timeout")]
    pub request: u64,
}

impl Default for TimeoutsSection {
    fn default() -> Self {
        Self {
            request: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

/// [display] 段：换行宽度、默认头像、说话人名字颜色
#[derive(Debug, Clone, Deserialize)]
pub struct DisplaySection {
    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,
    #[serde(default = "default_face_image")]
    pub default_face_image: String,
    #[serde(default = "default_face_index")]
    pub default_face_index: u32,
    /// `\c[n]` 颜色码
    #[serde(default = "default_name_color")]
    pub name_color: u32,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            wrap_width: default_wrap_width(),
            default_face_image: default_face_image(),
            default_face_index: default_face_index(),
            name_color: default_name_color(),
        }
    }
}

fn default_wrap_width() -> usize {
    40
}

fn default_face_image() -> String {
    "Actor2".to_string()
}

fn default_face_index() -> u32 {
    2
}

fn default_name_color() -> u32 {
    4
}

/// [quiz] 段：出题提示、判题模板与通过标记
#[derive(Debug, Clone, Deserialize)]
pub struct QuizSection {
    #[serde(default = "default_elicitation_prompt")]
    pub elicitation_prompt: String,
    /// 可用占位符：{question}、{answer}、{pass_token}
    #[serde(default = "default_verification_template")]
    pub verification_template: String,
    #[serde(default = "default_pass_token")]
    pub pass_token: String,
    #[serde(default = "default_input_label")]
    pub input_label: String,
}

impl Default for QuizSection {
    fn default() -> Self {
        Self {
            elicitation_prompt: default_elicitation_prompt(),
            verification_template: default_verification_template(),
            pass_token: default_pass_token(),
            input_label: default_input_label(),
        }
    }
}

fn default_elicitation_prompt() -> String {
    "Ask the student exactly one short question about the material you teach. \
     Reply with the question only."
        .to_string()
}

fn default_verification_template() -> String {
    "You asked the student: {question}\n\
     The student answered: {answer}\n\
     Decide whether the answer is correct. Reply with JSON only, no other text: \
     {\"answer\": \"{pass_token}\" if correct or \"INCORRECT\" otherwise, \
     \"feedback\": \"<one or two sentences for the student>\"}"
        .to_string()
}

fn default_pass_token() -> String {
    "CORRECT".to_string()
}

fn default_input_label() -> String {
    "Your answer".to_string()
}

/// [host] 段：控制台宿主的帧间隔
#[derive(Debug, Clone, Deserialize)]
pub struct HostSection {
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
        }
    }
}

fn default_tick_millis() -> u64 {
    16
}

/// 未指定配置文件时按顺序查找的位置（取第一个存在的）
const DEFAULT_LOCATIONS: [&str; 3] = ["config/default.toml", "../config/default.toml", "default.toml"];

/// 加载配置，环境变量 FOI__* 最后覆盖（双下划线表示嵌套键）
///
/// 给出 config_path 时只读该文件，文件不存在即报错；否则使用 DEFAULT_LOCATIONS 中第一个存在的文件，
/// 一个都没有时全部取默认值。
pub fn load_config(config_path: Option<&Path>) -> Result<AppConfig, config::ConfigError> {
    let file = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => DEFAULT_LOCATIONS
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.is_file()),
    };

    let mut builder = config::Config::builder();
    if let Some(file) = file {
        tracing::debug!(path = %file.display(), "loading config file");
        builder = builder.add_source(config::File::from(file).required(true));
    }
    builder
        .add_source(
            config::Environment::with_prefix("FOI")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_plugin_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.base_url, "http://localhost:5000");
        assert_eq!(cfg.display.wrap_width, 40);
        assert_eq!(cfg.display.default_face_image, "Actor2");
        assert_eq!(cfg.display.default_face_index, 2);
        assert_eq!(cfg.player.username, "UnknownUser");
        assert_eq!(cfg.quiz.pass_token, "CORRECT");
    }

    #[test]
    fn test_verification_template_has_placeholders() {
        let t = default_verification_template();
        assert!(t.contains("{question}"));
        assert!(t.contains("{answer}"));
        assert!(t.contains("{pass_token}"));
    }

    #[test]
    fn test_load_explicit_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nbase_url = \"http://example.test:8080\"\n\n[display]\nwrap_width = 32\n\n[player]\nusername = \"ana\""
        )
        .unwrap();

        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.server.base_url, "http://example.test:8080");
        assert_eq!(cfg.display.wrap_width, 32);
        assert_eq!(cfg.player.username, "ana");
        // 未出现的段保持默认
        assert_eq!(cfg.timeouts.request, 30);
        assert_eq!(cfg.player.teacher, "teacher");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(load_config(Some(&missing)).is_err());
    }
}
