//! 主题文件加载（TOML）
use serde::Deserialize;
use std::path::Path;

use crate::condition::Theme;
use crate::error::TextError;

/// 顶层主题文件结构
#[derive(Debug, Clone, Deserialize)]
struct ThemeFile {
    #[serde(default)]
    markup: MarkupSection,
}

/// `[markup]` 段：每个条件一个可选字段，缺省保持内置配色
#[derive(Debug, Clone, Default, Deserialize)]
struct MarkupSection {
    #[serde(default)]
    ok: Option<String>,
    #[serde(default)]
    control: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    overlong: Option<String>,
    #[serde(default)]
    high_control: Option<String>,
    #[serde(default)]
    trailing_whitespace: Option<String>,
}

/// 读取主题文件并与默认配色合并
pub fn load_theme(path: &Path) -> Result<Theme, TextError> {
    let theme_error = |message: String| TextError::Theme {
        path: path.display().to_string(),
        message,
    };
    let txt = std::fs::read_to_string(path).map_err(|e| theme_error(e.to_string()))?;
    let parsed: ThemeFile = toml::from_str(&txt).map_err(|e| theme_error(e.to_string()))?;

    let mut theme = Theme::default();
    let m = parsed.markup;
    if let Some(v) = m.ok {
        theme.ok = v;
    }
    if let Some(v) = m.control {
        theme.control = v;
    }
    if let Some(v) = m.encoding {
        theme.encoding = v;
    }
    if let Some(v) = m.overlong {
        theme.overlong = v;
    }
    if let Some(v) = m.high_control {
        theme.high_control = v;
    }
    if let Some(v) = m.trailing_whitespace {
        theme.trailing_whitespace = v;
    }
    Ok(theme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("textanno-theme-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let path = write_temp("[markup]\ntrailing_whitespace = \"\\u001b[45m\"\n");
        let theme = load_theme(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(theme.trailing_whitespace, "\x1b[45m");
        // 未覆盖的条件保持内置配色
        assert_eq!(theme.encoding, "\x1b[41;97m");
    }

    #[test]
    fn missing_file_is_theme_error() {
        let err = load_theme(Path::new("/nonexistent/theme.toml")).unwrap_err();
        assert!(matches!(err, TextError::Theme { .. }));
        assert_eq!(err.exit_code(), 1);
    }
}
