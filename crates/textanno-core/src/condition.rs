//! 标注条件与配色表

/// 标注条件
/// - 任一发射点恰好有一个条件处于“打开”状态；Ok 表示原样透传，
///   其余条件对应一段高亮标注。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Ok,
    Control,
    Encoding,
    Overlong,
    HighControl,
    TrailingWhitespace,
}

/// 条件到转义序列的映射表（可由主题文件覆盖，见 theme 模块）
#[derive(Debug, Clone)]
pub struct Theme {
    pub ok: String,
    pub control: String,
    pub encoding: String,
    pub overlong: String,
    pub high_control: String,
    pub trailing_whitespace: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            ok: "\x1b[0m".to_string(),
            control: "\x1b[41;97m".to_string(),
            encoding: "\x1b[41;97m".to_string(),
            overlong: "\x1b[41;97m".to_string(),
            high_control: "\x1b[41;97m".to_string(),
            trailing_whitespace: "\x1b[43m".to_string(),
        }
    }
}

impl Theme {
    /// 关闭颜色：全部标记串为空，输出仅保留 `<xx>` 括号标注
    pub fn plain() -> Self {
        Self {
            ok: String::new(),
            control: String::new(),
            encoding: String::new(),
            overlong: String::new(),
            high_control: String::new(),
            trailing_whitespace: String::new(),
        }
    }

    /// 条件对应的标记串（match 直查，不走下标耦合的并行数组）
    pub fn markup(&self, cond: Condition) -> &str {
        match cond {
            Condition::Ok => &self.ok,
            Condition::Control => &self.control,
            Condition::Encoding => &self.encoding,
            Condition::Overlong => &self.overlong,
            Condition::HighControl => &self.high_control,
            Condition::TrailingWhitespace => &self.trailing_whitespace,
        }
    }
}
