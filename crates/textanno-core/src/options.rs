//! 工具选项（模块）
use std::path::PathBuf;

/// 过滤器选项
#[derive(Debug, Clone)]
pub struct FilterOptions {
    /// 输出中使用颜色代码；关闭后标记串为空，仅保留 `<xx>` 括号标注
    pub color: bool,
    /// 主题文件路径（TOML）；为空则使用内置配色
    pub theme_path: Option<PathBuf>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            color: true,
            theme_path: None,
        }
    }
}

/// 匹配选项
#[derive(Debug, Clone)]
pub struct MatchOptions {
    /// 仅报告匹配数量，不输出行
    pub count_only: bool,
    /// 输出中使用颜色代码
    pub color: bool,
    /// 可处理的最大行长（字节）；超出且无换行即按二进制处理
    pub max_columns: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            count_only: false,
            color: false,
            max_columns: 65536,
        }
    }
}
