//! 错误类型与退出码
use std::io::Write;
use thiserror::Error;

/// 运行期错误
/// - 操作类失败（打开/读/写）不可恢复，携带系统错误码供进程退出用；
/// - 内容缺陷不是错误，由扫描器以标注形式持续输出。
#[derive(Debug, Error)]
pub enum TextError {
    #[error("cannot open file \"{path}\": {source}")]
    Open { path: String, source: std::io::Error },
    #[error("cannot read: {source}")]
    Read { source: std::io::Error },
    #[error("cannot write: {source}")]
    Write { source: std::io::Error },
    #[error("cannot run pager \"{pager}\": {source}")]
    Pager { pager: String, source: std::io::Error },
    #[error("cannot load theme \"{path}\": {message}")]
    Theme { path: String, message: String },
    #[error("{0}")]
    Usage(String),
}

impl TextError {
    /// IO 类变体返回系统错误码，其余（主题、用法）固定 1
    pub fn exit_code(&self) -> i32 {
        match self {
            TextError::Open { source, .. }
            | TextError::Read { source }
            | TextError::Write { source }
            | TextError::Pager { source, .. } => source.raw_os_error().unwrap_or(1),
            TextError::Theme { .. } | TextError::Usage(_) => 1,
        }
    }
}

/// 写出并把 IO 失败归类为 Write
pub(crate) fn write_all(out: &mut dyn Write, bytes: &[u8]) -> Result<(), TextError> {
    out.write_all(bytes)
        .map_err(|source| TextError::Write { source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_variants_carry_os_code() {
        let err = TextError::Open {
            path: "missing".to_string(),
            source: std::io::Error::from_raw_os_error(2),
        };
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn usage_exits_one() {
        assert_eq!(TextError::Usage("bad".to_string()).exit_code(), 1);
    }
}
