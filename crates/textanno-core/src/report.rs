//! 共享的彩色报告辅助（stderr）
//!
//! 统计报告与匹配汇总共用的输出通道；各工具仅共享这一层。

const FOREGROUND_RED: &str = "\x1b[31m";
const FOREGROUND_GREEN: &str = "\x1b[32m";
const FOREGROUND_YELLOW: &str = "\x1b[33m";
const FOREGROUND_RESET: &str = "\x1b[39m";

/// 报告器：按级别着色的单行输出
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn line(&self, color: &str, msg: &str) {
        if self.color {
            eprintln!("{color}{msg}{FOREGROUND_RESET}");
        } else {
            eprintln!("{msg}");
        }
    }

    pub fn info(&self, msg: &str) {
        self.line(FOREGROUND_GREEN, msg);
    }

    pub fn warn(&self, msg: &str) {
        self.line(FOREGROUND_YELLOW, msg);
    }

    pub fn error(&self, msg: &str) {
        self.line(FOREGROUND_RED, msg);
    }
}
