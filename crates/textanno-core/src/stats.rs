//! 文本统计：同一套字节分类规则的只读消费者
//!
//! 与过滤器不同，这里不产出任何标注，只聚合计数。逐字节推进的
//! UTF-8 状态机天然跨读块边界，无需窗口压实。

use std::io::{Read, Write};

use serde::Serialize;

use crate::error::{write_all, TextError};
use crate::report::Reporter;

/// 统计计数（报告与 JSON 输出共用）
#[derive(Debug, Default, Clone, Serialize)]
pub struct TextStats {
    pub line_count: u64,
    pub windows_line_count: u64,
    pub trailing_whitespace_count: u64,
    pub null_char_count: u64,
    pub control_count: u64,
    pub upper_control_count: u64,
    pub upper_printable_count: u64,
    pub latin1_finnish_count: u64,
    pub utf8_missing_continuation_count: u64,
    pub utf8_orphan_continuation_count: u64,
    pub utf8_overlong_count: u64,
    pub utf8_high_control_count: u64,
    pub utf8_illegal_count: u64,
}

impl TextStats {
    /// 报告计数；除行数外为零的计数不打印
    pub fn report(&self, reporter: &Reporter) {
        reporter.info(&format!("{} lines", self.line_count));
        if self.windows_line_count > 0 {
            reporter.warn(&format!("{} windows line endings", self.windows_line_count));
        }
        if self.null_char_count > 0 {
            reporter.error(&format!("{} null characters", self.null_char_count));
        }
        if self.control_count > 0 {
            reporter.error(&format!("{} control characters", self.control_count));
        }
        if self.upper_control_count > 0 {
            reporter.warn(&format!(
                "{} upper control characters",
                self.upper_control_count
            ));
        }
        if self.trailing_whitespace_count > 0 {
            reporter.warn(&format!(
                "{} trailing whitespaces",
                self.trailing_whitespace_count
            ));
        }
        if self.utf8_missing_continuation_count > 0 {
            reporter.error(&format!(
                "{} missing utf8 continuation bytes",
                self.utf8_missing_continuation_count
            ));
        }
        if self.utf8_orphan_continuation_count > 0 {
            reporter.error(&format!(
                "{} orphan utf8 continuation bytes",
                self.utf8_orphan_continuation_count
            ));
        }
        if self.utf8_overlong_count > 0 {
            reporter.error(&format!(
                "{} overlong utf8 encodings",
                self.utf8_overlong_count
            ));
        }
        if self.utf8_high_control_count > 0 {
            reporter.error(&format!(
                "{} utf8 upper control characters",
                self.utf8_high_control_count
            ));
        }
        if self.utf8_illegal_count > 0 {
            reporter.error(&format!(
                "{} illegal utf8 encodings",
                self.utf8_illegal_count
            ));
        }
        if self.upper_printable_count > 0 {
            let msg = format!(
                "{}/{} finnish letters out of upper printables",
                self.latin1_finnish_count, self.upper_printable_count
            );
            if 100 * self.latin1_finnish_count / self.upper_printable_count > 80 {
                reporter.info(&msg);
            } else {
                reporter.warn(&msg);
            }
        }
    }

    /// 以单个 JSON 对象流式写出计数
    pub fn write_json(&self, out: &mut dyn Write) -> Result<(), TextError> {
        serde_json::to_writer(&mut *out, self).map_err(|e| TextError::Write {
            source: std::io::Error::other(e),
        })?;
        write_all(out, b"\n")
    }
}

/// 增量收集器：解码进位（缺几个续字节、累计码点、长度下限）
/// 与行进位标志跨块、跨输入源保持
#[derive(Debug, Default)]
pub struct StatsCollector {
    stats: TextStats,
    pending: u8,
    codepoint: u32,
    min_codepoint: u32,
    last_byte_was_cr: bool,
    last_byte_was_whitespace: bool,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读尽一个输入源
    pub fn run(&mut self, reader: &mut dyn Read) -> Result<(), TextError> {
        let mut buf = [0u8; 65536];
        loop {
            let n = reader
                .read(&mut buf)
                .map_err(|source| TextError::Read { source })?;
            if n == 0 {
                break;
            }
            self.feed(&buf[..n]);
        }
        Ok(())
    }

    /// 消费一段字节
    pub fn feed(&mut self, chunk: &[u8]) {
        for &ch in chunk {
            self.step(ch);
        }
    }

    /// 全部输入结束：被截断的序列计一次缺失续字节
    pub fn finish(mut self) -> TextStats {
        if self.pending > 0 {
            self.stats.utf8_missing_continuation_count += 1;
            self.pending = 0;
        }
        self.stats
    }

    fn step(&mut self, ch: u8) {
        if self.pending > 0 && ch & 0xc0 != 0x80 {
            // 序列中断：缺失续字节；当前字节重新按首字节分类
            self.stats.utf8_missing_continuation_count += 1;
            self.pending = 0;
        }
        if ch & 0x80 == 0 {
            // ASCII，无解码进位
        } else if ch & 0x40 == 0 {
            if self.pending == 0 {
                self.stats.utf8_orphan_continuation_count += 1;
            } else {
                self.codepoint = (self.codepoint << 6) | (ch & 0x3f) as u32;
                self.pending -= 1;
                if self.pending == 0 {
                    if self.codepoint < self.min_codepoint {
                        self.stats.utf8_overlong_count += 1;
                    }
                    if (0x80..0xa0).contains(&self.codepoint) {
                        self.stats.utf8_high_control_count += 1;
                    }
                }
            }
        } else if ch & 0x20 == 0 {
            self.codepoint = (ch & 0x1f) as u32;
            self.pending = 1;
            self.min_codepoint = 0x80;
        } else if ch & 0x10 == 0 {
            self.codepoint = (ch & 0x0f) as u32;
            self.pending = 2;
            self.min_codepoint = 0x800;
        } else if ch < 0xf5 {
            self.codepoint = (ch & 0x07) as u32;
            self.pending = 3;
            self.min_codepoint = 0x10000;
        } else {
            self.stats.utf8_illegal_count += 1;
            self.pending = 0;
        }

        if ch == b'\n' {
            if self.last_byte_was_cr {
                self.stats.windows_line_count += 1;
            }
            if self.last_byte_was_whitespace {
                self.stats.trailing_whitespace_count += 1;
            }
            self.stats.line_count += 1;
        }
        self.last_byte_was_cr = ch == b'\r';
        if ch != b'\r' {
            self.last_byte_was_whitespace = ch == b'\t' || ch == b' ';
        }

        if ch == 0 {
            self.stats.null_char_count += 1;
        }
        if ch > 0 && ch < 0x20 && ch != b'\r' && ch != b'\n' && ch != b'\t' {
            self.stats.control_count += 1;
        }
        if (0x80..0xa0).contains(&ch) {
            self.stats.upper_control_count += 1;
        }
        if ch >= 0xa0 {
            self.stats.upper_printable_count += 1;
        }
        if matches!(ch, 0xc4 | 0xc5 | 0xd6 | 0xe4 | 0xe5 | 0xf6) {
            self.stats.latin1_finnish_count += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(input: &[u8]) -> TextStats {
        let mut collector = StatsCollector::new();
        collector.feed(input);
        collector.finish()
    }

    #[test]
    fn counts_lines_and_windows_endings() {
        let stats = collect(b"a\r\nb\nc \n");
        assert_eq!(stats.line_count, 3);
        assert_eq!(stats.windows_line_count, 1);
        assert_eq!(stats.trailing_whitespace_count, 1);
    }

    #[test]
    fn counts_utf8_defects() {
        // 孤立续字节、过长编码、高位控制、非法首字节各一
        let stats = collect(b"\x80\xc0\x80\xc2\x80\xf5");
        assert_eq!(stats.utf8_orphan_continuation_count, 1);
        assert_eq!(stats.utf8_overlong_count, 1);
        assert_eq!(stats.utf8_high_control_count, 1);
        assert_eq!(stats.utf8_illegal_count, 1);
    }

    #[test]
    fn missing_continuation_on_interruption_and_eof() {
        let stats = collect(b"\xe2Xa");
        assert_eq!(stats.utf8_missing_continuation_count, 1);
        let stats = collect(b"\xe2\x82");
        assert_eq!(stats.utf8_missing_continuation_count, 1);
    }

    #[test]
    fn chunk_boundary_does_not_split_state() {
        let mut collector = StatsCollector::new();
        collector.feed(b"\xc2");
        collector.feed(b"\x80");
        let stats = collector.finish();
        assert_eq!(stats.utf8_high_control_count, 1);
        assert_eq!(stats.utf8_missing_continuation_count, 0);
    }

    #[test]
    fn finnish_letters_among_upper_printables() {
        let stats = collect(b"\xc3\xa4");
        // 0xc3 计入高位可打印，0xa4 亦然；0xe4 掩码字节不存在于此输入
        assert_eq!(stats.upper_printable_count, 2);
        assert_eq!(stats.latin1_finnish_count, 0);
        let stats = collect(b"\xe4");
        assert_eq!(stats.latin1_finnish_count, 1);
    }

    #[test]
    fn null_and_control_bytes() {
        let stats = collect(b"\x00\x01\x02\t\r\n");
        assert_eq!(stats.null_char_count, 1);
        assert_eq!(stats.control_count, 2);
    }
}
