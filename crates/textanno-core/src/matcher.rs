//! 精确字面匹配引擎（按行扫描 + 二进制回退）
//!
//! 只理解字节，不做任何解码：当且仅当超过最大行长仍无换行时，
//! 输入被视为二进制。二进制模式下整窗作为一行扫描，跨窗口的匹配
//! 通过保留 pattern_len-1 字节的重叠尾部覆盖，且恰好计数一次。

use std::io::{Read, Write};

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};

use crate::error::{write_all, TextError};
use crate::options::MatchOptions;

const BOLD: &str = "\x1b[1m";
const ATTRIBUTE_RESET: &str = "\x1b[0m";

/// 匹配统计（供调用方汇报与决定退出码）
#[derive(Debug, Default, Clone)]
pub struct MatchStats {
    /// 非重叠匹配总数
    pub match_count: u64,
    /// 含匹配的行数（二进制模式下按扫描窗计）
    pub line_match_count: u64,
    /// 是否进入过二进制模式
    pub binary: bool,
}

/// 匹配器：行缓冲、二进制状态与计数跨输入源保持
#[derive(Debug)]
pub struct Matcher {
    ac: AhoCorasick,
    pattern_len: usize,
    opts: MatchOptions,
    buffer: Vec<u8>,
    pos: usize,
    binary: bool,
    stats: MatchStats,
}

impl Matcher {
    pub fn new(pattern: &[u8], opts: MatchOptions) -> Result<Self, TextError> {
        if pattern.is_empty() {
            return Err(TextError::Usage("match parameter empty".to_string()));
        }
        if pattern.len() >= opts.max_columns {
            return Err(TextError::Usage(
                "match parameter not less than maximum line length".to_string(),
            ));
        }
        let ac = AhoCorasickBuilder::new()
            .match_kind(aho_corasick::MatchKind::LeftmostLongest)
            .build([pattern])
            .map_err(|e| TextError::Usage(format!("cannot build matcher: {e}")))?;
        Ok(Self {
            ac,
            pattern_len: pattern.len(),
            buffer: vec![0u8; opts.max_columns],
            pos: 0,
            binary: false,
            stats: MatchStats::default(),
            opts,
        })
    }

    /// 处理一个输入源；源末尾的未终止行按完整一行消费一次
    pub fn run(&mut self, reader: &mut dyn Read, out: &mut dyn Write) -> Result<(), TextError> {
        loop {
            let n = reader
                .read(&mut self.buffer[self.pos..])
                .map_err(|source| TextError::Read { source })?;
            if n == 0 {
                break;
            }
            self.pos += n;
            let force = self.pos == self.buffer.len();
            self.consume(out, force)?;
        }
        if !self.binary && self.pos > 0 {
            self.scan_line(0, self.pos, out)?;
            self.pos = 0;
        }
        Ok(())
    }

    /// 全部输入结束，交出统计
    pub fn finish(self) -> MatchStats {
        self.stats
    }

    /// 行装配：消费所有完整行；窗口填满且无换行则进入二进制模式
    fn consume(&mut self, out: &mut dyn Write, force: bool) -> Result<(), TextError> {
        if self.binary {
            return self.consume_binary(out);
        }
        let mut line_start = 0;
        while let Some(off) = self.buffer[line_start..self.pos]
            .iter()
            .position(|&b| b == b'\n')
        {
            let line_end = line_start + off + 1;
            self.scan_line(line_start, line_end, out)?;
            line_start = line_end;
        }
        if line_start > 0 {
            self.buffer.copy_within(line_start..self.pos, 0);
            self.pos -= line_start;
        } else if force {
            self.binary = true;
            self.stats.binary = true;
            self.consume_binary(out)?;
        }
        Ok(())
    }

    /// 二进制模式：整窗作为一行扫描，保留 pattern_len-1 字节重叠尾部
    fn consume_binary(&mut self, out: &mut dyn Write) -> Result<(), TextError> {
        if self.pos < self.pattern_len {
            return Ok(());
        }
        self.scan_line(0, self.pos, out)?;
        let keep = self.pattern_len - 1;
        self.buffer.copy_within(self.pos - keep..self.pos, 0);
        self.pos = keep;
        Ok(())
    }

    /// 在单行（或二进制整窗）内做非重叠字面匹配并按输出模式写出
    fn scan_line(&mut self, start: usize, end: usize, out: &mut dyn Write) -> Result<(), TextError> {
        let hits: Vec<(usize, usize)> = self
            .ac
            .find_iter(&self.buffer[start..end])
            .map(|m| (start + m.start(), start + m.end()))
            .collect();
        if hits.is_empty() {
            return Ok(());
        }
        self.stats.match_count += hits.len() as u64;
        self.stats.line_match_count += 1;
        if self.binary || self.opts.count_only {
            return Ok(());
        }
        if !self.opts.color {
            write_all(out, &self.buffer[start..end])?;
            return Ok(());
        }
        let mut prev = start;
        for (s, e) in hits {
            write_all(out, &self.buffer[prev..s])?;
            write_all(out, BOLD.as_bytes())?;
            write_all(out, &self.buffer[s..e])?;
            write_all(out, ATTRIBUTE_RESET.as_bytes())?;
            prev = e;
        }
        write_all(out, &self.buffer[prev..end])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run_matcher(pattern: &[u8], input: &[u8], opts: MatchOptions) -> (MatchStats, Vec<u8>) {
        let mut matcher = Matcher::new(pattern, opts).unwrap();
        let mut out = Vec::new();
        matcher
            .run(&mut Cursor::new(input.to_vec()), &mut out)
            .unwrap();
        (matcher.finish(), out)
    }

    #[test]
    fn counts_matches_and_lines() {
        let (stats, out) = run_matcher(b"ab", b"xabyab\nab\nnone\n", MatchOptions::default());
        assert_eq!(stats.match_count, 3);
        assert_eq!(stats.line_match_count, 2);
        assert!(!stats.binary);
        assert_eq!(out, b"xabyab\nab\n");
    }

    #[test]
    fn color_mode_wraps_each_hit() {
        let opts = MatchOptions {
            color: true,
            ..MatchOptions::default()
        };
        let (_, out) = run_matcher(b"ab", b"xaby\n", opts);
        assert_eq!(out, b"x\x1b[1mab\x1b[0my\n");
    }

    #[test]
    fn count_only_suppresses_lines() {
        let opts = MatchOptions {
            count_only: true,
            ..MatchOptions::default()
        };
        let (stats, out) = run_matcher(b"ab", b"ab\n", opts);
        assert_eq!(stats.match_count, 1);
        assert!(out.is_empty());
    }

    #[test]
    fn overlong_line_switches_to_binary() {
        let opts = MatchOptions {
            max_columns: 8,
            ..MatchOptions::default()
        };
        // 窗口填满且无换行：二进制模式，跨窗口匹配恰好计数一次
        let (stats, out) = run_matcher(b"abc", b"xxxxxxabcyyyyyyy", opts);
        assert!(stats.binary);
        assert_eq!(stats.match_count, 1);
        assert!(out.is_empty());
    }

    #[test]
    fn unterminated_tail_line_is_scanned() {
        let (stats, out) = run_matcher(b"ab", b"xab", MatchOptions::default());
        assert_eq!(stats.match_count, 1);
        assert_eq!(out, b"xab");
    }

    #[test]
    fn empty_pattern_is_usage_error() {
        let err = Matcher::new(b"", MatchOptions::default()).unwrap_err();
        assert!(matches!(err, TextError::Usage(_)));
    }

    #[test]
    fn pattern_wider_than_line_limit_is_usage_error() {
        let opts = MatchOptions {
            max_columns: 3,
            ..MatchOptions::default()
        };
        let err = Matcher::new(b"abcd", opts).unwrap_err();
        assert!(matches!(err, TextError::Usage(_)));
    }
}
