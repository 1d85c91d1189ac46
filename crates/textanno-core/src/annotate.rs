//! 流式标注核心：解码器 + 发射器
//!
//! 设计要点：
//! - 字节按固定大小的块到达，追加进有界窗口；解码器遍历未消费区间，
//!   发射器把已判定的区段即时写出，整个输入永不整体驻留内存。
//! - 多字节序列可能跨越读块边界：续字节未到齐时执行 early-out——
//!   先冲刷已判定部分，再把未决尾部压实到窗口起点，等待下一次读取。
//! - 标注状态跨块、跨输入源保持；仅在条件变化时发射一次标记转换，
//!   同条件的连续坏字节只打开一对标记。

use std::io::{Read, Write};

use crate::buffer::ScanBuffer;
use crate::condition::{Condition, Theme};
use crate::error::{write_all, TextError};

/// 扫描器上下文
///
/// 窗口游标、进位标志与当前打开的条件集中在一个值里，每次进程调用
/// 构造一次，跨所有输入源复用；多个输入在语义上等价于单个拼接流。
pub struct Annotator {
    buffer: ScanBuffer,
    theme: Theme,
    current: Condition,
    last_byte_was_newline: bool,
    last_byte_was_cr: bool,
    last_byte_was_whitespace: bool,
}

impl Annotator {
    pub fn new(theme: Theme) -> Self {
        Self {
            buffer: ScanBuffer::new(),
            theme,
            current: Condition::Ok,
            last_byte_was_newline: false,
            last_byte_was_cr: false,
            last_byte_was_whitespace: false,
        }
    }

    /// 处理一个输入源。进位状态与未决的序列尾部跨源保留：
    /// 在上一个源末尾开始的多字节序列可以由下一个源的首字节补全。
    pub fn run(&mut self, reader: &mut dyn Read, out: &mut dyn Write) -> Result<(), TextError> {
        loop {
            let n = self.buffer.fill(reader)?;
            if n == 0 {
                break;
            }
            self.consume(out)?;
        }
        Ok(())
    }

    /// 全部输入结束：仍在等待续字节的尾部逐字节按编码错误发射，
    /// 然后关闭可能仍然打开的高亮。
    pub fn finish(&mut self, out: &mut dyn Write) -> Result<(), TextError> {
        for i in self.buffer.flushed_to()..self.buffer.filled_to() {
            self.emit_bad_byte(out, Condition::Encoding, i)?;
        }
        if self.current != Condition::Ok {
            write_all(out, self.theme.markup(Condition::Ok).as_bytes())?;
            self.current = Condition::Ok;
        }
        self.buffer.reset();
        Ok(())
    }

    /// 目前为止消费的输入是否以换行收尾（进位标志之一，跨源有效）
    pub fn ends_with_newline(&self) -> bool {
        self.last_byte_was_newline
    }

    /// 解码一趟：scan_pos 从窗口起点走到 filled_to，
    /// 或在序列不完整处 early-out 返回
    fn consume(&mut self, out: &mut dyn Write) -> Result<(), TextError> {
        let mut scan_pos = 0;
        let filled_to = self.buffer.filled_to();
        while scan_pos < filled_to {
            let ch = self.buffer.byte(scan_pos);
            let mut consumed = 1;
            if ch & 0x80 == 0 {
                // ASCII：除 \n/\t 外的控制字节单独标注
                if ch < 0x20 && ch != b'\n' && ch != b'\t' {
                    self.emit_bad_byte(out, Condition::Control, scan_pos)?;
                }
            } else if ch & 0x40 == 0 {
                // 期待首字节的位置出现孤立续字节
                self.emit_bad_byte(out, Condition::Encoding, scan_pos)?;
            } else if ch & 0x20 == 0 {
                match self.take_sequence(out, scan_pos, 2, 0x1f, 0x80)? {
                    Some(n) => consumed = n,
                    None => return Ok(()),
                }
            } else if ch & 0x10 == 0 {
                match self.take_sequence(out, scan_pos, 3, 0x0f, 0x800)? {
                    Some(n) => consumed = n,
                    None => return Ok(()),
                }
            } else if ch < 0xf5 {
                match self.take_sequence(out, scan_pos, 4, 0x07, 0x10000)? {
                    Some(n) => consumed = n,
                    None => return Ok(()),
                }
            } else {
                // 0xf5..=0xff 不是合法首字节，单字节判定，无需前瞻
                self.emit_bad_byte(out, Condition::Encoding, scan_pos)?;
            }

            let last = self.buffer.byte(scan_pos + consumed - 1);
            self.last_byte_was_newline = last == b'\n';
            if last == b'\n' && self.last_byte_was_whitespace {
                // 换行前是空格/制表符：在换行之前插入零宽标记
                self.emit_marker(out, Condition::TrailingWhitespace, scan_pos)?;
            }
            self.last_byte_was_cr = last == b'\r';
            if last != b'\r' {
                self.last_byte_was_whitespace = last == b'\t' || last == b' ';
            }
            scan_pos += consumed;
        }
        self.flush_verbatim(out, filled_to)?;
        self.buffer.reset();
        Ok(())
    }

    /// 尝试消费一个 `len` 字节序列。续字节未到齐时 early-out 并返回
    /// None；否则返回实际消费的字节数。
    ///
    /// 续字节非法时仅判首字节为编码错误，扫描从下一个字节继续（坏的
    /// 续字节会被重新检视）。序列合法则重建码点：低于该长度的最小可
    /// 编码值判为过长编码；2 字节序列落在 [0x80, 0xA0) 判为高位控制。
    /// 两种情况都整体统一标注，优先于把首字节单独判错。
    fn take_sequence(
        &mut self,
        out: &mut dyn Write,
        i: usize,
        len: usize,
        lead_mask: u8,
        min_codepoint: u32,
    ) -> Result<Option<usize>, TextError> {
        if i + len > self.buffer.filled_to() {
            self.early_out(out, i)?;
            return Ok(None);
        }
        let mut codepoint = (self.buffer.byte(i) & lead_mask) as u32;
        for k in 1..len {
            let c = self.buffer.byte(i + k);
            if c & 0xc0 != 0x80 {
                self.emit_bad_byte(out, Condition::Encoding, i)?;
                return Ok(Some(1));
            }
            codepoint = (codepoint << 6) | (c & 0x3f) as u32;
        }
        if codepoint < min_codepoint {
            self.emit_bad_span(out, Condition::Overlong, i, len)?;
        } else if len == 2 && codepoint < 0xa0 {
            self.emit_bad_span(out, Condition::HighControl, i, len)?;
        }
        Ok(Some(len))
    }

    /// 冲刷已判定输出并把从 `i` 开始的未决尾部压实到窗口起点
    fn early_out(&mut self, out: &mut dyn Write, i: usize) -> Result<(), TextError> {
        self.flush_verbatim(out, i)?;
        self.buffer.compact(i);
        Ok(())
    }

    /// 把 [flushed_to, upto) 原样整体写出；若此前处于标注状态，
    /// 先发射一次复位标记
    fn flush_verbatim(&mut self, out: &mut dyn Write, upto: usize) -> Result<(), TextError> {
        if upto > self.buffer.flushed_to() {
            if self.current != Condition::Ok {
                write_all(out, self.theme.markup(Condition::Ok).as_bytes())?;
                self.current = Condition::Ok;
            }
            write_all(out, self.buffer.slice(self.buffer.flushed_to(), upto))?;
            self.buffer.mark_flushed(upto);
        }
        Ok(())
    }

    /// 打开（或切换）标注条件；先把条件边界之前的字节写出
    fn open_condition(
        &mut self,
        out: &mut dyn Write,
        cond: Condition,
        upto: usize,
    ) -> Result<(), TextError> {
        self.flush_verbatim(out, upto)?;
        if cond != self.current {
            write_all(out, self.theme.markup(cond).as_bytes())?;
            self.current = cond;
        }
        Ok(())
    }

    /// 单个坏字节：以两位十六进制括号形式发射而非原始字节，
    /// 保持输出文本安全
    fn emit_bad_byte(
        &mut self,
        out: &mut dyn Write,
        cond: Condition,
        i: usize,
    ) -> Result<(), TextError> {
        self.open_condition(out, cond, i)?;
        let b = self.buffer.byte(i);
        let hex = format!("<{b:02x}>");
        write_all(out, hex.as_bytes())?;
        self.buffer.mark_flushed(i + 1);
        Ok(())
    }

    /// 连续 `len` 个字节按同一条件发射（序列整体标注）
    fn emit_bad_span(
        &mut self,
        out: &mut dyn Write,
        cond: Condition,
        i: usize,
        len: usize,
    ) -> Result<(), TextError> {
        for k in 0..len {
            self.emit_bad_byte(out, cond, i + k)?;
        }
        Ok(())
    }

    /// 零宽标记：不消费、不替换任何字节，仅在当前位置插入一个高亮空格
    fn emit_marker(
        &mut self,
        out: &mut dyn Write,
        cond: Condition,
        i: usize,
    ) -> Result<(), TextError> {
        self.open_condition(out, cond, i)?;
        write_all(out, b" ")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn annotate(input: &[u8]) -> Vec<u8> {
        let mut annotator = Annotator::new(Theme::default());
        let mut out = Vec::new();
        annotator
            .run(&mut Cursor::new(input.to_vec()), &mut out)
            .unwrap();
        annotator.finish(&mut out).unwrap();
        out
    }

    #[test]
    fn valid_ascii_passes_through() {
        assert_eq!(annotate(b"hello\tworld\n"), b"hello\tworld\n");
    }

    #[test]
    fn control_byte_is_hex_bracketed() {
        assert_eq!(annotate(b"a\x01b"), b"a\x1b[41;97m<01>\x1b[0mb");
    }

    #[test]
    fn bad_continuation_rejects_lead_only() {
        // 坏续字节不被跳过：X 在首字节判错后原样输出
        assert_eq!(annotate(b"\xc3X"), b"\x1b[41;97m<c3>\x1b[0mX");
    }

    #[test]
    fn overlong_two_byte_marks_whole_sequence() {
        assert_eq!(annotate(b"\xc0\x80"), b"\x1b[41;97m<c0><80>\x1b[0m");
    }

    #[test]
    fn high_control_two_byte_marks_whole_sequence() {
        assert_eq!(annotate(b"\xc2\x80"), b"\x1b[41;97m<c2><80>\x1b[0m");
    }

    #[test]
    fn nbsp_is_valid() {
        // U+00A0 紧邻高位控制区间之上
        assert_eq!(annotate(b"\xc2\xa0"), b"\xc2\xa0");
    }

    #[test]
    fn trailing_whitespace_marker_precedes_newline() {
        assert_eq!(annotate(b"a \n"), b"a \x1b[43m \x1b[0m\n");
        assert_eq!(annotate(b"a\n"), b"a\n");
    }

    #[test]
    fn cr_keeps_whitespace_candidate() {
        // \r 本身按控制字节标注，且不清除行尾空白候选
        assert_eq!(
            annotate(b"a \r\n"),
            b"a \x1b[41;97m<0d>\x1b[43m \x1b[0m\n"
        );
        assert_eq!(annotate(b"a\r\n"), b"a\x1b[41;97m<0d>\x1b[0m\n");
    }

    #[test]
    fn truncated_sequence_drains_as_encoding() {
        assert_eq!(annotate(b"X\xe2\x82"), b"X\x1b[41;97m<e2><82>\x1b[0m");
    }

    #[test]
    fn ends_with_newline_flag() {
        let mut annotator = Annotator::new(Theme::default());
        let mut out = Vec::new();
        annotator
            .run(&mut Cursor::new(b"a\n".to_vec()), &mut out)
            .unwrap();
        assert!(annotator.ends_with_newline());
        annotator
            .run(&mut Cursor::new(b"b".to_vec()), &mut out)
            .unwrap();
        assert!(!annotator.ends_with_newline());
    }
}
