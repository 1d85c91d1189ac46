//! 文本卫生标注核心库
//!
//! 设计要点：
//! - 核心是字节级流式扫描：校验 UTF-8 与文本卫生问题（控制字符、
//!   行尾空白、过长编码），在缺陷区段周围内联插入视觉标记，
//!   有效字节原样透传，整个输入永不整体驻留内存。
//! - 多字节序列可跨读块边界：解码器在续字节未到齐时 early-out，
//!   压实窗口后等待下一块；标注状态跨块、跨输入源保持。
//! - 配套工具（字面匹配、文本统计）是同一套字节分类规则的独立
//!   消费者，彼此只共享报告辅助。

mod annotate;
mod buffer;
mod condition;
mod error;
mod matcher;
mod options;
mod report;
mod run;
mod stats;
mod theme;

pub use annotate::Annotator;
pub use condition::{Condition, Theme};
pub use error::TextError;
pub use matcher::{MatchStats, Matcher};
pub use options::{FilterOptions, MatchOptions};
pub use report::Reporter;
pub use run::{annotate_and_write, inputs_from_args, match_and_report, stats_and_report, Input};
pub use stats::{StatsCollector, TextStats};
pub use theme::load_theme;
