//! 运行驱动：输入源遍历与各工具主流程
use anyhow::Result;
use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;

use crate::annotate::Annotator;
use crate::condition::Theme;
use crate::error::TextError;
use crate::matcher::{MatchStats, Matcher};
use crate::options::{FilterOptions, MatchOptions};
use crate::report::Reporter;
use crate::stats::{StatsCollector, TextStats};
use crate::theme::load_theme;

/// 输入源："-" 与空参数列表均表示标准输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

/// 参数列表到输入源序列；顺序保持
pub fn inputs_from_args(files: &[PathBuf]) -> Vec<Input> {
    if files.is_empty() {
        return vec![Input::Stdin];
    }
    files
        .iter()
        .map(|p| {
            if p.as_os_str() == "-" {
                Input::Stdin
            } else {
                Input::File(p.clone())
            }
        })
        .collect()
}

fn open_input(input: &Input) -> Result<Box<dyn Read>, TextError> {
    match input {
        Input::Stdin => Ok(Box::new(std::io::stdin().lock())),
        Input::File(path) => {
            let file = File::open(path).map_err(|source| TextError::Open {
                path: path.display().to_string(),
                source,
            })?;
            Ok(Box::new(file))
        }
    }
}

fn resolve_theme(opts: &FilterOptions) -> Result<Theme, TextError> {
    if !opts.color {
        return Ok(Theme::plain());
    }
    match &opts.theme_path {
        Some(path) => load_theme(path),
        None => Ok(Theme::default()),
    }
}

/// 过滤主流程：同一个扫描器贯穿全部输入源，进位状态与未决尾部
/// 跨源保留；强制冲刷只在最后一个源之后执行一次
pub fn annotate_and_write(
    inputs: &[Input],
    opts: &FilterOptions,
    out: &mut dyn Write,
) -> Result<()> {
    let theme = resolve_theme(opts)?;
    let mut annotator = Annotator::new(theme);
    for input in inputs {
        let mut reader = open_input(input)?;
        annotator.run(reader.as_mut(), out)?;
    }
    annotator.finish(out)?;
    Ok(())
}

/// 匹配主流程：返回统计供调用方决定退出码
pub fn match_and_report(
    pattern: &[u8],
    inputs: &[Input],
    opts: &MatchOptions,
    out: &mut dyn Write,
    reporter: &Reporter,
) -> Result<MatchStats> {
    let mut matcher = Matcher::new(pattern, opts.clone())?;
    for input in inputs {
        let mut reader = open_input(input)?;
        matcher.run(reader.as_mut(), out)?;
    }
    let stats = matcher.finish();
    if stats.binary && stats.match_count > 0 && !opts.count_only {
        reporter.info("binary file matches");
    }
    if opts.count_only {
        reporter.info(&format!("{} matches", stats.match_count));
        if !stats.binary {
            reporter.info(&format!("{} lines match", stats.line_match_count));
        }
    }
    Ok(stats)
}

/// 统计主流程：单个收集器贯穿全部输入源
pub fn stats_and_report(
    inputs: &[Input],
    json: bool,
    reporter: &Reporter,
    out: &mut dyn Write,
) -> Result<TextStats> {
    let mut collector = StatsCollector::new();
    for input in inputs {
        let mut reader = open_input(input)?;
        collector.run(reader.as_mut())?;
    }
    let stats = collector.finish();
    stats.report(reporter);
    if json {
        stats.write_json(out)?;
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_and_empty_args_mean_stdin() {
        assert_eq!(inputs_from_args(&[]), vec![Input::Stdin]);
        let args = vec![PathBuf::from("a.txt"), PathBuf::from("-")];
        assert_eq!(
            inputs_from_args(&args),
            vec![Input::File(PathBuf::from("a.txt")), Input::Stdin]
        );
    }

    #[test]
    fn missing_file_reports_os_error() {
        let inputs = vec![Input::File(PathBuf::from("/nonexistent/input"))];
        let mut out = Vec::new();
        let err = annotate_and_write(&inputs, &FilterOptions::default(), &mut out).unwrap_err();
        let err = err.downcast::<TextError>().unwrap();
        assert!(matches!(err, TextError::Open { .. }));
        assert!(err.exit_code() != 0);
    }
}
