use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::Command;
use textanno_core::{
    annotate_and_write, inputs_from_args, match_and_report, stats_and_report, FilterOptions,
    MatchOptions, Reporter, TextError,
};
use tracing::{debug, error};

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "textanno", version, about = "文本编码卫生标注与检查工具")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 标注编码与文本卫生问题，输出带颜色代码的字节流（供 less 使用）
    Filter {
        /// 输入文件列表；为空读取标准输入，"-" 亦表示标准输入
        files: Vec<PathBuf>,
        /// 关闭颜色：仅保留 <xx> 括号标注
        #[arg(long)]
        no_color: bool,
        /// 主题文件路径（TOML），覆盖内置配色
        #[arg(long)]
        theme: Option<PathBuf>,
    },
    /// 通过 less 查看文件，内容经过滤器标注
    View {
        /// 交给 less 的文件列表
        files: Vec<PathBuf>,
    },
    /// 在输入中精确匹配字面模式（仅理解字节，非正则）
    Match {
        /// 匹配模式（字面字节）
        pattern: String,
        /// 输入文件列表；为空读取标准输入
        files: Vec<PathBuf>,
        /// 仅报告匹配数量
        #[arg(short = 'c', long)]
        count: bool,
        /// 输出中使用颜色代码
        #[arg(short = 'r', long)]
        color: bool,
        /// 可处理的最大行长（字节）
        #[arg(short = 'm', long, default_value_t = 65536)]
        max_columns: usize,
    },
    /// 检查编码与行尾，统计行数等
    Stats {
        /// 输入文件列表；为空读取标准输入
        files: Vec<PathBuf>,
        /// 报告中使用颜色代码
        #[arg(short = 'r', long)]
        color: bool,
        /// 同时把计数以 JSON 对象写到标准输出
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    init_tracing();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // 用法错误固定退出码 1（帮助与版本输出除外）
            let _ = err.print();
            std::process::exit(if err.use_stderr() { 1 } else { 0 });
        }
    };
    let code = match dispatch(cli) {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            err.downcast_ref::<TextError>()
                .map(TextError::exit_code)
                .unwrap_or(1)
        }
    };
    std::process::exit(code);
}

fn dispatch(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Filter {
            files,
            no_color,
            theme,
        } => {
            let inputs = inputs_from_args(&files);
            let opts = FilterOptions {
                color: !no_color,
                theme_path: theme,
            };
            // 标准输出是数据通道，诊断一律走 stderr 且默认安静
            debug!(sources = inputs.len(), "starting filter");
            let stdout = std::io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            annotate_and_write(&inputs, &opts, &mut out)?;
            out.flush().ok();
            Ok(0)
        }
        Commands::View { files } => run_view(&files),
        Commands::Match {
            pattern,
            files,
            count,
            color,
            max_columns,
        } => {
            let inputs = inputs_from_args(&files);
            let opts = MatchOptions {
                count_only: count,
                color,
                max_columns,
            };
            let reporter = Reporter::new(color);
            let stdout = std::io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            let stats = match_and_report(pattern.as_bytes(), &inputs, &opts, &mut out, &reporter)?;
            out.flush().ok();
            // 与 grep 口径一致：有匹配退出 0，否则 1
            Ok(if stats.match_count > 0 { 0 } else { 1 })
        }
        Commands::Stats { files, color, json } => {
            let inputs = inputs_from_args(&files);
            let reporter = Reporter::new(color);
            let stdout = std::io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            stats_and_report(&inputs, json, &reporter, &mut out)?;
            out.flush().ok();
            Ok(0)
        }
    }
}

/// 设置 LESSOPEN 让 less 经过滤器读取内容，然后替换进程为 less -R。
/// exec 仅在失败时返回。
fn run_view(files: &[PathBuf]) -> Result<i32> {
    use std::os::unix::process::CommandExt;
    let exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("textanno"));
    let lessopen = format!("||-{} filter %s", exe.display());
    debug!(files = files.len(), "starting pager");
    let err = Command::new("less")
        .arg("-R")
        .args(files)
        .env("LESSOPEN", lessopen)
        .exec();
    Err(TextError::Pager {
        pager: "less".to_string(),
        source: err,
    }
    .into())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 支持通过环境变量 RUST_LOG 控制日志等级，如：RUST_LOG=debug
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
