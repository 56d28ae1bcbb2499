// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/bin/digit_session.rs - 交互式识别与学习
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::io::BufRead;

use anyhow::Result;
use clap::Parser;

use digit_learner::{
  args::ContextArgs,
  feedback::FeedbackLoop,
  task::{ConsolePresenter, ContinuousTask, Task},
};
use tracing::info;

/// 从标准输入逐行读取命令:
/// predict <url> | blank | learn <digit> | export [url] | reset | count | quit
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 最多执行的命令数
  #[arg(long, value_name = "COMMAND_NUMBER")]
  pub command_number: Option<usize>,

  #[command(flatten)]
  pub context: ContextArgs,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  let context = args.context.to_context();
  match &context.export_url {
    Some(url) => info!("导出位置: {}", url),
    None => info!("导出目录: {}", context.export_dir.display()),
  }
  info!("训练数据: {}", context.data_file.display());
  match &context.corpus_file {
    Some(path) => info!("基础语料: {}", path.display()),
    None => info!("基础语料: 内置"),
  }

  let mut feedback = FeedbackLoop::open(&context)?;
  let presenter = ConsolePresenter::new(std::io::stdout(), args.context.json);
  let lines = std::io::stdin().lock().lines().map_while(|line| line.ok());

  ContinuousTask::default()
    .with_command_number(args.command_number)
    .run_task(lines, &mut feedback, presenter)?;

  Ok(())
}
