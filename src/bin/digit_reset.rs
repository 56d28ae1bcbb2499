// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/bin/digit_reset.rs - 删除已学习的数据
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

use anyhow::Result;
use clap::Parser;

use digit_learner::{
  args::ContextArgs,
  feedback::FeedbackLoop,
  task::{ConsolePresenter, Presenter},
};
use tracing::info;

/// 删除已保存的训练数据，恢复到基础语料
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  #[command(flatten)]
  pub context: ContextArgs,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  let context = args.context.to_context();
  info!("训练数据: {}", context.data_file.display());

  // 不加载旧数据，损坏的数据文件也能删除
  let sample_count = FeedbackLoop::reset_stored(&context)?;

  let mut presenter = ConsolePresenter::new(std::io::stdout(), args.context.json);
  presenter.reset(sample_count)?;

  Ok(())
}
