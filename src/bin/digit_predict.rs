// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/bin/digit_predict.rs - 识别一张图像
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
use url::Url;

use digit_learner::{
  FromUrl,
  args::ContextArgs,
  feedback::FeedbackLoop,
  input::InputWrapper,
  task::{ConsolePresenter, OneShotTask, Task},
};
use tracing::info;

/// 识别手写数字图像
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入图像，如 image:///path/to/seven.png 或 canvas:blank
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  #[command(flatten)]
  pub context: ContextArgs,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  let context = args.context.to_context();

  info!("输入来源: {}", args.input);
  info!("训练数据: {}", context.data_file.display());

  let input = InputWrapper::from_url(&args.input)?;
  let mut feedback = FeedbackLoop::open(&context)?;
  let presenter = ConsolePresenter::new(std::io::stdout(), args.context.json);

  OneShotTask::default().run_task(input.into_features(), &mut feedback, presenter)?;

  Ok(())
}
