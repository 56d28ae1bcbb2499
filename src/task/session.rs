// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/task/session.rs - 交互式会话
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

use std::{str::FromStr, thread, time::Duration};

use image::DynamicImage;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
  feature::blank_canvas,
  feedback::{FeedbackError, FeedbackLoop},
  task::{Presenter, Task},
};

#[derive(Error, Debug, PartialEq)]
pub enum SessionCommandError {
  #[error("未知命令: {0}")]
  UnknownCommand(String),
  #[error("命令 {0} 缺少参数")]
  MissingArgument(&'static str),
  #[error("无效的 URL {url:?}: {reason}")]
  InvalidUrl { url: String, reason: String },
}

/// 会话中的一行命令
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
  Predict(Url),
  Blank,
  Learn(String),
  Export(Option<Url>),
  Reset,
  Count,
  Quit,
}

fn parse_url(raw: &str) -> Result<Url, SessionCommandError> {
  Url::parse(raw).map_err(|err| SessionCommandError::InvalidUrl {
    url: raw.to_string(),
    reason: err.to_string(),
  })
}

impl FromStr for SessionCommand {
  type Err = SessionCommandError;

  fn from_str(line: &str) -> Result<Self, Self::Err> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
      Some((command, rest)) => (command, rest.trim()),
      None => (line, ""),
    };

    match command {
      "predict" if rest.is_empty() => Err(SessionCommandError::MissingArgument("predict")),
      "predict" => Ok(SessionCommand::Predict(parse_url(rest)?)),
      "blank" => Ok(SessionCommand::Blank),
      // 标签原样交给闭环校验
      "learn" => Ok(SessionCommand::Learn(rest.to_string())),
      "export" if rest.is_empty() => Ok(SessionCommand::Export(None)),
      "export" => Ok(SessionCommand::Export(Some(parse_url(rest)?))),
      "reset" => Ok(SessionCommand::Reset),
      "count" => Ok(SessionCommand::Count),
      "quit" | "exit" => Ok(SessionCommand::Quit),
      other => Err(SessionCommandError::UnknownCommand(other.to_string())),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFlow {
  Continue,
  Quit,
}

/// 逐行读取命令直到输入结束、`quit` 或 Ctrl-C
#[derive(Default, Debug)]
pub struct ContinuousTask {
  command_number: Option<usize>,
}

impl ContinuousTask {
  pub fn with_command_number(mut self, command_number: Option<usize>) -> Self {
    self.command_number = command_number;
    self
  }

  /// 执行一条命令，失败只会报告给用户
  pub fn handle<P: Presenter>(
    &self,
    command: SessionCommand,
    feedback: &mut FeedbackLoop,
    presenter: &mut P,
  ) -> std::io::Result<SessionFlow> {
    debug!("执行命令: {:?}", command);
    let outcome = match command {
      SessionCommand::Predict(url) => feedback
        .on_image_file(&url)
        .map(|result| presenter.prediction(&result)),
      SessionCommand::Blank => feedback
        .on_draw_complete(&DynamicImage::ImageLuma8(blank_canvas()))
        .map(|result| presenter.prediction(&result)),
      SessionCommand::Learn(label) => feedback
        .on_correction_submitted(&label)
        .map(|outcome| presenter.correction(&outcome)),
      SessionCommand::Export(url) => feedback
        .on_export_requested(url.as_ref())
        .map(|outcome| presenter.export(&outcome)),
      SessionCommand::Reset => feedback
        .on_reset_requested()
        .map(|count| presenter.reset(count)),
      SessionCommand::Count => Ok(presenter.count(feedback.sample_count())),
      SessionCommand::Quit => return Ok(SessionFlow::Quit),
    };

    match outcome {
      Ok(written) => written?,
      Err(err) => {
        warn!("命令执行失败: {}", err);
        presenter.error(&err)?;
      }
    }
    Ok(SessionFlow::Continue)
  }
}

impl<I: Iterator<Item = String>, P: Presenter> Task<I, P> for ContinuousTask {
  type Error = anyhow::Error;

  fn run_task(self, input: I, feedback: &mut FeedbackLoop, mut presenter: P) -> Result<(), Self::Error> {
    info!("开始会话...");
    let (tx, rx) = std::sync::mpsc::channel();

    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })?;

    let mut command_index = 0;
    for line in input {
      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出会话");
        break;
      }
      if line.trim().is_empty() {
        continue;
      }

      command_index += 1;
      let flow = match line.parse::<SessionCommand>() {
        Ok(command) => self.handle(command, feedback, &mut presenter)?,
        Err(err) => {
          warn!("无法解析命令 {:?}: {}", line, err);
          presenter.error(&FeedbackError::Command(err.to_string()))?;
          SessionFlow::Continue
        }
      };
      if flow == SessionFlow::Quit {
        info!("收到退出命令");
        break;
      }
      if self.command_number.map(|n| command_index >= n).unwrap_or(false) {
        info!("达到指定命令数 {}, 退出会话", command_index);
        break;
      }
    }

    if feedback.is_unsynced() {
      warn!("退出前重试保存训练数据");
      feedback.flush()?;
    }
    info!("会话结束，退出");
    Ok(())
  }
}
