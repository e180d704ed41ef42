//! FOI Agent 控制台宿主
//!
//! stdin 每行一条插件命令（或对当前消息的翻页 / 对输入框的作答），按 [host].tick_millis 推进交互。
//! 输入 quit / exit 或 Ctrl+C 退出；退出时终止所有进行中的交互。

use std::time::Duration;

use anyhow::Context;
use foi_agent::{config::load_config, host::ConsoleHost, observability, AgentRuntime};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    // 显式给出的配置文件必须存在且可解析；默认位置的文件出错时退回默认值
    let cfg = match std::env::args_os().nth(1).map(std::path::PathBuf::from) {
        Some(path) => load_config(Some(&path))
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => load_config(None).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "config load failed, using defaults");
            Default::default()
        }),
    };

    let mut runtime = AgentRuntime::from_config(&cfg).context("failed to build FOI client")?;
    let mut host = ConsoleHost::new();

    let shutdown = CancellationToken::new();
    install_signal_handler(shutdown.clone());

    // 阻塞读取放在独立线程：进程退出时不等待它
    let (line_tx, mut line_rx) = mpsc::channel::<String>(64);
    std::thread::spawn(move || read_stdin(line_tx));

    let mut interval = tokio::time::interval(Duration::from_millis(cfg.host.tick_millis.max(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut stdin_closed = false;

    tracing::info!("FOI agent console ready; type a foi_* command, or quit");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }

        let mut quit = false;
        loop {
            match line_rx.try_recv() {
                Ok(line) => {
                    let Some(command) = host.feed(&line) else { continue };
                    if matches!(command.as_str(), "quit" | "exit") {
                        quit = true;
                        break;
                    }
                    match runtime.dispatch(&command, &mut host) {
                        Ok(Some(id)) => tracing::debug!(interaction = %id, "interaction started"),
                        Ok(None) => {}
                        Err(e) => tracing::warn!(command = %command, error = %e, "command rejected"),
                    }
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    stdin_closed = true;
                    break;
                }
            }
        }
        if quit {
            break;
        }

        for outcome in runtime.tick(&mut host) {
            match (&outcome.verdict, &outcome.error) {
                (_, Some(err)) => {
                    tracing::warn!(interaction = %outcome.id, agent = %outcome.agent, error = %err, "interaction failed")
                }
                (Some(verdict), None) => tracing::info!(
                    interaction = %outcome.id,
                    agent = %outcome.agent,
                    question = outcome.question.as_deref().unwrap_or_default(),
                    answer = outcome.answer.as_deref().unwrap_or_default(),
                    passed = verdict.passed,
                    "quiz graded"
                ),
                (None, None) => {}
            }
        }

        // stdin 已关闭：没有交互在跑，或剩下的交互还在等输入，都无法再推进
        if stdin_closed && (runtime.scheduler().active_count() == 0 || host.needs_input()) {
            break;
        }
    }

    let aborted = runtime.shutdown(&mut host);
    if !aborted.is_empty() {
        tracing::info!(count = aborted.len(), "aborted in-flight interactions");
    }
    Ok(())
}

fn install_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received Ctrl+C, shutting down");
                shutdown.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "failed to listen for Ctrl+C"),
        }
    });
}

/// 逐行读取 stdin 并转发；EOF 时结束，发送端随之关闭
fn read_stdin(tx: mpsc::Sender<String>) {
    for line in std::io::stdin().lines() {
        match line {
            Ok(line) => {
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                break;
            }
        }
    }
}
