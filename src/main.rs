//! Review Agent - 电商评论智能回复
//!
//! 入口：初始化日志、加载配置、装配 Agent，然后处理评论：
//! - `review-agent <评论>`：处理命令行给出的一条评论
//! - `review-agent --demo`：依次处理三条内置示例评论
//! - 无参数：从 stdin 逐行读取评论
//!
//! `--config <path>` 追加一个配置文件，`--prepare` 在处理前先加载或构建说明书索引。

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use review_agent::config::load_config;
use review_agent::{observability, ReviewAgent, ReviewError};
use tokio::io::{AsyncBufReadExt, BufReader};

const DEMO_REVIEWS: [&str; 3] = [
    "这个产品太差了，我不知道怎么用！请帮我看看说明书。",
    "物流太慢了，等了半个月才到！差评！",
    "质量很好，非常喜欢！",
];

#[derive(Parser, Debug)]
#[command(name = "review-agent", version, about = "电商评论智能回复")]
struct CliArgs {
    /// 追加的配置文件
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// 依次处理三条内置示例评论
    #[arg(long)]
    demo: bool,
    /// 处理前先加载或构建说明书索引
    #[arg(long)]
    prepare: bool,
    /// 评论内容；省略时从 stdin 逐行读取
    review: Vec<String>,
}

async fn handle(agent: &ReviewAgent, review: &str) {
    match agent.process_review(review).await {
        Ok(outcome) => {
            println!("评论：{}", review);
            println!("回复：{}\n", outcome.final_reply);
        }
        Err(e) => {
            tracing::error!(error = %e, "review processing failed");
            println!("评论：{}", review);
            println!("回复生成失败，请稍后重试。\n");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let args = CliArgs::parse();
    let cfg = load_config(args.config.clone())
        .map_err(|e| ReviewError::Config(e.to_string()))
        .context("Failed to load config")?;
    tracing::info!(
        app = cfg.app.name.as_deref().unwrap_or("review-agent"),
        provider = %cfg.llm.provider,
        "starting"
    );

    let agent = ReviewAgent::from_config(&cfg);
    if args.prepare {
        let chunks = agent
            .prepare()
            .await
            .context("Failed to prepare knowledge index")?;
        tracing::info!(chunks, "knowledge index ready");
    }

    if args.demo {
        for review in DEMO_REVIEWS {
            handle(&agent, review).await;
        }
    } else if !args.review.is_empty() {
        handle(&agent, &args.review.join(" ")).await;
    } else {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            handle(&agent, line).await;
        }
    }

    let (prompt, completion, total) = agent.token_usage();
    tracing::info!(prompt, completion, total, "token usage");
    Ok(())
}
