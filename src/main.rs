use anyhow::Result;
use clap::Parser;
use paper_reviewer::{logger, App, Cli, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行并合并配置
    let cli = Cli::parse();
    let config = cli.apply(Config::from_env()?);

    // 初始化日志
    logger::init(config.verbose_logging);

    // 初始化并运行应用
    let stats = App::initialize(config)?.run().await?;

    if stats.failed > 0 {
        anyhow::bail!("{}/{} 篇论文审稿失败", stats.failed, stats.total);
    }

    Ok(())
}
