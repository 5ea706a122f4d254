use anyhow::Result;
use seo_audit_batch::utils::logging;
use seo_audit_batch::{App, Config};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let mut config = Config::load()?;

    // 第一个参数覆盖输入文件
    if let Some(input) = std::env::args().nth(1) {
        config.input_csv = input;
    }

    // 初始化日志
    logging::init(config.verbose_logging);

    // Ctrl-C 取消批次，已完成的结果仍会导出
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⏹️ 收到 Ctrl-C，当前组完成后停止");
            trigger.cancel();
        }
    });

    // 初始化并运行应用
    let report = App::initialize(config)?.run(cancel).await?;

    info!("📄 明细: {}", report.csv_path.display());
    info!("📊 汇总: {}", report.json_path.display());

    Ok(())
}
