/// 日志工具模块
///
/// 提供日志初始化和批处理横幅的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::{RankedEntry, SummaryStats};

/// 初始化 tracing 订阅器
///
/// 优先使用 `RUST_LOG`；未设置时本 crate 输出 `info`，
/// `verbose` 为 true 时输出 `debug`。重复调用不会 panic。
pub fn init(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,seo_audit_batch={}", level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息（不输出密钥）
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - SEO 批量分析模式");
    info!("🤖 模型: {} @ {}", config.llm_model_name, config.llm_api_base_url);
    info!(
        "📊 每组并发数: {} | 最大尝试次数: {} | 评分策略: {}",
        config.group_size, config.max_retries, config.score_strategy
    );
    info!("{}", "=".repeat(60));
}

/// 记录目标加载信息
///
/// # 参数
/// - `total`: 目标总数
/// - `group_size`: 每组并发数
pub fn log_targets_loaded(total: usize, group_size: usize) {
    info!("✓ 找到 {} 个待分析的文章", total);
    info!("📋 将以每组 {} 个的方式处理", group_size);
    info!("💡 每组完成后再开始下一组\n");
}

/// 记录分组开始信息
///
/// # 参数
/// - `group_num`: 组编号
/// - `total_groups`: 组总数
/// - `start`: 起始目标编号
/// - `end`: 结束目标编号
/// - `total`: 目标总数
pub fn log_group_start(group_num: usize, total_groups: usize, start: usize, end: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 组", group_num, total_groups);
    info!("📄 本组文章: {}-{} / 共 {} 个", start, end, total);
    info!("{}", "=".repeat(60));
}

/// 记录分组完成信息
pub fn log_group_complete(group_num: usize, success: usize, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 第 {} 组完成: 成功 {}/{}", group_num, success, total);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计面板
pub fn print_final_stats(stats: &SummaryStats) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部分析完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", stats.success_count, stats.total_count);
    info!("❌ 失败: {}", stats.failure_count);
    info!("👥 编辑数: {}", stats.group_count);
    info!("📈 平均分: {}", format_score(stats.average_score));

    info!("{}", "─".repeat(60));
    info!("{:<24} {:>8} {:>8} {:>8}", "编辑", "文章", "成功", "平均分");
    for (group, group_stats) in &stats.per_group {
        info!(
            "{:<24} {:>8} {:>8} {:>8}",
            truncate_text(group, 24),
            group_stats.article_count,
            group_stats.scored_count,
            format_score(group_stats.average_score)
        );
    }

    log_ranking("🏆 最高分", &stats.top);
    log_ranking("⚠️ 最低分", &stats.bottom);
    info!("{}", "=".repeat(60));
}

fn log_ranking(title: &str, entries: &[RankedEntry]) {
    if entries.is_empty() {
        return;
    }
    info!("{}", "─".repeat(60));
    info!("{}", title);
    for (rank, entry) in entries.iter().enumerate() {
        info!(
            "  {}. {:.0} | {} | {}",
            rank + 1,
            entry.score,
            entry.target.group,
            truncate_text(entry.target.display_title(), 50)
        );
    }
}

fn format_score(score: Option<f64>) -> String {
    score.map_or_else(|| "-".to_string(), |s| format!("{:.1}", s))
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
