//! LLM 回复解析 - 业务能力层
//!
//! 把一段自由文本解析成 {评分, 关键词, 建议}。
//! 解析策略可替换：
//! - [`ExtractingParser`]：从文本中提取明确给出的评分（生产默认）
//! - [`SeededParser`]：由种子和文本决定的伪评分，结果稳定可复现（测试 / 演示用）

use crate::config::Config;
use crate::error::ApiError;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::{Arc, OnceLock};

/// 解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAnalysis {
    pub score: f64,
    pub keywords: Vec<String>,
    pub recommendations: Vec<String>,
}

/// 解析策略
///
/// 同一文本多次调用必须得到相同结果。
pub trait ResponseParser: Send + Sync {
    fn parse(&self, raw_text: &str) -> Result<ParsedAnalysis, ApiError>;
}

/// 按配置选择解析策略
pub fn parser_from_config(config: &Config) -> Arc<dyn ResponseParser> {
    match config.score_strategy.as_str() {
        "seeded" => Arc::new(SeededParser::new(config.score_seed)),
        _ => Arc::new(ExtractingParser),
    }
}

/// 从回复文本中提取评分和列表
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractingParser;

impl ResponseParser for ExtractingParser {
    fn parse(&self, raw_text: &str) -> Result<ParsedAnalysis, ApiError> {
        let score = extract_score(raw_text)
            .ok_or_else(|| ApiError::MalformedPayload("回复中未找到 SEO 评分".to_string()))?;
        let sections = extract_sections(raw_text);
        Ok(ParsedAnalysis {
            score,
            keywords: sections.keywords,
            recommendations: sections.recommendations,
        })
    }
}

/// 确定性伪评分，范围 [60, 100)
#[derive(Debug, Clone, Copy)]
pub struct SeededParser {
    seed: u64,
}

impl SeededParser {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn pseudo_score(&self, raw_text: &str) -> f64 {
        let mut hasher = Sha256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(raw_text.as_bytes());
        let digest = hasher.finalize();

        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        let value = u64::from_be_bytes(head);

        60.0 + (value % 4000) as f64 / 100.0
    }
}

impl ResponseParser for SeededParser {
    fn parse(&self, raw_text: &str) -> Result<ParsedAnalysis, ApiError> {
        let sections = extract_sections(raw_text);
        Ok(ParsedAnalysis {
            score: self.pseudo_score(raw_text),
            keywords: sections.keywords,
            recommendations: sections.recommendations,
        })
    }
}

// ========== 提取逻辑 ==========

const KEYWORD_LABELS: &[&str] = &["palabras clave", "palabras-clave", "keywords"];
const RECOMMENDATION_LABELS: &[&str] = &["recomendaciones", "recommendations", "puntos de mejora"];

fn score_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // 标签和数字之间允许一小段同一行的说明文字，括号内容整体跳过
        Regex::new(
            r"(?i)(?:puntuaci[oó]n|calificaci[oó]n|score)(?:[^\d\n(]|\([^)\n]*\)){0,30}?(\d{1,3}(?:[.,]\d+)?)(?:\s*/\s*(\d{1,3}))?",
        )
        .expect("score regex is valid")
    })
}

/// 提取第一个明确给出的评分，换算到 0–100 并限制在该范围内
///
/// `NN/10` 之类的分母会被换算，`NN/100` 和不带分母的数字原样使用。
pub fn extract_score(text: &str) -> Option<f64> {
    let caps = score_regex().captures(text)?;
    let value: f64 = caps.get(1)?.as_str().replace(',', ".").parse().ok()?;
    let scaled = match caps.get(2).and_then(|d| d.as_str().parse::<f64>().ok()) {
        Some(denominator) if denominator > 0.0 => value * 100.0 / denominator,
        _ => value,
    };
    Some(scaled.clamp(0.0, 100.0))
}

#[derive(Debug, Default, PartialEq)]
struct Sections {
    keywords: Vec<String>,
    recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Keywords,
    Recommendations,
}

/// 按行扫描 "标题 + 列表" 结构
///
/// 标题后面可以直接跟逗号分隔的内联列表，也可以跟若干项目符号行。
/// 列表在空行或非列表行处结束。
fn extract_sections(text: &str) -> Sections {
    let mut sections = Sections::default();
    let mut current: Option<Section> = None;
    let mut has_items = false;

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if has_items {
                current = None;
            }
            continue;
        }

        if let Some((section, inline)) = detect_heading(trimmed) {
            current = Some(section);
            has_items = false;
            for item in split_inline(inline) {
                push_item(&mut sections, section, item);
                has_items = true;
            }
            continue;
        }

        let Some(section) = current else {
            continue;
        };

        match strip_bullet(trimmed) {
            Some(item) => {
                let item = clean_item(item);
                if !item.is_empty() {
                    push_item(&mut sections, section, item);
                    has_items = true;
                }
            }
            None => {
                if has_items {
                    current = None;
                }
            }
        }
    }

    sections
}

fn push_item(sections: &mut Sections, section: Section, item: String) {
    match section {
        Section::Keywords => sections.keywords.push(item),
        Section::Recommendations => sections.recommendations.push(item),
    }
}

/// 识别标题行，返回 (所属段落, 冒号后的内联内容)
fn detect_heading(line: &str) -> Option<(Section, &str)> {
    let stripped = line
        .trim_start_matches(|c: char| c == '#' || c == '*' || c.is_whitespace())
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start_matches(|c: char| c == '.' || c == ')' || c == '-' || c == '*' || c.is_whitespace());
    let lower = stripped.to_lowercase();

    let section = if KEYWORD_LABELS.iter().any(|label| lower.starts_with(label)) {
        Section::Keywords
    } else if RECOMMENDATION_LABELS.iter().any(|label| lower.starts_with(label)) {
        Section::Recommendations
    } else {
        return None;
    };

    match stripped.find([':', '：']) {
        // "Palabras clave: a, b" / "**Recomendaciones SEO:**"
        Some(pos) if stripped[..pos].chars().count() <= 40 => {
            let colon_len = stripped[pos..].chars().next().map_or(1, char::len_utf8);
            Some((section, &stripped[pos + colon_len..]))
        }
        Some(_) => None,
        // 没有冒号时只接受短标题，避免把正文句子当成标题
        None if stripped.chars().count() <= 40 => Some((section, "")),
        None => None,
    }
}

fn split_inline(inline: &str) -> Vec<String> {
    inline
        .split([',', ';'])
        .map(clean_item)
        .filter(|item| !item.is_empty())
        .collect()
}

/// 去掉列表符号：`- `、`* `、`• `、`+ `、`1. `、`2) `
fn strip_bullet(line: &str) -> Option<&str> {
    for marker in ["- ", "* ", "• ", "+ "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest);
        }
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        let rest = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'))?;
        if rest.starts_with(char::is_whitespace) {
            return Some(rest);
        }
    }

    None
}

fn clean_item(item: &str) -> String {
    item.trim()
        .trim_matches(|c: char| c == '*' || c == '`' || c == '"')
        .trim()
        .to_string()
}
