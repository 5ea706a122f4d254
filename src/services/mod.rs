pub mod aggregator;
pub mod analysis_client;
pub mod llm_service;
pub mod report_writer;
pub mod response_parser;
pub mod warn_writer;

pub use aggregator::summarize;
pub use analysis_client::{AnalysisClient, Analyzer, RetryPolicy};
pub use llm_service::LlmService;
pub use report_writer::{export_rows, ExportRow, ReportWriter};
pub use response_parser::{parser_from_config, ExtractingParser, ResponseParser, SeededParser};
pub use warn_writer::WarnWriter;
