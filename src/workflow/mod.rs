pub mod target_ctx;

pub use target_ctx::TargetCtx;
