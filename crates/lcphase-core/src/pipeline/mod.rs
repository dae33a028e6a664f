pub mod config;
pub mod orchestrator;
pub mod types;
pub mod worker;

pub use config::{AnalysisConfig, SourceConfig, ThresholdConfig};
pub use orchestrator::AnalysisSession;
pub use types::{FailureReason, FrameResult, NoOpSink, ProgressSink, ResultSeries, SessionState};
pub use worker::{AnalysisController, ChannelProgressSink, SessionEvent};
