//! The pipeline that turns a parsed document into an [`IrSpec`](crate::ir::IrSpec).
//!
//! Stages run in document order over one [`TransformContext`]:
//! operation tuning, security composition, request-body synthesis, then
//! variant detection and pagination inference over the finished registry.

pub mod context;
pub mod name_allocator;
pub mod name_normalizer;
pub mod operation_tuner;
pub mod pagination;
pub mod request_synthesizer;
pub mod response_analyzer;
pub mod security_composer;
pub mod spec_to_ir;
pub mod variant_detector;

pub use context::TransformContext;
pub use request_synthesizer::EMPTY_BODY_CONTENT_TYPE;
pub use response_analyzer::{AnalyzerRegistry, ResponseAnalyzer};
pub use spec_to_ir::{TransformOptions, transform, transform_with_analyzers, transform_with_options};
