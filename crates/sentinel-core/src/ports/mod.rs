//! Hexagonal seams: the inbound API the outside world drives, and the
//! outbound port the pipeline calls for actual truth verification.

pub mod inbound;
pub mod outbound;
