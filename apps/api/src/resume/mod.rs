pub mod client;
pub mod handlers;
pub mod ranking;

pub use client::{ResumeAnalysis, ResumeAnalyzer, ResumeFormat};
