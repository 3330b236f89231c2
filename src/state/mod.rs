pub mod analysis_store;

pub use self::analysis_store::AnalysisStore;
