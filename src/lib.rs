pub mod formats;
pub mod recognizer;
pub mod parser;
pub mod temporal;
pub mod corpus;
pub mod query;
pub mod masking;
pub mod patterns;
pub mod suspicious;
pub mod ngrams;
pub mod stats;
pub mod analyzers;
pub mod session;
pub mod report;
