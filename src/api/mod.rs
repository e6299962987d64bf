pub mod ask;
pub mod documents;
