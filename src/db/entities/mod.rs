pub mod structure_document;
pub mod structure_history;
