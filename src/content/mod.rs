//! Content module - document normalization and rich-text rendering

mod document;
pub mod richtext;

pub use document::{
    Banner, ContentBlock, Document, DocumentData, NavDoc, NormalizeError, RawDocument,
};
