pub mod content_stream;
pub mod editor;
pub mod reader;
