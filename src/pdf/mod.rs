pub mod content_stream;
pub mod font;
pub mod image_xobject;
pub mod optimizer;
pub mod reader;
pub mod surface;
pub mod writer;
