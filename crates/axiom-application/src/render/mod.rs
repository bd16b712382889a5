//! Rendering of solved problems into display blocks.

pub mod pipeline;
pub mod typeset;
pub mod unicode;

pub use pipeline::{
    RenderBlock, RenderedStep, RenderedView, RichText, TextSegment, render_record,
    render_response, render_rich_text,
};
pub use typeset::{
    DisplayMode, PlainTypesetter, Typeset, TypesetError, Typesetter, typeset_or_fallback,
};
pub use unicode::UnicodeTypesetter;
