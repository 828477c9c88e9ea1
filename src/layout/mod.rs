pub mod appendix;
pub mod stamp;

pub use appendix::{
    AppendixGeometry, AppendixPlacement, AppendixReport, ShelfPacker, Watermark, layout_appendix,
};
pub use stamp::{StampRecord, StampStyle, paint_stamp, stamp_font_size};
