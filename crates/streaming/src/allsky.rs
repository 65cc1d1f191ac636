//! Allsky mosaic addressing.
//!
//! `Norder3/Allsky.{ext}` packs all 768 order-3 tiles into one image laid
//! out as a 27-column grid (29 rows, the last one partially filled). Each
//! sub-tile is square; its edge is the mosaic width divided by 27.

/// Columns in the allsky mosaic.
pub const ALLSKY_COLS: u32 = 27;
/// Rows in the allsky mosaic.
pub const ALLSKY_ROWS: u32 = 29;

/// Pixel rectangle of one order-3 cell inside the mosaic.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AllskyRect {
    pub dx: u32,
    pub dy: u32,
    pub size: u32,
}

/// Sub-tile rectangle for `ipix` in a mosaic of width `mosaic_width`.
/// `None` for indices outside the 768 order-3 cells.
pub fn allsky_rect(ipix: u64, mosaic_width: u32) -> Option<AllskyRect> {
    if ipix >= 768 {
        return None;
    }
    let size = mosaic_width / ALLSKY_COLS;
    let col = (ipix as u32) % ALLSKY_COLS;
    let row = (ipix as u32) / ALLSKY_COLS;
    Some(AllskyRect {
        dx: col * size,
        dy: row * size,
        size,
    })
}
