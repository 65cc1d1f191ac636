//! HiPS URL scheme.
//!
//! Tiles live under `{root}/Norder{order}/Dir{D}/Npix{ipix}.{ext}` where
//! `D = floor(ipix / 10000) * 10000`. The order-3 mosaic and the survey
//! metadata sit next to them.

fn trimmed(root: &str) -> &str {
    root.trim_end_matches('/')
}

/// Directory bucket for a pixel index.
pub fn dir_index(ipix: u64) -> u64 {
    (ipix / 10_000) * 10_000
}

pub fn tile_url(root: &str, order: u8, ipix: u64, ext: &str) -> String {
    format!(
        "{}/Norder{}/Dir{}/Npix{}.{}",
        trimmed(root),
        order,
        dir_index(ipix),
        ipix,
        ext
    )
}

pub fn allsky_url(root: &str, ext: &str) -> String {
    format!("{}/Norder3/Allsky.{}", trimmed(root), ext)
}

pub fn properties_url(root: &str) -> String {
    format!("{}/properties", trimmed(root))
}
