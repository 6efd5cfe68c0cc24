//! Photo file to `data:` URL conversion.

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

fn mime_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(mime)
}

/// Reads an image file and encodes it as a base64 `data:` URL.
pub fn read_data_url(path: &Path) -> Result<String> {
    let Some(mime) = mime_for(path) else {
        bail!("unsupported image type `{}`", path.display());
    };
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read `{}`", path.display()))?;
    if bytes.is_empty() {
        bail!("image file `{}` is empty", path.display());
    }
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}
