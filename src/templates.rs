use rust_embed::RustEmbed;

use crate::error::{Error, Result};

#[derive(RustEmbed)]
#[folder = "templates"]
struct Templates;

pub fn get_bytes(path: &str) -> Result<Vec<u8>> {
    let file = Templates::get(path)
        .ok_or_else(|| Error::Template(format!("embedded template `{}` missing", path)))?;
    Ok(file.data.as_ref().to_vec())
}

pub fn get_string(path: &str) -> Result<String> {
    let bytes = get_bytes(path)?;
    String::from_utf8(bytes)
        .map_err(|err| Error::Template(format!("decoding embedded template `{}`: {}", path, err)))
}
