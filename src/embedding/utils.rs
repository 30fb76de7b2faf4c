use std::io;
use std::path::Path;
use tokenizers::Tokenizer;

/// Loads a tokenizer from a model directory or explicit `tokenizer.json` path.
pub fn load_tokenizer(model_path: &Path) -> io::Result<Tokenizer> {
    let tokenizer_path = if model_path
        .file_name()
        .is_some_and(|name| name == std::ffi::OsStr::new("tokenizer.json"))
    {
        model_path.to_path_buf()
    } else if model_path.is_dir() {
        model_path.join("tokenizer.json")
    } else {
        model_path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Model path has no parent"))?
            .join("tokenizer.json")
    };

    Tokenizer::from_file(&tokenizer_path).map_err(io::Error::other)
}

/// Loads a tokenizer with truncation and padding disabled.
///
/// Sentence-transformer exports usually ship a `tokenizer.json` that truncates to the
/// model window; over-long queries must be reported, not clipped.
pub fn load_tokenizer_untruncated(model_path: &Path) -> io::Result<Tokenizer> {
    let mut tokenizer = load_tokenizer(model_path)?;
    tokenizer.with_padding(None);

    tokenizer
        .with_truncation(None)
        .map_err(|e| io::Error::other(format!("Failed to disable truncation: {}", e)))?;

    Ok(tokenizer)
}
