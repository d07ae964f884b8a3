//! Shader source files

use std::path::Path;

use crate::assets::AssetError;

/// Read a GLSL source file into a string
pub fn load_shader_source(path: impl AsRef<Path>) -> Result<String, AssetError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AssetError::NotFound(path.display().to_string()));
    }

    let source = std::fs::read_to_string(path)?;
    log::debug!("Read shader source {:?} ({} bytes)", path, source.len());
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_not_found() {
        let result = load_shader_source("does/not/exist.vert");
        assert!(matches!(result, Err(AssetError::NotFound(_))));
    }

    #[test]
    fn test_reads_source_text() {
        let path = std::env::temp_dir().join(format!("scene_engine_shader_{}.frag", std::process::id()));
        std::fs::write(&path, "#version 410 core\nvoid main() {}\n").expect("write temp shader");

        let source = load_shader_source(&path).expect("source should load");
        let _ = std::fs::remove_file(&path);

        assert!(source.starts_with("#version 410 core"));
    }
}
