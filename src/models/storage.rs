// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

/// Top-level prefix under which an uploaded object is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFolder {
    /// Rendered viewport captures of link targets
    Screenshots,
}

impl StorageFolder {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageFolder::Screenshots => "screenshots",
        }
    }
}

impl std::fmt::Display for StorageFolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extension used for the stored object, taken from the uploaded filename.
/// Falls back to `jpg` when the name has no usable extension.
pub fn file_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && !ext.contains('/') => ext,
        _ => "jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_name() {
        assert_eq!(StorageFolder::Screenshots.as_str(), "screenshots");
        assert_eq!(StorageFolder::Screenshots.to_string(), "screenshots");
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("screenshot.jpg"), "jpg");
        assert_eq!(file_extension("avatar.final.png"), "png");
        assert_eq!(file_extension("noext"), "jpg");
        assert_eq!(file_extension("trailing."), "jpg");
    }
}
