//! Stored names for uploaded images
//!
//! The stored name is the MD5 digest of the original file *name*, hex encoded,
//! followed by the original extension. Uploading the same name twice therefore
//! lands on the same stored file.

/// Extension of a file name, dot included, taken from the last path segment.
///
/// `"photo.tar.png"` gives `".png"`; a name without a dot gives `""`.
pub fn extension(name: &str) -> &str {
    let base_start = name.rfind(['/', '\\']).map(|i| i + 1).unwrap_or(0);
    let base = &name[base_start..];
    match base.rfind('.') {
        Some(i) => &base[i..],
        None => "",
    }
}

/// Deterministic stored name for an upload called `original`
pub fn stored_name(original: &str) -> String {
    format!("{:x}{}", md5::compute(original.as_bytes()), extension(original))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_extension() {
        assert_eq!(extension("cat.png"), ".png");
        assert_eq!(extension("archive.tar.jpeg"), ".jpeg");
        assert_eq!(extension("README"), "");
        assert_eq!(extension("dir.d/README"), "");
        assert_eq!(extension(".jpg"), ".jpg");
    }

    #[test]
    fn test_stored_name_known_digest() {
        assert_eq!(stored_name("cat.png"), "e58706c74d2bf10964d0196b85e4d485.png");
    }

    #[test]
    fn test_different_names_differ() {
        assert_ne!(stored_name("a.png"), stored_name("b.png"));
        assert_ne!(stored_name("a.png"), stored_name("a.jpg"));
    }

    proptest! {
        #[test]
        fn stored_name_is_deterministic(name in ".{0,64}") {
            prop_assert_eq!(stored_name(&name), stored_name(&name));
        }

        #[test]
        fn stored_name_keeps_extension(stem in "[a-zA-Z0-9_-]{1,20}", ext in "(png|jpg|jpeg|gif)") {
            let original = format!("{stem}.{ext}");
            let stored = stored_name(&original);
            let expected_ext = format!(".{}", ext);
            prop_assert!(stored.ends_with(&expected_ext));
            prop_assert_eq!(stored.len(), 32 + ext.len() + 1);
            prop_assert!(stored[..32].chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}
