use std::path::Path;

/// Image formats accepted for icons and screenshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Png,
    Jpeg,
}
impl ImageKind {
    /// Detect the image format from a file extension (case-insensitive).
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "png" => Some(ImageKind::Png),
                "jpg" => Some(ImageKind::Jpeg),
                _ => None,
            })
    }

    #[inline]
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Png => ".png",
            ImageKind::Jpeg => ".jpg",
        }
    }
}

/// Whether a file would be picked up as a controller screenshot.
pub fn is_screenshot_image(path: impl AsRef<Path>) -> bool {
    ImageKind::from_path(path).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("shot.png", Some(ImageKind::Png))]
    #[case("shot.PNG", Some(ImageKind::Png))]
    #[case("dir/shot.jpg", Some(ImageKind::Jpeg))]
    #[case("shot.JpG", Some(ImageKind::Jpeg))]
    #[case("shot.jpeg", None)]
    #[case("shot.gif", None)]
    #[case("png", None)]
    #[case("notes.txt", None)]
    fn test_from_path(#[case] path: &str, #[case] expected: Option<ImageKind>) {
        assert_eq!(ImageKind::from_path(path), expected);
        assert_eq!(is_screenshot_image(path), expected.is_some());
    }
}
