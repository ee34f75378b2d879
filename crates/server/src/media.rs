use reelvault_transfer::extension;

/// MIME type served for an artifact, chosen by extension.
pub fn content_type_for(name: &str) -> &'static str {
    let Some(ext) = extension(name) else {
        return "application/octet-stream";
    };
    match ext.to_ascii_lowercase().as_str() {
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "webm" => "video/webm",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions() {
        assert_eq!(content_type_for("a.mp4"), "video/mp4");
        assert_eq!(content_type_for("a.MOV"), "video/quicktime");
        assert_eq!(content_type_for("a_compressed.jpg"), "image/jpeg");
        assert_eq!(content_type_for("My_Report1.pdf"), "application/pdf");
    }

    #[test]
    fn unknown_falls_back() {
        assert_eq!(content_type_for("archive.tar.zst"), "application/octet-stream");
        assert_eq!(content_type_for("README"), "application/octet-stream");
    }
}
