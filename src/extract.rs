use crate::response::AppError;

/// Pull plain text out of an uploaded document. Plain-text formats pass
/// through after a UTF-8 check; binary document formats are out of scope
/// and rejected with a clear message instead of producing garbage quizzes.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, AppError> {
    let extension = filename
        .rsplit('.')
        .next()
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "md" | "markdown" => {
            let text = std::str::from_utf8(bytes)
                .map_err(|_| AppError::validation("File is not valid UTF-8 text"))?;
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(AppError::validation("File contains no text"));
            }
            Ok(trimmed.to_string())
        }
        "pdf" | "doc" | "docx" | "ppt" | "pptx" => Err(AppError::validation(
            "Binary document formats are not supported; upload .txt or .md",
        )),
        _ => Err(AppError::validation(
            "Unsupported file type; upload .txt or .md",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through_trimmed() {
        let text = extract_text("notes.txt", b"  Cells are small.  \n").unwrap();
        assert_eq!(text, "Cells are small.");
    }

    #[test]
    fn markdown_is_accepted() {
        assert!(extract_text("notes.md", b"# Biology\nCells.").is_ok());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert!(extract_text("notes.txt", &[0xff, 0xfe, 0x00]).is_err());
    }

    #[test]
    fn empty_file_is_rejected() {
        assert!(extract_text("notes.txt", b"   \n ").is_err());
    }

    #[test]
    fn binary_formats_are_rejected_with_validation_error() {
        let err = extract_text("slides.pdf", b"%PDF-1.4").unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(extract_text("archive.zip", b"PK").is_err());
    }
}
