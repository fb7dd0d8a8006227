pub mod context;
pub mod sanitize;
pub mod store;

pub use context::build_context;
pub use sanitize::{extension_of, sanitize_filename};
pub use store::{DocumentInfo, DocumentStore, UploadedFile};

/// Extensions accepted by the upload endpoint. The store itself takes any text.
pub const ALLOWED_EXTENSIONS: [&str; 11] = [
    "txt", "md", "csv", "json", "html", "xml", "yml", "yaml", "log", "docx", "pdf",
];

pub fn is_allowed_upload(name: &str) -> bool {
    extension_of(name).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_upload_checks_extension_case_insensitively() {
        assert!(is_allowed_upload("faq.md"));
        assert!(is_allowed_upload("Report.PDF"));
        assert!(!is_allowed_upload("payload.exe"));
        assert!(!is_allowed_upload("Makefile"));
    }
}
