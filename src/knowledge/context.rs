use super::store::DocumentStore;
use std::fs;

/// Concatenate every document as `--- {name} ---\n{content}`, in name order,
/// separated by blank lines.
///
/// Rebuilt on every call. Files that cannot be read are skipped, as is a
/// store directory that has gone missing.
pub fn build_context(store: &DocumentStore) -> String {
    let entries = match store.sorted_entries() {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "knowledge directory unreadable; using empty context");
            return String::new();
        }
    };

    let mut sections = Vec::with_capacity(entries.len());
    for (name, path) in entries {
        match fs::read(&path) {
            Ok(bytes) => {
                let content = String::from_utf8_lossy(&bytes);
                sections.push(format!("--- {name} ---\n{content}"));
            }
            Err(e) => {
                tracing::debug!(document = %name, error = %e, "skipping unreadable document");
            }
        }
    }

    sections.join("\n\n")
}
