use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::error::DocumentError;

/// Recursively finds `.graphql` files under the configured directories.
/// Hidden files and directories are skipped; results are sorted so the corpus
/// order never depends on filesystem iteration order.
pub struct DocumentScanner<'a> {
    directories: &'a [PathBuf],
}

impl<'a> DocumentScanner<'a> {
    pub fn new(directories: &'a [PathBuf]) -> Self {
        Self { directories }
    }

    pub fn scan(&self) -> Result<Vec<PathBuf>, DocumentError> {
        let mut paths = Vec::new();
        for directory in self.directories {
            for entry in WalkDir::new(directory)
                .into_iter()
                .filter_entry(|e| !is_hidden(e.path()))
            {
                let entry = entry.map_err(|err| DocumentError::Io {
                    path: directory.clone(),
                    source: err.into(),
                })?;
                if entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|ext| ext == "graphql")
                {
                    paths.push(entry.into_path());
                }
            }
        }
        paths.sort();
        Ok(paths)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_paths_are_detected() {
        assert!(is_hidden(Path::new("queries/.hidden.graphql")));
        assert!(is_hidden(Path::new(".git")));
        assert!(!is_hidden(Path::new("queries/hero.graphql")));
    }

    #[test]
    fn scan_finds_sorted_graphql_files() {
        let dir = std::env::temp_dir().join(format!("typegen-scan-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("b.graphql"), "{ hero { id } }").unwrap();
        std::fs::write(dir.join("nested/a.graphql"), "{ hero { name } }").unwrap();
        std::fs::write(dir.join("notes.txt"), "not a document").unwrap();
        std::fs::write(dir.join(".skipped.graphql"), "{ hero { id } }").unwrap();

        let dirs = vec![dir.clone()];
        let paths = DocumentScanner::new(&dirs).scan().unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.strip_prefix(&dir).unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["b.graphql", "nested/a.graphql"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
