use crate::error::HostError;
use flate2::read::GzDecoder;
use std::io::Read;
use tar::Archive;

/// Lists the file paths inside a repository tarball, with the synthetic
/// top-level folder stripped so paths match the contents API.
pub fn archive_file_paths(bytes: &[u8]) -> Result<Vec<String>, HostError> {
    let mut archive = Archive::new(GzDecoder::new(bytes));
    let mut paths = Vec::new();

    let entries = archive
        .entries()
        .map_err(|e| HostError::InvalidResponse(e.to_string()))?;
    for entry in entries {
        let entry = entry.map_err(|e| HostError::InvalidResponse(e.to_string()))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry
            .path()
            .map_err(|e| HostError::InvalidResponse(e.to_string()))?;
        let stripped: String = path
            .to_string_lossy()
            .split('/')
            .skip(1)
            .collect::<Vec<_>>()
            .join("/");
        if !stripped.is_empty() {
            paths.push(stripped);
        }
    }

    Ok(paths)
}

/// Reads one file out of a repository tarball.
pub fn archive_file_content(bytes: &[u8], wanted: &str) -> Result<Option<Vec<u8>>, HostError> {
    let mut archive = Archive::new(GzDecoder::new(bytes));

    let entries = archive
        .entries()
        .map_err(|e| HostError::InvalidResponse(e.to_string()))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| HostError::InvalidResponse(e.to_string()))?;
        let path = entry
            .path()
            .map_err(|e| HostError::InvalidResponse(e.to_string()))?;
        let stripped: String = path
            .to_string_lossy()
            .split('/')
            .skip(1)
            .collect::<Vec<_>>()
            .join("/");

        if stripped == wanted {
            let mut content = Vec::new();
            entry
                .read_to_end(&mut content)
                .map_err(|e| HostError::InvalidResponse(e.to_string()))?;
            return Ok(Some(content));
        }
    }

    Ok(None)
}
