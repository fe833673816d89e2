//! File and folder pickers through the XDG desktop portal

use std::path::PathBuf;

use ashpd::desktop::file_chooser::OpenFileRequest;

/// Ask for one or more files to send; empty when cancelled
pub async fn pick_files() -> Vec<PathBuf> {
    let request = OpenFileRequest::default()
        .title("Select files to send")
        .modal(true)
        .multiple(true);

    match request.send().await {
        Ok(request) => match request.response() {
            Ok(response) => {
                let files: Vec<PathBuf> = response
                    .uris()
                    .iter()
                    .filter_map(|uri| uri.to_file_path().ok())
                    .collect();
                tracing::info!("{} file(s) selected", files.len());
                files
            }
            Err(e) => {
                tracing::debug!("File picker closed without a selection: {}", e);
                Vec::new()
            }
        },
        Err(e) => {
            tracing::error!("Failed to open file picker: {}", e);
            Vec::new()
        }
    }
}

/// Ask for the directory received files are saved into
pub async fn pick_directory() -> Option<PathBuf> {
    let request = OpenFileRequest::default()
        .title("Select Save Directory")
        .modal(true)
        .directory(true)
        .multiple(false);

    match request.send().await {
        Ok(request) => match request.response() {
            Ok(response) => {
                let directory = response.uris().first()?.to_file_path().ok()?;
                tracing::info!("Directory selected: {}", directory.display());
                Some(directory)
            }
            Err(e) => {
                tracing::debug!("Directory picker closed without a selection: {}", e);
                None
            }
        },
        Err(e) => {
            tracing::error!("Failed to open directory picker: {}", e);
            None
        }
    }
}
