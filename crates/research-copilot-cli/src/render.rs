//! Terminal output for the views.

use research_copilot_core::view::AnalysisState;
use research_copilot_core::{
    AnalysisView, DocumentRecord, FileMetadata, LanguageOption, LoadState, QaView, Role,
    TranscriptEntry, TranslateView, UploadView,
};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

#[allow(clippy::print_stdout)]
pub fn file_list(files: &[DocumentRecord]) {
    if files.is_empty() {
        println!("No documents uploaded yet.");
        return;
    }

    let width = files.iter().map(|r| r.id.as_str().len()).max().unwrap_or(0);
    for record in files {
        println!(
            "{:<width$}  {}  {}",
            record.id.as_str(),
            record.uploaded_at.format(DATE_FORMAT),
            record.filename,
        );
    }
}

pub fn upload_view(view: &UploadView) {
    if let Some(message) = view.error() {
        error(message);
    }
    file_list(view.files());
}

#[allow(clippy::print_stdout)]
pub fn uploaded(record: &DocumentRecord) {
    println!("Uploaded {} as {}", record.filename, record.id);
    println!("  copilot analyze {}", record.id);
    println!("  copilot ask {}", record.id);
    println!("  copilot translate {} --lang es", record.id);
}

/// Filename and upload date, or whatever went wrong resolving them
#[allow(clippy::print_stdout)]
pub fn metadata(metadata: &LoadState<FileMetadata>) {
    match metadata {
        LoadState::Loaded(meta) => {
            println!("{} (uploaded {})", meta.filename, meta.uploaded_at.format(DATE_FORMAT));
        }
        LoadState::Failed(message) => error(message),
        LoadState::Idle | LoadState::Loading => {}
    }
}

#[allow(clippy::print_stdout)]
pub fn analysis(view: &AnalysisView) {
    metadata(view.metadata());

    if let AnalysisState::Translated { translation, .. } = view.state() {
        let name = view
            .languages()
            .iter()
            .find(|opt| opt.code == translation.lang.as_str())
            .map_or(translation.lang.as_str(), |opt| opt.name);
        println!("[Translated to {name}]");
    }

    println!();
    for paragraph in view.paragraphs() {
        println!("{paragraph}");
        println!();
    }

    if let Some(message) = view.error() {
        error(message);
    }
}

#[allow(clippy::print_stdout)]
pub fn transcript_entry(entry: &TranscriptEntry) {
    match entry.role {
        Role::User => println!("You: {}", entry.text),
        Role::Assistant => {
            println!("{}", entry.text);
            if !entry.sources.is_empty() {
                println!("Sources: {}", entry.sources.join("; "));
            }
        }
    }
}

#[allow(clippy::print_stdout)]
pub fn qa_view(view: &QaView) {
    metadata(view.metadata());
    if view.transcript().is_empty() {
        println!("Ask a question with: copilot ask {} \"...\"", view.id());
    }
    for entry in view.transcript() {
        transcript_entry(entry);
    }
}

#[allow(clippy::print_stdout)]
pub fn translate_view(view: &TranslateView) {
    if let Some(filename) = view.filename() {
        println!("{filename}");
    }
    if let Some(message) = view.error() {
        error(message);
    }
    languages("Download languages", view.languages());
    println!("Download with: copilot translate {} --lang <CODE>", view.id());
}

#[allow(clippy::print_stdout)]
pub fn languages(title: &str, options: &[LanguageOption]) {
    println!("{title}:");
    for option in options {
        println!("  {}  {}", option.code, option.name);
    }
}

#[allow(clippy::print_stderr)]
pub fn error(message: &str) {
    eprintln!("Error: {message}");
}
