use serde::Serialize;

/// Offline helper script offered for download next to the extractor.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScriptInfo {
    pub file_name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub install: &'static str,
    pub usage: &'static [&'static str],
}

pub const SCRIPT_CATALOG: &[ScriptInfo] = &[
    ScriptInfo {
        file_name: "pdf_cropper.py",
        title: "PDF Cropper",
        description: "Crops only the needed parts of a PDF, removing unwanted areas which could degrade the quality of PDF scraping.",
        install: "pip install pymupdf opencv-python numpy",
        usage: &[
            "Run the script from your terminal (python pdf_cropper.py).",
            "Select the PDF file you want to crop in the popup window.",
            "Draw a rectangle around the area to keep on the preview; markings appear after the selection.",
            "Press Enter to confirm the selection.",
            "The cropped PDF is saved in the same folder as the script.",
        ],
    },
    ScriptInfo {
        file_name: "pdf_cutter.py",
        title: "PDF Cutter",
        description: "Splits a large PDF into smaller PDF files with a custom number of pages each, for documents that exceed processing limits or take too long.",
        install: "pip install PyPDF2",
        usage: &[
            "Run the script from your terminal (python pdf_cutter.py).",
            "Select the PDF file you want to split in the popup window.",
            "Enter the number of pages per output file.",
            "The parts are saved as 1.pdf, 2.pdf, ... in the current folder.",
        ],
    },
];

pub fn find_script(file_name: &str) -> Option<&'static ScriptInfo> {
    SCRIPT_CATALOG
        .iter()
        .find(|script| script.file_name == file_name)
}
