//! MIME-type tables used by the file icon.

/// Broad family of a MIME type, used to pick icon color and description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFamily {
    Image,
    Video,
    Audio,
    Pdf,
    Text,
    Json,
    Archive,
    Other,
}

impl FileFamily {
    /// Classify a MIME type. Checks run in a fixed order, first match wins.
    pub fn of(mime_type: &str) -> Self {
        if mime_type.starts_with("image/") {
            FileFamily::Image
        } else if mime_type.starts_with("video/") {
            FileFamily::Video
        } else if mime_type.starts_with("audio/") {
            FileFamily::Audio
        } else if mime_type.contains("pdf") {
            FileFamily::Pdf
        } else if mime_type.contains("text/") {
            FileFamily::Text
        } else if mime_type.contains("json") {
            FileFamily::Json
        } else if mime_type.contains("zip") || mime_type.contains("rar") {
            FileFamily::Archive
        } else {
            FileFamily::Other
        }
    }

    /// Icon color as RGB.
    pub fn color(self) -> [u8; 3] {
        match self {
            FileFamily::Image => hex(0x10b981),
            FileFamily::Video => hex(0x3b82f6),
            FileFamily::Audio => hex(0x8b5cf6),
            FileFamily::Pdf => hex(0xef4444),
            FileFamily::Text | FileFamily::Json => hex(0xf59e0b),
            FileFamily::Archive => hex(0x6366f1),
            FileFamily::Other => hex(0x64748b),
        }
    }

    /// Short human-readable description.
    pub fn description(self) -> &'static str {
        match self {
            FileFamily::Image => "Image File",
            FileFamily::Video => "Video File",
            FileFamily::Audio => "Audio File",
            FileFamily::Pdf => "PDF Document",
            FileFamily::Text => "Text File",
            FileFamily::Json => "JSON Data",
            FileFamily::Archive => "Archive",
            FileFamily::Other => "File",
        }
    }
}

/// File extension for a MIME type, `"file"` when unknown.
pub fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "audio/mp3" => "mp3",
        "audio/wav" => "wav",
        "application/pdf" => "pdf",
        "text/plain" => "txt",
        "application/json" => "json",
        "application/zip" => "zip",
        _ => "file",
    }
}

/// Shift every channel by `percent` of full scale, clamped to 0..=255.
pub fn adjust_brightness(rgb: [u8; 3], percent: i32) -> [u8; 3] {
    let amount = (2.55 * percent as f32).round() as i32;
    rgb.map(|c| (c as i32 + amount).clamp(0, 255) as u8)
}

const fn hex(value: u32) -> [u8; 3] {
    [(value >> 16) as u8, (value >> 8) as u8, value as u8]
}
