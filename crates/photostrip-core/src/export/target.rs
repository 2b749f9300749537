//! Hand-off of finished artifacts to the platform: download names, share
//! planning and printing.

use serde::{Deserialize, Serialize};

use super::{ExportError, PrintPage};

/// What kind of artifact is being handed off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "ordinal", rename_all = "camelCase")]
pub enum ArtifactKind {
    /// A single session photo, by ordinal
    Photo(usize),
    Strip,
    Loop,
}

/// Suggested filename for a download.
///
/// Photos are numbered from 1 for people.
pub fn download_name(kind: ArtifactKind) -> String {
    match kind {
        ArtifactKind::Photo(ordinal) => format!("photo_{}.png", ordinal + 1),
        ArtifactKind::Strip => "photostrip.png".to_string(),
        ArtifactKind::Loop => "photobooth.gif".to_string(),
    }
}

/// What the platform share facility can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShareCapabilities {
    /// Native share sheet exists
    pub can_share: bool,
    /// Native share sheet accepts files
    pub can_share_files: bool,
    pub can_write_clipboard: bool,
}

/// Where the artifact lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "url", rename_all = "camelCase")]
pub enum ArtifactLocation {
    /// Only in local memory
    Local,
    /// Uploaded and reachable at a URL
    Remote(String),
}

/// How a share request should be carried out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "url", rename_all = "camelCase")]
pub enum ShareAction {
    ShareFile,
    ShareUrl(String),
    CopyUrl(String),
    Unsupported,
}

/// Pick the best available share path.
///
/// Remote artifacts prefer the share sheet, then the clipboard. Local data
/// can only go through a file-capable share sheet.
pub fn plan_share(capabilities: ShareCapabilities, location: &ArtifactLocation) -> ShareAction {
    match location {
        ArtifactLocation::Remote(url) if capabilities.can_share => ShareAction::ShareUrl(url.clone()),
        ArtifactLocation::Remote(url) if capabilities.can_write_clipboard => {
            ShareAction::CopyUrl(url.clone())
        }
        ArtifactLocation::Local if capabilities.can_share && capabilities.can_share_files => {
            ShareAction::ShareFile
        }
        _ => ShareAction::Unsupported,
    }
}

/// Platform print facility.
pub trait PrintTarget {
    /// Print one rendered page at its physical size.
    fn print(&self, page: &PrintPage) -> Result<(), ExportError>;
}
