use std::path::Path;

use futures::future::{self, BoxFuture};
use futures::FutureExt;

/// What kind of image the caller wants for a location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKind {
    Icon,
    Thumbnail,
}

/// Resolves a displayable icon for a location key.
///
/// Lookups may be slow (image caches, thumbnail generation), so they are
/// asynchronous. `None` means no icon is available.
pub trait IconResolver: Send + Sync {
    fn resolve_icon_path<'a>(
        &'a self,
        kind: IconKind,
        location_key: &'a str,
        size: u32,
    ) -> BoxFuture<'a, Option<String>>;
}

/// Resolver that never finds an icon
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIcons;

impl IconResolver for NoIcons {
    fn resolve_icon_path<'a>(&'a self, _: IconKind, _: &'a str, _: u32) -> BoxFuture<'a, Option<String>> {
        future::ready(None).boxed()
    }
}

/// Maps locations to freedesktop icon names by file type
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionIconResolver;

impl IconResolver for ExtensionIconResolver {
    fn resolve_icon_path<'a>(
        &'a self,
        _kind: IconKind,
        location_key: &'a str,
        _size: u32,
    ) -> BoxFuture<'a, Option<String>> {
        async move {
            let path = Path::new(location_key);
            if location_key.starts_with("::") {
                return Some(icon_name(path, true).to_string());
            }
            let is_dir = tokio::fs::metadata(location_key)
                .await
                .map(|m| m.is_dir())
                .ok()?;
            Some(icon_name(path, is_dir).to_string())
        }
        .boxed()
    }
}

/// Icon name for a location key.
///
/// Drive roots and shell namespace items get their own icons, folders use the
/// folder icon, and files are grouped into a few broad types.
pub fn icon_name(path: &Path, is_dir: bool) -> &'static str {
    let key = path.to_string_lossy();
    if key.starts_with("::") {
        return "computer-symbolic";
    }
    if is_dir {
        return if path.parent().is_none() || key.trim_end_matches(['\\', '/']).ends_with(':') {
            "drive-harddisk-symbolic"
        } else {
            "folder-symbolic"
        };
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png" | "jpg" | "jpeg" | "gif" | "bmp" | "svg" | "webp") => "image-x-generic-symbolic",
        Some("mp4" | "mkv" | "mov" | "mp3" | "flac" | "wav") => "audio-video-generic-symbolic",
        Some("pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "odt") => "x-office-document-symbolic",
        Some("zip" | "7z" | "rar" | "tar" | "gz" | "iso") => "package-x-generic-symbolic",
        Some("exe" | "msi" | "bat" | "cmd" | "ps1" | "sh") => "application-x-executable-symbolic",
        Some("lnk" | "url") => "emblem-symbolic-link-symbolic",
        _ => "text-x-generic-symbolic",
    }
}
