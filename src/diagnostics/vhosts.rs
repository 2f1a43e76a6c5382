//! Apache virtual host discovery.

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;

/// Catch-all vhost shipped with the image; never listed.
const DEFAULT_VHOST: &str = "default.conf";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualHost {
    pub domain: String,
    /// `DocumentRoot` inside the container.
    pub path: String,
}

impl VirtualHost {
    /// `path` with the applications prefix removed, for display.
    pub fn display_path(&self, document_root: &str, applications_dir: &str) -> String {
        let prefix = format!("{}/{}/", document_root.trim_end_matches('/'), applications_dir);
        self.path.replacen(&prefix, "", 1)
    }

    /// `path` as seen from the host checkout.
    pub fn local_path(&self, document_root: &str, local_document_root: &str) -> String {
        self.path.replacen(document_root.trim_end_matches('/'), local_document_root, 1)
    }
}

/// First value of `directive` (case-insensitive) in an Apache config.
fn directive_value<'a>(content: &'a str, directive: &str) -> Option<&'a str> {
    let mut tokens = content.split_whitespace();
    while let Some(token) = tokens.next() {
        if token.eq_ignore_ascii_case(directive) {
            let value = tokens.next()?.split(';').next()?;
            return Some(value);
        }
    }
    None
}

/// Parse one vhost file; `None` when `ServerName` or `DocumentRoot` is missing.
pub fn parse_vhost(content: &str) -> Option<VirtualHost> {
    let domain = directive_value(content, "ServerName").filter(|d| !d.is_empty())?;
    let path = directive_value(content, "DocumentRoot")?.trim_matches(|c| c == '"' || c == '\'');
    if path.is_empty() {
        return None;
    }
    Some(VirtualHost {
        domain: domain.to_string(),
        path: path.to_string(),
    })
}

/// Every usable `*.conf` vhost in `dir`, sorted by file name.
///
/// A missing directory yields an empty list. Does blocking filesystem reads.
pub fn discover(dir: &Path) -> io::Result<Vec<VirtualHost>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "conf"))
        .filter(|path| path.file_name().is_some_and(|name| name != DEFAULT_VHOST))
        .collect();
    files.sort();

    let mut hosts = Vec::new();
    for file in files {
        match fs::read_to_string(&file) {
            Ok(content) => hosts.extend(parse_vhost(&content)),
            Err(e) => tracing::debug!(file = %file.display(), error = %e, "Skipping unreadable vhost"),
        }
    }
    Ok(hosts)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VHOST: &str = r#"<VirtualHost *:443>
    servername shop.localhost
    DocumentRoot "/var/www/html/applications/shop/public"
    SSLEngine on
</VirtualHost>
"#;

    #[test]
    fn test_parse_vhost() {
        let host = parse_vhost(VHOST).unwrap();
        assert_eq!(host.domain, "shop.localhost");
        assert_eq!(host.path, "/var/www/html/applications/shop/public");
    }

    #[test]
    fn test_incomplete_vhost_skipped() {
        assert!(parse_vhost("<VirtualHost *:80>\nServerName a.localhost\n</VirtualHost>").is_none());
        assert!(parse_vhost("DocumentRoot /var/www/html").is_none());
    }

    #[test]
    fn test_semicolon_terminates_value() {
        let host = parse_vhost("ServerName api.localhost; DocumentRoot /srv/api;").unwrap();
        assert_eq!(host.domain, "api.localhost");
        assert_eq!(host.path, "/srv/api");
    }

    #[test]
    fn test_paths_for_display() {
        let host = parse_vhost(VHOST).unwrap();
        assert_eq!(host.display_path("/var/www/html", "applications"), "shop/public");
        assert_eq!(
            host.local_path("/var/www/html", "./www"),
            "./www/applications/shop/public"
        );
    }

    #[test]
    fn test_discover_skips_default_and_non_conf() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.conf"), VHOST).unwrap();
        fs::write(dir.path().join("shop.conf"), VHOST).unwrap();
        fs::write(dir.path().join("notes.txt"), VHOST).unwrap();
        fs::write(dir.path().join("broken.conf"), "ServerName x.localhost").unwrap();

        let hosts = discover(dir.path()).unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].domain, "shop.localhost");
    }

    #[test]
    fn test_discover_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(&dir.path().join("absent")).unwrap().is_empty());
    }
}
