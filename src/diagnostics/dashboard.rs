//! `/dashboard` document.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::config::{StackConfig, StackLayoutConfig};
use crate::diagnostics::{database_status, pages, vhosts};
use crate::health::aggregator::runtime_version;
use crate::health::HealthAggregator;
use crate::not_found::NotFoundLog;

/// How many not-found URIs the dashboard lists.
pub const TOP_NOT_FOUND: usize = 10;

/// Directory name served as static assets, never a project.
const ASSETS_DIR: &str = "assets";

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub server_software: String,
    pub platform: String,
    pub database: String,
    pub quick_links: Vec<QuickLink>,
    pub virtual_hosts: Vec<VirtualHostView>,
    pub projects: Vec<Project>,
    pub top_not_found: Vec<NotFoundView>,
}

#[derive(Debug, Serialize)]
pub struct QuickLink {
    pub name: &'static str,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct VirtualHostView {
    pub domain: String,
    pub url: String,
    pub display_path: String,
    pub path: String,
    pub local_path: String,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Project {
    pub name: String,
    pub subdirectories: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NotFoundView {
    pub uri: String,
    pub count: u64,
}

/// Virtual hosts and project directories found on disk.
#[derive(Debug, Default)]
pub struct StackLayout {
    pub virtual_hosts: Vec<VirtualHostView>,
    pub projects: Vec<Project>,
}

/// Assemble the dashboard; probes the database once.
pub async fn build_dashboard(
    config: &StackConfig,
    aggregator: &HealthAggregator,
    not_found: &NotFoundLog,
) -> Dashboard {
    let database = async {
        if !config.database.enabled {
            return "MySQL connection disabled".to_string();
        }
        match database_status(aggregator).await {
            Ok(version) => format!("MySQL Server {}", version),
            Err(reason) => format!("MySQL connection failed: {}", reason),
        }
    };

    let (database, layout) = tokio::join!(database, load_layout(config.stack.clone()));

    let top_not_found = not_found
        .top_uris(TOP_NOT_FOUND)
        .into_iter()
        .map(|(uri, count)| NotFoundView { uri, count })
        .collect();

    Dashboard {
        server_software: runtime_version(),
        platform: pages::platform(),
        database,
        quick_links: quick_links(config),
        virtual_hosts: layout.virtual_hosts,
        projects: layout.projects,
        top_not_found,
    }
}

/// Run [`scan_layout`] on the blocking pool.
async fn load_layout(stack: StackLayoutConfig) -> StackLayout {
    match tokio::task::spawn_blocking(move || scan_layout(&stack)).await {
        Ok(layout) => layout,
        Err(e) => {
            tracing::error!(error = %e, "Stack layout scan did not complete");
            StackLayout::default()
        }
    }
}

/// Read vhost files and project directories. Blocking.
pub fn scan_layout(stack: &StackLayoutConfig) -> StackLayout {
    let virtual_hosts = match vhosts::discover(Path::new(&stack.vhost_dir)) {
        Ok(hosts) => hosts
            .into_iter()
            .map(|host| VirtualHostView {
                url: format!("https://{}", host.domain),
                display_path: host.display_path(&stack.document_root, &stack.applications_dir),
                local_path: host.local_path(&stack.document_root, &stack.local_document_root),
                domain: host.domain,
                path: host.path,
            })
            .collect(),
        Err(e) => {
            tracing::warn!(dir = %stack.vhost_dir, error = %e, "Cannot read vhost directory");
            Vec::new()
        }
    };

    let document_root = Path::new(&stack.document_root);
    let projects = list_subdirs(document_root, &stack.applications_dir)
        .into_iter()
        .map(|name| Project {
            subdirectories: list_subdirs(&document_root.join(&name), &stack.applications_dir),
            name,
        })
        .collect();

    StackLayout { virtual_hosts, projects }
}

fn quick_links(config: &StackConfig) -> Vec<QuickLink> {
    vec![
        QuickLink {
            name: "phpMyAdmin",
            url: format!("http://localhost:{}", config.stack.pma_port),
        },
        QuickLink { name: "Test DB Connection", url: "/test-db".to_string() },
        QuickLink { name: "Check 404 Error", url: "/nonexistent-page-test".to_string() },
        QuickLink {
            name: "Mailpit",
            url: format!("http://localhost:{}", config.stack.mailpit_port),
        },
    ]
}

/// Sorted subdirectory names of `dir`, without hidden, asset and
/// applications directories. Unreadable directories list nothing.
pub fn list_subdirs(dir: &Path, applications_dir: &str) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !name.starts_with('.') && name != ASSETS_DIR && name != applications_dir)
        .collect();
    names.sort();
    names
}
