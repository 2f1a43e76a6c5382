//! Static HTML pages.

use crate::health::aggregator::runtime_version;

const WELCOME_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>Welcome to LAMP Stack!</title>
<style>
    body { width: 35em; margin: 0 auto; padding-top: 50px; font-family: Tahoma, Verdana, Arial, sans-serif; background-color: #f0f0f0; color: #333; }
    .info { background-color: #fff; padding: 20px; border-radius: 5px; box-shadow: 0 2px 5px rgba(0,0,0,0.1); margin-top: 20px; }
    ul { list-style-type: none; padding: 0; }
    li { padding: 5px 0; border-bottom: 1px solid #eee; }
    .label { font-weight: bold; display: inline-block; width: 120px; }
</style>
</head>
<body>
    <h1>Welcome to LAMP Stack!</h1>
    <p>If you see this page, the LAMP stack is successfully installed and working.</p>
    <div class="info">
        <h2>Stack Information</h2>
        <ul>
            <li><span class="label">Web Server:</span> {server}</li>
            <li><span class="label">Platform:</span> {platform}</li>
        </ul>
    </div>
    <p><em>Thank you for using this docker stack.</em></p>
</body>
</html>
"#;

pub const NOT_FOUND_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>404 Not Found</title>
    <style>
        body { background-color: #f0f2f5; color: #333; font-family: 'Roboto', Arial, sans-serif; display: flex; flex-direction: column; align-items: center; justify-content: center; height: 100vh; margin: 0; }
        h1 { font-size: 6em; margin: 0; color: #715dbb; }
        h2 { font-size: 2em; margin: 10px 0; }
        p { font-size: 1.2em; color: #666; }
        a { margin-top: 20px; padding: 10px 20px; background-color: #715dbb; color: white; text-decoration: none; border-radius: 5px; }
    </style>
</head>
<body>
    <h1>404</h1>
    <h2>Page Not Found</h2>
    <p>The page you are looking for might have been removed, had its name changed, or is temporarily unavailable.</p>
    <a href="/">Go to Homepage</a>
</body>
</html>
"#;

/// `os/arch` of the running binary.
pub fn platform() -> String {
    format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH)
}

pub fn welcome_page() -> String {
    WELCOME_TEMPLATE
        .replace("{server}", &runtime_version())
        .replace("{platform}", &platform())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_page_fills_placeholders() {
        let page = welcome_page();
        assert!(page.contains("Welcome to LAMP Stack!"));
        assert!(page.contains(&runtime_version()));
        assert!(!page.contains("{server}"));
        assert!(!page.contains("{platform}"));
    }

    #[test]
    fn test_not_found_page() {
        assert!(NOT_FOUND_PAGE.contains("Page Not Found"));
    }
}
