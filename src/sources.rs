use anyhow::Result;

use crate::config::Config;

/// Print the availability of each capability provider.
pub fn list_sources(config: &Config) -> Result<()> {
    let kb_status = match &config.knowledge_base.endpoint {
        Some(endpoint) => (format!("OK ({})", endpoint), true),
        None => ("NOT CONFIGURED".to_string(), false),
    };
    let github_status = match &config.github.token {
        Some(_) => ("OK (token set)".to_string(), true),
        None => ("NOT CONFIGURED (GITHUB_TOKEN unset)".to_string(), false),
    };
    let web_status = match (&config.web_search.endpoint, &config.web_search.api_key) {
        (Some(endpoint), Some(_)) => (format!("OK ({})", endpoint), true),
        (Some(_), None) => ("NOT CONFIGURED (WEB_SEARCH_API_KEY unset)".to_string(), false),
        _ => ("NOT CONFIGURED".to_string(), false),
    };

    println!("{:<16} {:<48} AVAILABLE", "PROVIDER", "STATUS");
    println!("{:<16} {:<48} {}", "knowledge_base", kb_status.0, kb_status.1);
    println!("{:<16} {:<48} {}", "github", github_status.0, github_status.1);
    println!("{:<16} {:<48} {}", "web_search", web_status.0, web_status.1);

    Ok(())
}
