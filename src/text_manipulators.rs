use scraper::ElementRef;

pub fn extract_text(node: ElementRef) -> String {
    node.text().collect::<String>()
}

/// Turn an href from the results page into an absolute page address.
pub fn resolve_href(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    if href.starts_with('/') {
        return format!("{}{}", site_origin(base_url), href);
    }
    format!("{}/{}", base_url.trim_end_matches('/'), href)
}

/// `scheme://host` of a URL, without the path.
fn site_origin(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.trim_end_matches('/').to_string();
    };
    match url[scheme_end + 3..].find('/') {
        Some(path_start) => url[..scheme_end + 3 + path_start].to_string(),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://unitn.coursecatalogue.cineca.it/cerca-insegnamenti";

    #[test]
    fn absolute_hrefs_pass_through() {
        assert_eq!(
            resolve_href(BASE, "https://x.test/insegnamenti/1"),
            "https://x.test/insegnamenti/1"
        );
    }

    #[test]
    fn rooted_hrefs_resolve_against_the_origin() {
        assert_eq!(
            resolve_href(BASE, "/insegnamenti/145101"),
            "https://unitn.coursecatalogue.cineca.it/insegnamenti/145101"
        );
    }

    #[test]
    fn relative_hrefs_resolve_against_the_search_page() {
        assert_eq!(
            resolve_href(BASE, "detail/145101"),
            format!("{BASE}/detail/145101")
        );
    }
}
