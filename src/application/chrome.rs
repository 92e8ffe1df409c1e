use crate::config::SiteSettings;
use crate::presentation::views::{
    BrandView, FooterView, LayoutChrome, NavigationLinkView, NavigationView, PageMetaView,
};

/// Site identity shared by every page.
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    pub site_name: String,
    pub base_url: String,
    pub description: String,
    pub og_image: String,
    pub footer_copy: String,
}

impl From<&SiteSettings> for ChromeOptions {
    fn from(site: &SiteSettings) -> Self {
        Self {
            site_name: site.name.clone(),
            base_url: site.base_url.clone(),
            description: site.description.clone(),
            og_image: site.og_image.clone(),
            footer_copy: site.footer_copy.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ChromeService {
    chrome: LayoutChrome,
}

impl ChromeService {
    pub fn new(options: &ChromeOptions) -> Self {
        let base = options.base_url.trim_end_matches('/');
        let og_image = if options.og_image.starts_with("http") {
            options.og_image.clone()
        } else {
            format!("{base}/{}", options.og_image.trim_start_matches('/'))
        };

        let chrome = LayoutChrome {
            brand: BrandView {
                title: options.site_name.clone(),
                href: "/".to_string(),
            },
            navigation: NavigationView {
                entries: vec![
                    NavigationLinkView {
                        label: "Home".to_string(),
                        href: "/".to_string(),
                        is_active: false,
                    },
                    NavigationLinkView {
                        label: "Archive".to_string(),
                        href: "/archive".to_string(),
                        is_active: false,
                    },
                ],
            },
            footer: FooterView {
                copy: options.footer_copy.clone(),
            },
            meta: PageMetaView {
                title: options.site_name.clone(),
                description: options.description.clone(),
                og_title: options.site_name.clone(),
                og_description: options.description.clone(),
                og_image,
                canonical: format!("{base}/"),
            },
        };

        Self { chrome }
    }

    pub fn load(&self) -> LayoutChrome {
        self.chrome.clone()
    }
}
