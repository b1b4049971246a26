//! Product image backends, chosen once at startup.

use std::sync::Arc;

use crate::config::ImageBackend;

pub trait ImageStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Public URL for a stored image reference.
    fn url_for(&self, reference: &str) -> String;
}

pub struct LocalImageStore {
    media_url: String,
}

impl LocalImageStore {
    pub fn new(media_url: impl Into<String>) -> Self {
        let mut media_url = media_url.into();
        if !media_url.ends_with('/') {
            media_url.push('/');
        }
        Self { media_url }
    }
}

impl ImageStore for LocalImageStore {
    fn name(&self) -> &'static str {
        "local"
    }

    fn url_for(&self, reference: &str) -> String {
        if is_absolute(reference) {
            return reference.to_string();
        }
        format!("{}{}", self.media_url, reference.trim_start_matches('/'))
    }
}

pub struct CloudinaryImageStore {
    cloud_name: String,
    folder: String,
}

impl CloudinaryImageStore {
    /// Square crop served in the best format and quality for the client.
    const TRANSFORMATION: &'static str = "c_fill,f_auto,h_600,q_auto,w_600";

    pub fn new(cloud_name: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            folder: folder.into().trim_matches('/').to_string(),
        }
    }

    fn public_id(&self, reference: &str) -> String {
        let reference = reference.trim_start_matches('/');
        if self.folder.is_empty() || reference.starts_with(&format!("{}/", self.folder)) {
            reference.to_string()
        } else {
            format!("{}/{}", self.folder, reference)
        }
    }
}

impl ImageStore for CloudinaryImageStore {
    fn name(&self) -> &'static str {
        "cloudinary"
    }

    fn url_for(&self, reference: &str) -> String {
        if is_absolute(reference) {
            return reference.to_string();
        }
        format!(
            "https://res.cloudinary.com/{}/image/upload/{}/{}",
            self.cloud_name,
            Self::TRANSFORMATION,
            self.public_id(reference)
        )
    }
}

pub fn image_store(backend: &ImageBackend) -> Arc<dyn ImageStore> {
    match backend {
        ImageBackend::Local { media_url } => Arc::new(LocalImageStore::new(media_url.clone())),
        ImageBackend::Cloudinary { cloud_name, folder } => {
            Arc::new(CloudinaryImageStore::new(cloud_name.clone(), folder.clone()))
        }
    }
}

/// Stored image first, then the legacy URL, else empty.
pub fn resolve_image(store: &dyn ImageStore, image: Option<&str>, image_url: &str) -> String {
    match image.filter(|r| !r.trim().is_empty()) {
        Some(reference) => store.url_for(reference),
        None => image_url.to_string(),
    }
}

fn is_absolute(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_urls_join_media_root() {
        let store = LocalImageStore::new("/media");
        assert_eq!(store.url_for("products/mug.jpg"), "/media/products/mug.jpg");
        assert_eq!(store.url_for("/products/mug.jpg"), "/media/products/mug.jpg");
    }

    #[test]
    fn cloudinary_urls_carry_transformation_and_folder() {
        let store = CloudinaryImageStore::new("demo", "products/");
        assert_eq!(
            store.url_for("mug"),
            "https://res.cloudinary.com/demo/image/upload/c_fill,f_auto,h_600,q_auto,w_600/products/mug"
        );
        assert_eq!(
            store.url_for("products/mug"),
            "https://res.cloudinary.com/demo/image/upload/c_fill,f_auto,h_600,q_auto,w_600/products/mug"
        );
    }

    #[test]
    fn absolute_references_pass_through() {
        let store = CloudinaryImageStore::new("demo", "products");
        assert_eq!(
            store.url_for("https://cdn.example.com/a.png"),
            "https://cdn.example.com/a.png"
        );
    }

    #[test]
    fn resolve_prefers_stored_image_then_legacy_url() {
        let store = LocalImageStore::new("/media/");
        assert_eq!(
            resolve_image(&store, Some("products/a.png"), "https://legacy/a.png"),
            "/media/products/a.png"
        );
        assert_eq!(
            resolve_image(&store, Some("  "), "https://legacy/a.png"),
            "https://legacy/a.png"
        );
        assert_eq!(resolve_image(&store, None, ""), "");
    }

    #[test]
    fn backend_selection_follows_config() {
        let store = image_store(&ImageBackend::Cloudinary {
            cloud_name: "demo".into(),
            folder: "products".into(),
        });
        assert_eq!(store.name(), "cloudinary");
        let store = image_store(&ImageBackend::Local {
            media_url: "/media/".into(),
        });
        assert_eq!(store.name(), "local");
    }
}
