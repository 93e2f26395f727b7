//! Build profile for staging/distribution builds.

/// Build profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profile {
    /// Whether stylesheets are minified.
    pub minify_styles: bool,

    /// Whether fingerprinting and manifests are produced.
    pub fingerprint: bool,
}

impl Profile {
    /// Production profile: minified, fingerprinted output for `dist/`.
    pub const PRODUCTION: Self = Self {
        minify_styles: true,
        fingerprint: true,
    };

    /// Development profile: readable styles, stable names for `temp/`.
    pub const DEVELOPMENT: Self = Self {
        minify_styles: false,
        fingerprint: false,
    };

    /// Check if this is the production profile.
    #[inline]
    pub const fn is_production(&self) -> bool {
        self.fingerprint
    }

    pub const fn name(&self) -> &'static str {
        if self.is_production() {
            "production"
        } else {
            "development"
        }
    }
}
